//! Contract Test: Update/Add Reconciliation
//!
//! Constraints verified:
//! - Only records with a configured host, the target type and a stale
//!   value are updated
//! - Hosts without any record are created, after the updates
//! - Per-record failures are counted and never stop the batch
//! - An unsupported operation aborts the pass with no further call
//! - Every pass decides from a listing taken at its start
//! - The snapshot is re-fetched after every successful create
//! - A second pass with nothing changed issues no mutating call
//! - A failed listing aborts the pass before any decision

mod common;

use common::*;
use ddns_core::engine::{DesiredState, Reconciler};
use ddns_core::error::Error;
use ddns_core::hosts::HostMap;
use ddns_core::reconcile_domain;

const DOMAIN: &str = "example.com";

#[tokio::test]
async fn stale_apex_record_gets_one_update() {
    let api = MockRecordApi::new().with_record(DOMAIN, "rr1", "example.com", "A", "1.1.1.1");

    let report = reconcile_domain(&api, DOMAIN, Some(&[""][..]), "2.2.2.2", None, 3600)
        .await
        .expect("pass succeeds");

    assert_eq!(
        api.mutating_calls(),
        vec![Call::Update {
            domain: DOMAIN.to_string(),
            record_id: "rr1".to_string(),
            host: String::new(),
            value: "2.2.2.2".to_string(),
            ttl: 3600,
        }]
    );
    assert_eq!(report.updates.attempted(), 1);
    assert_eq!(report.adds.attempted(), 0);
}

#[tokio::test]
async fn missing_hosts_get_created_in_order() {
    let api = MockRecordApi::new();

    let report = reconcile_domain(&api, DOMAIN, Some(&["", "www"][..]), "192.0.2.10", None, 3600)
        .await
        .expect("pass succeeds");

    let hosts: Vec<_> = api
        .mutating_calls()
        .into_iter()
        .map(|call| match call {
            Call::Create { host, value, ttl, .. } => {
                assert_eq!(value, "192.0.2.10");
                assert_eq!(ttl, 3600);
                host
            }
            other => panic!("unexpected call {other:?}"),
        })
        .collect();

    assert_eq!(hosts, vec!["".to_string(), "www".to_string()]);
    assert_eq!(report.updates.attempted(), 0);
    assert_eq!(report.adds.attempted(), 2);
    assert!(report.adds.is_clean());
}

#[tokio::test]
async fn updates_precede_adds() {
    let api = MockRecordApi::new().with_record(DOMAIN, "rr1", "www.example.com", "A", "1.1.1.1");

    reconcile_domain(&api, DOMAIN, Some(&["www", "vpn"][..]), "2.2.2.2", None, 3600)
        .await
        .expect("pass succeeds");

    let calls = api.mutating_calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], Call::Update { .. }));
    assert!(matches!(&calls[1], Call::Create { host, .. } if host == "vpn"));
}

#[tokio::test]
async fn unrelated_records_are_left_alone() {
    let api = MockRecordApi::new()
        .with_record(DOMAIN, "rr1", "mail.example.com", "A", "1.1.1.1")
        .with_record(DOMAIN, "rr2", "www.example.com", "TXT", "hello")
        .with_record(DOMAIN, "rr3", "www.example.com", "A", "2.2.2.2");

    let report = reconcile_domain(&api, DOMAIN, Some(&["www"][..]), "2.2.2.2", None, 3600)
        .await
        .expect("pass succeeds");

    assert!(report.is_noop());
    assert!(api.mutating_calls().is_empty());
}

#[tokio::test]
async fn at_sign_host_counts_as_apex() {
    let api = MockRecordApi::new().with_record(DOMAIN, "rr1", "@", "A", "1.1.1.1");

    let report = reconcile_domain(&api, DOMAIN, Some(&[""][..]), "2.2.2.2", None, 3600)
        .await
        .expect("pass succeeds");

    assert_eq!(report.updates.attempted(), 1);
    assert_eq!(report.adds.attempted(), 0);
}

#[tokio::test]
async fn ttl_comes_from_configuration() {
    // seeded records carry ttl 7207
    let api = MockRecordApi::new().with_record(DOMAIN, "rr1", "www.example.com", "A", "1.1.1.1");

    reconcile_domain(&api, DOMAIN, Some(&["www", "vpn"][..]), "2.2.2.2", None, 600)
        .await
        .expect("pass succeeds");

    for call in api.mutating_calls() {
        match call {
            Call::Update { ttl, .. } | Call::Create { ttl, .. } => assert_eq!(ttl, 600),
            other => panic!("unexpected call {other:?}"),
        }
    }
}

#[tokio::test]
async fn failed_update_does_not_stop_the_next() {
    let api = MockRecordApi::new()
        .with_record(DOMAIN, "rr1", "example.com", "A", "1.1.1.1")
        .with_record(DOMAIN, "rr2", "www.example.com", "A", "1.1.1.1")
        .failing_record("rr1", Failure::Provider);

    let report = reconcile_domain(&api, DOMAIN, Some(&["", "www"][..]), "2.2.2.2", None, 3600)
        .await
        .expect("per-record failures do not fail the pass");

    assert_eq!(api.updates().len(), 2);
    assert_eq!(report.updates.attempted(), 2);
    assert_eq!(report.updates.failed(), 1);
    assert_eq!(report.updates.failures()[0].record_id.as_deref(), Some("rr1"));
    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn failed_create_does_not_stop_the_next() {
    let api = MockRecordApi::new().failing_create("www", Failure::Transport);

    let report = reconcile_domain(&api, DOMAIN, Some(&["www", "vpn"][..]), "2.2.2.2", None, 3600)
        .await
        .expect("per-record failures do not fail the pass");

    assert_eq!(api.creates().len(), 2);
    assert_eq!(report.adds.attempted(), 2);
    assert_eq!(report.adds.failed(), 1);
    assert_eq!(report.adds.failures()[0].host, "www.example.com");
}

#[tokio::test]
async fn unsupported_update_aborts_the_pass() {
    let api = MockRecordApi::new()
        .with_record(DOMAIN, "rr1", "example.com", "A", "1.1.1.1")
        .with_record(DOMAIN, "rr2", "www.example.com", "A", "1.1.1.1")
        .failing_record("rr1", Failure::Unsupported);

    let err = reconcile_domain(&api, DOMAIN, Some(&["", "www", "vpn"][..]), "2.2.2.2", None, 3600)
        .await
        .unwrap_err();

    assert!(err.is_contract_violation());
    assert!(matches!(err, Error::UnsupportedOperation(_)));
    // rr2 is never updated and vpn is never created
    assert_eq!(api.mutating_calls().len(), 1);
    assert!(matches!(&api.updates()[0], Call::Update { record_id, .. } if record_id == "rr1"));
}

#[tokio::test]
async fn unsupported_create_aborts_the_pass() {
    let api = MockRecordApi::new().failing_create("www", Failure::Unsupported);

    let err = reconcile_domain(&api, DOMAIN, Some(&["www", "vpn"][..]), "2.2.2.2", None, 3600)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedOperation(_)));
    assert_eq!(api.creates().len(), 1);
    assert!(api.records(DOMAIN).is_empty());
}

#[tokio::test]
async fn provider_change_after_open_is_seen_by_sync() {
    let api = MockRecordApi::new();
    let hosts = HostMap::build(DOMAIN, Some(&["www"][..])).unwrap();
    let desired = DesiredState::new(hosts, "2.2.2.2", None).unwrap();

    let mut reconciler = Reconciler::open(&api, DOMAIN, 3600).await.unwrap();
    api.insert_record(DOMAIN, "rr9", "www.example.com", "A", "2.2.2.2");

    let report = reconciler.sync(&desired).await.expect("pass succeeds");

    assert!(report.is_noop());
    assert!(api.mutating_calls().is_empty());
    assert_eq!(api.records(DOMAIN).len(), 1);
}

#[tokio::test]
async fn every_pass_lists_at_its_start() {
    let api = MockRecordApi::new().with_record(DOMAIN, "rr1", "www.example.com", "A", "1.1.1.1");
    let hosts = HostMap::build(DOMAIN, Some(&["www"][..])).unwrap();
    let desired = DesiredState::new(hosts, "2.2.2.2", None).unwrap();

    let mut reconciler = Reconciler::new(&api, DOMAIN, 3600).unwrap();
    assert!(api.calls().is_empty());

    reconciler.sync(&desired).await.unwrap();
    assert_eq!(api.list_calls(), 1);
    assert_eq!(api.updates().len(), 1);

    // value changed behind our back: the next pass sees it and repairs it
    api.clear_calls();
    api.insert_record(DOMAIN, "rr2", "www.example.com", "A", "3.3.3.3");
    let report = reconciler.sync(&desired).await.unwrap();

    assert_eq!(api.calls()[0], Call::List { domain: DOMAIN.to_string() });
    assert_eq!(report.updates.attempted(), 1);
    assert!(matches!(&api.updates()[0], Call::Update { record_id, .. } if record_id == "rr2"));
}

#[tokio::test]
async fn snapshot_refetched_after_each_successful_create() {
    let api = MockRecordApi::new().failing_create("vpn", Failure::Provider);

    reconcile_domain(&api, DOMAIN, Some(&["", "www", "vpn"][..]), "192.0.2.1", None, 3600)
        .await
        .expect("pass succeeds");

    // initial listing plus one per successful create
    assert_eq!(api.list_calls(), 3);
}

#[tokio::test]
async fn second_pass_is_a_noop() {
    let api = MockRecordApi::new()
        .with_record(DOMAIN, "rr1", "example.com", "A", "1.1.1.1")
        .with_record(DOMAIN, "rr2", "mail.example.com", "MX", "mx.example.net");
    let hosts = ["", "www", "vpn"];

    let first = reconcile_domain(&api, DOMAIN, Some(&hosts[..]), "192.0.2.1", None, 3600)
        .await
        .expect("first pass succeeds");
    assert_eq!(first.updates.attempted(), 1);
    assert_eq!(first.adds.attempted(), 2);

    api.clear_calls();
    let second = reconcile_domain(&api, DOMAIN, Some(&hosts[..]), "192.0.2.1", None, 3600)
        .await
        .expect("second pass succeeds");

    assert!(second.is_noop());
    assert!(api.mutating_calls().is_empty());
}

#[tokio::test]
async fn reconciler_plan_is_empty_after_sync() {
    let api = MockRecordApi::new().with_record(DOMAIN, "rr1", "www.example.com", "A", "1.1.1.1");
    let hosts = HostMap::build(DOMAIN, Some(&["www", "vpn"][..])).unwrap();
    let desired = DesiredState::new(hosts, "2.2.2.2", None).unwrap();

    let mut reconciler = Reconciler::open(&api, DOMAIN, 3600).await.unwrap();
    let plan = reconciler.plan(&desired).await.unwrap();
    assert_eq!(plan.updates.len(), 1);
    assert_eq!(plan.adds.len(), 1);

    reconciler.sync(&desired).await.unwrap();
    assert!(reconciler.plan(&desired).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_listing_aborts_the_pass() {
    let api = MockRecordApi::new()
        .with_record(DOMAIN, "rr1", "example.com", "A", "1.1.1.1")
        .failing_list(DOMAIN, Failure::Transport, 1);

    let err = reconcile_domain(&api, DOMAIN, Some(&["", "www"][..]), "2.2.2.2", None, 3600)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert!(api.mutating_calls().is_empty());
}

#[tokio::test]
async fn malformed_entry_aborts_the_pass() {
    let mut broken = entry("rr2", "www.example.com", "A", "1.1.1.1");
    broken.record_id = None;
    let api = MockRecordApi::new()
        .with_record(DOMAIN, "rr1", "example.com", "A", "1.1.1.1")
        .with_entry(DOMAIN, broken);

    let err = reconcile_domain(&api, DOMAIN, Some(&["", "www"][..]), "2.2.2.2", None, 3600)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Parse(_)));
    assert!(api.mutating_calls().is_empty());
}

#[tokio::test]
async fn empty_host_list_only_lists() {
    let api = MockRecordApi::new().with_record(DOMAIN, "rr1", "example.com", "A", "1.1.1.1");

    let report = reconcile_domain::<String>(&api, DOMAIN, Some(&[][..]), "2.2.2.2", None, 3600)
        .await
        .expect("empty host list is legal");

    assert!(report.is_noop());
    assert_eq!(api.calls().len(), 1);
}

// # ddnsd - one-shot DDNS updater
//
// This is a THIN integration layer. All DDNS logic lives in ddns-core.
//
// The ddnsd binary is responsible for:
// 1. Reading configuration from the environment (or flags)
// 2. Initializing logging and the runtime
// 3. Wiring the NameSilo client and the HTTP IP source into the orchestrator
// 4. Running one pass per configured domain, then exiting
//
// It is meant to be started by a scheduler (cron, systemd timer).
//
// ## Configuration
//
// ### Domains
// - `DDNS_DOMAINS`: `domain=label,label;domain=label` (`@` is the apex)
// - `DDNS_TTL`: TTL for every created/updated record (default 3600)
//
// ### Provider
// - `NAMESILO_API_KEY`: API key
// - `NAMESILO_API_URL`: Override for the batch API base URL
// - `DDNS_MODE`: `live` (default) or `dry-run`
//
// ### IP Source
// - `DDNS_IP_SOURCE_URL`: URL to fetch IP from (default ipify JSON)
//
// ### Engine
// - `DDNS_MAX_RETRIES`: Retries of a domain pass after transport failures (default 0)
// - `DDNS_RETRY_DELAY_SECS`: Delay between retries
//
// ## Example
//
// ```bash
// export NAMESILO_API_KEY=your_key
// export DDNS_DOMAINS="example.com=@,www;example.org=home"
//
// ddnsd                                  # reconcile every domain
// ddnsd delete --domain example.com --host www --type AAAA
// ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ddns_core::config::{
    DEFAULT_IP_SOURCE_URL, DEFAULT_TTL, DdnsConfig, EngineConfig, IpSourceConfig, ProviderConfig,
    parse_domains,
};
use ddns_core::engine::DeleteFilter;
use ddns_core::orchestrator::Orchestrator;
use ddns_ip_http::HttpIpSource;
use ddns_provider_namesilo::NameSiloClient;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Every domain reconciled without a failed call
/// - 1: Configuration or startup error
/// - 2: Runtime error (IP oracle unreachable, delete could not list)
/// - 3: Run completed, but some domains or calls failed
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
    PartialFailure = 3,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser)]
#[command(name = "ddnsd", version)]
#[command(about = "Keep NameSilo address records pointed at this machine's public IP")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile every configured domain once (default)
    Run,
    /// Delete records of one domain matching a filter
    Delete {
        /// Domain to delete from
        #[arg(long)]
        domain: String,
        /// Short host label (`@` for the apex)
        #[arg(long)]
        host: Option<String>,
        /// Exact record value
        #[arg(long)]
        value: Option<String>,
        /// Exact record type
        #[arg(long = "type")]
        record_type: Option<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Live,
    DryRun,
}

/// Application configuration
#[derive(Args)]
struct Settings {
    /// Domains and host labels, e.g. "example.com=@,www;example.org=home"
    #[arg(long, env = "DDNS_DOMAINS", default_value = "")]
    domains: String,

    #[arg(long, env = "DDNS_TTL", default_value_t = DEFAULT_TTL)]
    ttl: u32,

    #[arg(long, env = "NAMESILO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "NAMESILO_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "DDNS_IP_SOURCE_URL", default_value = DEFAULT_IP_SOURCE_URL)]
    ip_source_url: String,

    #[arg(long, env = "DDNS_MAX_RETRIES", default_value_t = 0)]
    max_retries: usize,

    #[arg(long, env = "DDNS_RETRY_DELAY_SECS", default_value_t = 5)]
    retry_delay_secs: u64,

    #[arg(long, env = "DDNS_MODE", value_enum, default_value_t = Mode::Live)]
    mode: Mode,

    #[arg(long, env = "DDNS_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Settings {
    /// Build the library configuration
    fn to_config(&self) -> Result<DdnsConfig> {
        let domains = parse_domains(&self.domains).context("Invalid DDNS_DOMAINS")?;

        let config = DdnsConfig {
            domains,
            ttl: self.ttl,
            provider: ProviderConfig::NameSilo {
                api_key: self.api_key.clone(),
                base_url: self.api_url.clone(),
                dry_run: self.mode == Mode::DryRun,
            },
            ip_source: IpSourceConfig::Http {
                url: self.ip_source_url.clone(),
            },
            engine: EngineConfig {
                max_retries: self.max_retries,
                retry_delay_secs: self.retry_delay_secs,
            },
        };
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.settings.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let config = match cli.settings.to_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Calls are strictly sequential, one thread is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match cli.command.unwrap_or(Command::Run) {
            Command::Run => run(config).await,
            Command::Delete {
                domain,
                host,
                value,
                record_type,
            } => {
                let mut filter = DeleteFilter::all();
                if let Some(host) = host {
                    filter = filter.with_host(if host == "@" { String::new() } else { host });
                }
                if let Some(value) = value {
                    filter = filter.with_value(value);
                }
                if let Some(record_type) = record_type {
                    filter = filter.with_record_type(record_type);
                }
                delete(config, &domain, &filter).await
            }
        }
    });

    code.into()
}

/// Wire the concrete client and IP source into an orchestrator
fn build_orchestrator(config: DdnsConfig) -> Result<Orchestrator> {
    let client = NameSiloClient::from_config(&config.provider);
    let ip_source = HttpIpSource::from_config(&config.ip_source);

    info!(
        "Provider: {} [mode: {}], IP source: {}",
        config.provider.type_name(),
        if client.is_dry_run() { "DRY-RUN" } else { "LIVE" },
        ip_source.url()
    );

    let orchestrator = Orchestrator::new(Box::new(client), Box::new(ip_source), config)?;
    Ok(orchestrator)
}

/// Reconcile every configured domain once
async fn run(config: DdnsConfig) -> DdnsExitCode {
    if config.domains.is_empty() {
        error!(
            "DDNS_DOMAINS must contain at least one domain. \
            Set it via: export DDNS_DOMAINS=\"example.com=@,www\""
        );
        return DdnsExitCode::ConfigError;
    }
    info!("Configuration loaded: {} domain(s)", config.domains.len());

    let orchestrator = match build_orchestrator(config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    match orchestrator.run_once().await {
        Ok(summary) if summary.is_clean() => DdnsExitCode::Success,
        Ok(_) => DdnsExitCode::PartialFailure,
        Err(e) => {
            error!("Run aborted: {}", e);
            DdnsExitCode::RuntimeError
        }
    }
}

/// Delete matching records on one domain
async fn delete(config: DdnsConfig, domain: &str, filter: &DeleteFilter) -> DdnsExitCode {
    let orchestrator = match build_orchestrator(config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    match orchestrator.delete(domain, filter).await {
        Ok(outcome) if outcome.is_clean() => DdnsExitCode::Success,
        Ok(outcome) => {
            for failure in outcome.failures() {
                error!(
                    "Could not delete {} ({}): {}",
                    failure.host,
                    failure.record_id.as_deref().unwrap_or("?"),
                    failure.error
                );
            }
            DdnsExitCode::PartialFailure
        }
        Err(e) => {
            error!("Delete on {} aborted: {}", domain, e);
            if e.is_configuration() {
                DdnsExitCode::ConfigError
            } else {
                DdnsExitCode::RuntimeError
            }
        }
    }
}

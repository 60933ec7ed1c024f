//! Command line front end: validate a configuration or open one stream.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use outbound_config::{Config, LoggingConfig, load_config, validate_config};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::build::{AdapterRegistry, AdapterResources};
use crate::context::DialContext;
use crate::metadata::{Metadata, Protocol};

#[derive(Parser, Debug, Clone)]
#[command(name = "outbound-rs", version, about = "Outbound proxy adapters")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Load, validate and build every configured proxy.
    Check(CheckArgs),
    /// Open a stream through one proxy and relay stdin/stdout over it.
    Dial(DialArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Config file path (yaml/json/jsonc/toml).
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Log level override.
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DialArgs {
    /// Config file path (yaml/json/jsonc/toml).
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Proxy name, including the built-in REJECT and REJECT-DROP.
    #[arg(short, long)]
    pub proxy: String,

    /// Destination as host:port.
    #[arg(short, long)]
    pub target: String,

    /// Connect timeout in seconds.
    #[arg(long, default_value_t = outbound_core::defaults::DEFAULT_TCP_CONNECT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Log level override.
    #[arg(long)]
    pub log_level: Option<String>,
}

pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Check(args) => check(args).await,
        Command::Dial(args) => dial(args).await,
    }
}

fn prepare(
    path: &Path,
    log_level: Option<&String>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = load_config(path)?;
    validate_config(&config)?;
    if let Some(level) = log_level {
        config.logging.level = Some(level.clone());
    }
    init_tracing(&config.logging);
    Ok(config)
}

async fn check(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = prepare(&args.config, args.log_level.as_ref())?;
    let resources = AdapterResources::from_config(&config)?;
    let (registry, failures) = AdapterRegistry::from_config(&config, &resources);

    for adapter in registry.iter() {
        let identity = adapter.identity();
        println!(
            "{:<20} {:<12} udp={:<5} {}",
            identity.name, identity.adapter_type, identity.udp, identity.server_addr
        );
    }
    for (name, err) in &failures {
        eprintln!("{name}: {err}");
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!("{} proxies failed to build", failures.len()).into())
    }
}

async fn dial(args: DialArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = prepare(&args.config, args.log_level.as_ref())?;
    let metadata = Metadata::parse(Protocol::Tcp, &args.target)
        .ok_or_else(|| format!("invalid target: {}", args.target))?;

    let resources = AdapterResources::from_config(&config)?;
    let (registry, _) = AdapterRegistry::from_config(&config, &resources);
    let adapter = registry
        .get(&args.proxy)
        .ok_or_else(|| format!("unknown proxy: {}", args.proxy))?;

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal_handler().await;
        info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    let ctx =
        DialContext::with_timeout(Duration::from_secs(args.timeout)).with_cancel(shutdown.clone());
    let conn = adapter.open_stream(&ctx, &metadata).await?;
    info!(proxy = %adapter.name(), target = %metadata, "connected");

    let (mut reader, mut writer) = tokio::io::split(conn);
    let upload = async {
        tokio::io::copy(&mut tokio::io::stdin(), &mut writer).await?;
        writer.shutdown().await
    };
    let download = async {
        let mut stdout = tokio::io::stdout();
        tokio::io::copy(&mut reader, &mut stdout).await?;
        stdout.flush().await
    };

    tokio::select! {
        res = async { tokio::try_join!(upload, download) } => {
            res?;
        }
        _ = shutdown.cancelled() => {}
    }
    Ok(())
}

async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// EnvFilter directives: base level, then per-module overrides.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut directives = config.level.as_deref().unwrap_or("info").to_string();
    let mut modules: Vec<_> = config.filters.iter().collect();
    modules.sort();
    for (module, level) in modules {
        directives.push_str(&format!(",{module}={level}"));
    }
    directives
}

/// Install the global subscriber. Logs go to stderr unless `output` is
/// `stdout`, which would mix with relayed data in `dial`.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_new(filter_directives(config)).unwrap_or_else(|_| EnvFilter::new("info"));
    let to_stdout = config.output.as_deref() == Some("stdout");
    let registry = tracing_subscriber::registry().with(filter);

    let result = match (config.format.as_deref().unwrap_or("pretty"), to_stdout) {
        ("json", true) => registry.with(fmt::layer().json().with_writer(io::stdout)).try_init(),
        ("json", false) => registry.with(fmt::layer().json().with_writer(io::stderr)).try_init(),
        ("compact", true) => registry.with(fmt::layer().compact().with_writer(io::stdout)).try_init(),
        ("compact", false) => registry.with(fmt::layer().compact().with_writer(io::stderr)).try_init(),
        (_, true) => registry.with(fmt::layer().with_writer(io::stdout)).try_init(),
        (_, false) => registry.with(fmt::layer().with_writer(io::stderr)).try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing already initialised: {e}");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn directives_include_module_filters() {
        let config = LoggingConfig {
            level: Some("warn".into()),
            filters: HashMap::from([
                ("rustls".to_string(), "error".to_string()),
                ("outbound_adapter".to_string(), "debug".to_string()),
            ]),
            ..LoggingConfig::default()
        };
        assert_eq!(
            filter_directives(&config),
            "warn,outbound_adapter=debug,rustls=error"
        );
        assert_eq!(filter_directives(&LoggingConfig::default()), "info");
    }

    #[test]
    fn parses_dial_arguments() {
        let cli = Cli::try_parse_from([
            "outbound-rs",
            "dial",
            "-c",
            "proxies.yaml",
            "-p",
            "edge",
            "-t",
            "example.com:80",
        ])
        .unwrap();
        let Command::Dial(args) = cli.command else {
            panic!("expected dial");
        };
        assert_eq!(args.proxy, "edge");
        assert_eq!(args.target, "example.com:80");
        assert_eq!(args.timeout, 5);
    }
}

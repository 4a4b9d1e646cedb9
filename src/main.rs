// src/main.rs
use anyhow::{Context, Result};
use argocd_chaos::{
    api::{ApplicationApi, ArgoApi, TargetResource},
    chaos::{Inventory, Orchestrator, Session, WorkerExit, WorkerSchedule},
    config::{self, ChaosConfig},
    metrics::{start_metrics_server, MetricsRegistry},
    prompt::{prompt_credentials, Prompt},
};
use clap::{Parser, ValueEnum};
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Chaos testing for Argo CD: force-sync applications and keep flipping
/// their replica count until interrupted.
#[derive(Debug, Parser)]
#[command(name = "argocd-chaos-testing", version)]
struct Args {
    /// YAML or JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Argo server host [default: http://localhost:8080]
    #[arg(long)]
    host: Option<String>,

    /// Username [default: admin]
    #[arg(long)]
    username: Option<String>,

    /// Password; prompted for when empty and --confirm is set
    #[arg(long)]
    password: Option<String>,

    /// Amount of applications driven concurrently [default: 1]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    threads: Option<u32>,

    /// Accept invalid TLS certificates [default: true]
    #[arg(long)]
    insecure_skip_verify: Option<bool>,

    /// Serve prometheus metrics on this port
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Ask for missing credentials and confirm before starting (needs a terminal)
    #[arg(long)]
    confirm: bool,

    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl Args {
    fn prompts_enabled(&self) -> bool {
        self.confirm && std::io::stdin().is_terminal()
    }

    fn apply(&self, config: &mut ChaosConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(threads) = self.threads {
            config.threads = threads as usize;
        }
        if let Some(insecure) = self.insecure_skip_verify {
            config.insecure_skip_verify = insecure;
        }
        if let Some(port) = self.metrics_port {
            config.metrics.enabled = true;
            config.metrics.port = port;
        }
    }
}

fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("argocd_chaos={}", level).parse()?)
        .add_directive(format!("argocd_chaos_testing={}", level).parse()?);

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_format)?;

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            config::load_config(path).await?
        }
        None => ChaosConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    let prompts = args.prompts_enabled();
    if args.confirm && !prompts {
        warn!("Standard input is not a terminal, skipping prompts");
    }
    if prompts {
        let (username, password) = prompt_credentials(&config.username, &config.password)?;
        config.username = username;
        config.password = password;
    }

    let prompt = Prompt::new(prompts);
    let question = format!(
        "Repeatedly sync and scale {} application(s) on {}?",
        config.threads, config.host
    );
    if !prompt.confirm(&question)? {
        warn!("Chaos run cancelled");
        return Ok(());
    }

    let metrics = if config.metrics.enabled {
        let registry = Arc::new(MetricsRegistry::new()?);
        let collector = registry.collector();
        let addr: SocketAddr = ([0, 0, 0, 0], config.metrics.port).into();
        start_metrics_server(addr, registry, config.metrics.path.clone())?;
        Some(collector)
    } else {
        None
    };

    let api = ArgoApi::new(&config.host, config.insecure_skip_verify)
        .context("Failed to create Argo CD client")?
        .with_target(TargetResource::new(config.target.clone()))
        .with_sync_config(config.sync.clone())
        .with_metrics(metrics.clone());
    let api: Arc<dyn ApplicationApi> = Arc::new(api);

    // Any bootstrap failure ends the process with a non-zero status.
    let session = Session::establish(api.as_ref(), &config.username, &config.password)
        .await
        .context("Failed to obtain session token")?;
    let inventory = Inventory::fetch(api.as_ref(), &session)
        .await
        .context("Failed to list applications")?;

    let orchestrator = Orchestrator::new(api, session, WorkerSchedule::from_config(&config))
        .with_metrics(metrics);

    let reports = orchestrator
        .run_until(&inventory, config.threads, shutdown_signal())
        .await
        .context("Failed to start chaos workers")?;

    for report in &reports {
        match &report.exit {
            WorkerExit::Cancelled => info!(
                "{}: stopped after {} cycles",
                report.application, report.cycles
            ),
            WorkerExit::Failed { phase, error } => warn!(
                "{}: failed during {} after {} cycles: {}",
                report.application, phase, report.cycles, error
            ),
            WorkerExit::Aborted(reason) => {
                error!("{}: aborted: {}", report.application, reason)
            }
        }
    }

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

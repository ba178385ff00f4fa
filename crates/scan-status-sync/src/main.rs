/*
[INPUT]:  CLI arguments, YAML configuration file, SCAN_* environment, OS shutdown signals
[OUTPUT]: Logged indicator changes for the configured scan server, graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use scan_status_adapter::{Credential, CredentialSource, ScanClient, StatusWebSocket};
use scan_status_sync::{SyncConfig, SyncMode, TaskStatusService};

#[derive(Parser, Debug)]
#[command(name = "scan-status-watch", version, about = "Scan task status watcher")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    /// Bearer token for the scan server
    #[arg(long = "token", env = "SCAN_TOKEN", hide_env_values = true)]
    token: Option<String>,
    #[arg(long = "mode", value_name = "stream|poll")]
    mode: Option<SyncMode>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = init_tracing(&args.log_level, args.log_file.as_deref())?;

    info!(
        config_path = ?args.config_path,
        dry_run = args.dry_run,
        "starting scan-status-watch"
    );

    let mut config = SyncConfig::load(args.config_path.as_deref()).context("load config")?;
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    info!(
        api_base_url = %config.api_base_url,
        stream_url = %config.stream_url,
        mode = %config.mode,
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let client = ScanClient::with_config_and_base_url(config.client_config(), &config.api_base_url)
        .context("build scan client")?;
    let websocket = StatusWebSocket::with_url(&config.stream_url, config.task_limit)
        .context("build stream client")?;

    let credentials = CredentialSource::with_initial(args.token.map(Credential::new));
    if credentials.current().is_none() {
        warn!("no token provided; service stays idle until one is set");
    }

    let mut service = TaskStatusService::new(
        config,
        Arc::new(websocket),
        Arc::new(client),
        credentials.subscribe(),
    )
    .context("build task status service")?;

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    service.activate();
    let mut indicator_rx = service.subscribe_indicator();
    let mut error_rx = service.subscribe_last_error();
    info!(indicator = %service.indicator(), "task status service started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = indicator_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let indicator = *indicator_rx.borrow_and_update();
                let snapshot = service.snapshot();
                info!(%indicator, task_count = snapshot.len(), "indicator changed");
            }
            changed = error_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(err) = error_rx.borrow_and_update().clone() {
                    warn!(error = %err, phase = ?service.phase(), "task status sync degraded");
                }
            }
        }
    }
    info!("shutdown signal received");

    service.deactivate().await;
    info!("task status service shutdown complete");

    Ok(())
}

fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|err| anyhow!(err))
            .context("initialize tracing subscriber")?;
        return Ok(None);
    };

    let directory = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    let file_name = path
        .file_name()
        .context("log file path must name a file")?;
    let appender = tracing_appender::rolling::never(directory.unwrap_or(Path::new(".")), file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(Some(guard))
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}

// # guardsyncd - Sync Daemon
//
// Thin integration layer around guardsync-core. All reconciliation logic
// lives in the core crate; this binary only:
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Builds the engine with the HTTP client factory
// 4. Drives passes from a timer and, optionally, from the HTTP API
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Instances
// - `GUARDSYNC_ORIGIN_URL`: Base URL of the origin (required)
// - `GUARDSYNC_REPLICA{n}_URL`: Base URL of replica n, numbered from 1
// - `GUARDSYNC_{ORIGIN|REPLICA{n}}_USERNAME` / `_PASSWORD`: Basic auth
// - `GUARDSYNC_{ORIGIN|REPLICA{n}}_COOKIE`: Session cookie (no credentials)
// - `GUARDSYNC_{ORIGIN|REPLICA{n}}_API_PATH`: API path (default `control`)
// - `GUARDSYNC_{ORIGIN|REPLICA{n}}_WEB_URL`: URL shown in logs and status
// - `GUARDSYNC_{ORIGIN|REPLICA{n}}_INSECURE_SKIP_VERIFY`: Accept any TLS cert
// - `GUARDSYNC_{ORIGIN|REPLICA{n}}_REQUEST_HEADERS`: `Name:value,...`
// - `GUARDSYNC_REPLICA{n}_AUTO_SETUP`: Run the initial setup when needed
// - `GUARDSYNC_REPLICA{n}_INTERFACE_NAME`: DHCP interface override
// - `GUARDSYNC_REPLICA{n}_DHCP_SERVER_ENABLED`: DHCP enabled override
//
// ### Sync
// - `GUARDSYNC_FEATURES_*`: Per-resource switches (all enabled by default)
// - `GUARDSYNC_CONTINUE_ON_ERROR`: Keep going after a failed item or action
//
// ### Daemon
// - `GUARDSYNC_INTERVAL_SECS`: Seconds between passes
// - `GUARDSYNC_RUN_ON_START`: Run a pass right after startup
// - `GUARDSYNC_API_PORT`: Serve the trigger/status/health API on this port
// - `GUARDSYNC_HTTP_TIMEOUT_SECS`: Timeout of each request (default 30)
// - `GUARDSYNC_SHUTDOWN_TIMEOUT_SECS`: Grace period for a running pass (default 10)
// - `GUARDSYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// Without an interval and without an API port the daemon runs a single
// pass and exits with its outcome.
//
// ## Example
//
// ```bash
// export GUARDSYNC_ORIGIN_URL=http://192.168.1.2:3000
// export GUARDSYNC_ORIGIN_USERNAME=admin
// export GUARDSYNC_ORIGIN_PASSWORD=secret
// export GUARDSYNC_REPLICA1_URL=http://192.168.1.3:3000
// export GUARDSYNC_REPLICA1_USERNAME=admin
// export GUARDSYNC_REPLICA1_PASSWORD=secret
// export GUARDSYNC_INTERVAL_SECS=600
// export GUARDSYNC_API_PORT=8080
//
// guardsyncd
// ```

mod api;
mod config;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use config::Config;
use guardsync_client::HttpClientFactory;
use guardsync_core::{Error, PassOutcome, SyncEngine, SyncEvent};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown, or a one-shot pass that fully succeeded
/// - 1: Configuration or startup error
/// - 2: Runtime error, or a one-shot pass that did not fully succeed
#[derive(Debug, Clone, Copy)]
enum SyncExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return SyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return SyncExitCode::ConfigError.into();
    }

    let log_level = match config.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return SyncExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SyncExitCode::ConfigError.into();
    }

    info!("Starting guardsyncd daemon");
    info!(
        "Configuration loaded: origin {}, {} replica(s)",
        config.sync.origin.web_host(),
        config.sync.replicas.len()
    );

    let disabled = config.sync.features.disabled();
    if !disabled.is_empty() {
        info!("Disabled features: {}", disabled.join(", "));
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(code) => code,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                SyncExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal, or a single pass in one-shot mode
async fn run_daemon(config: Config) -> Result<SyncExitCode> {
    let factory = Arc::new(HttpClientFactory::new(config.http_timeout()));
    let (engine, events) =
        SyncEngine::new(config.sync.clone(), factory).context("Failed to create sync engine")?;
    let engine = Arc::new(engine);

    tokio::spawn(log_events(events));

    if config.is_one_shot() {
        info!("No interval and no API port configured, running a single pass");
        let report = engine.run_sync().await?;
        info!("Sync pass finished: {:?}", report.outcome);
        return Ok(match report.outcome {
            PassOutcome::Success => SyncExitCode::CleanShutdown,
            _ => SyncExitCode::RuntimeError,
        });
    }

    let (scheduler_stop, stop_rx) = watch::channel(false);

    let scheduler = tokio::spawn(run_scheduler(
        engine.clone(),
        config.interval_secs.map(Duration::from_secs),
        config.run_on_start,
        stop_rx,
    ));

    let api = match config.api_port {
        Some(port) => Some(spawn_api(engine.clone(), port).await?),
        None => None,
    };

    info!("Daemon initialized successfully");

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);
    info!("Shutting down daemon");

    shutdown(
        Tasks {
            scheduler,
            scheduler_stop,
            api,
        },
        config.shutdown_timeout(),
    )
    .await;

    Ok(SyncExitCode::CleanShutdown)
}

/// Background tasks of a running daemon
struct Tasks {
    scheduler: JoinHandle<()>,
    scheduler_stop: watch::Sender<bool>,
    api: Option<ApiTask>,
}

/// The API server and its stop signal
struct ApiTask {
    handle: JoinHandle<std::io::Result<()>>,
    stop: oneshot::Sender<()>,
}

/// Stop the scheduler, then the API
///
/// The API keeps serving status and health while the scheduler finishes an
/// in-flight pass. Both share one `grace` period; a task still running when
/// it ends is aborted.
async fn shutdown(tasks: Tasks, grace: Duration) {
    let deadline = tokio::time::Instant::now() + grace;

    let _ = tasks.scheduler_stop.send(true);
    let abort = tasks.scheduler.abort_handle();
    match tokio::time::timeout_at(deadline, tasks.scheduler).await {
        Ok(_) => debug!("Scheduler stopped"),
        Err(_) => {
            warn!("Sync pass still running after {:?}, aborting", grace);
            abort.abort();
        }
    }

    if let Some(api) = tasks.api {
        let _ = api.stop.send(());
        let abort = api.handle.abort_handle();
        match tokio::time::timeout_at(deadline, api.handle).await {
            Ok(Ok(Ok(()))) => debug!("API server stopped"),
            Ok(Ok(Err(e))) => warn!("API server error: {}", e),
            Ok(Err(e)) => warn!("API server task failed: {}", e),
            Err(_) => {
                warn!("API requests still running after {:?}, aborting", grace);
                abort.abort();
            }
        }
    }
}

/// Trigger passes on a fixed interval until shutdown
///
/// A pass still running when the next tick fires makes that tick a no-op;
/// the engine's run guard rejects it.
async fn run_scheduler(
    engine: Arc<SyncEngine>,
    interval: Option<Duration>,
    run_on_start: bool,
    mut shutdown: watch::Receiver<bool>,
) {
    if run_on_start {
        info!("Running initial sync pass");
        trigger(&engine).await;
    }

    let Some(interval) = interval else {
        return;
    };
    info!("Scheduling sync passes every {:?}", interval);

    let start = tokio::time::Instant::now() + interval;
    let mut ticks = IntervalStream::new(tokio::time::interval_at(start, interval));

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!("Scheduler received shutdown");
                return;
            }
            tick = ticks.next() => {
                if tick.is_none() {
                    return;
                }
                trigger(&engine).await;
            }
        }
    }
}

async fn trigger(engine: &SyncEngine) {
    match engine.run_sync().await {
        Ok(report) => info!("Sync pass finished: {:?}", report.outcome),
        Err(Error::SyncInProgress) => info!("Sync pass skipped, previous pass still running"),
        Err(e) => error!("Sync pass failed: {}", e),
    }
}

/// Bind the API and serve it until its stop signal fires
async fn spawn_api(engine: Arc<SyncEngine>, port: u16) -> Result<ApiTask> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API on {}", addr))?;
    info!("API listening on {}", addr);

    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        axum::serve(listener, api::router(engine))
            .with_graceful_shutdown(async move {
                let _ = stopped.await;
            })
            .await
    });

    Ok(ApiTask { handle, stop })
}

/// Log engine events as they arrive
async fn log_events(mut events: mpsc::Receiver<SyncEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SyncEvent::ActionFailed {
                host,
                action,
                error,
            } => warn!(replica = %host, "Action {:?} failed: {}", action, error),
            other => debug!("Sync event: {:?}", other),
        }
    }
}

/// Wait for a shutdown signal (SIGTERM, SIGINT)
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

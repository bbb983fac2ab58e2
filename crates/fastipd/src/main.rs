// # fastipd - fast-IP DNS sync daemon
//
// This is a THIN integration layer:
// - DO NOT add DNS, signing or reconciliation logic here
// - All sync logic lives in fastip-core and the provider/resolver crates
// - Configuration is via environment variables ONLY
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the sync job (DoH resolver + Huawei Cloud DNS)
// 4. Running it on an interval and on `GET /trigger`
// 5. Shutting down on SIGTERM/SIGINT
//
// ## Configuration
//
// ### Credentials (required)
// - `FASTIP_ACCESS_KEY`: Access key ID
// - `FASTIP_SECRET_KEY`: Secret access key
//
// ### Provider
// - `FASTIP_DNS_ENDPOINT`: API host (default: dns.myhuaweicloud.com)
// - `FASTIP_PROJECT_ID`: Project ID, sent as X-Project-Id (optional)
// - `FASTIP_REGION`: Signing region (default: cn-north-4)
// - `FASTIP_MODE`: `live` (default) or `dry-run`
//
// ### Sync
// - `FASTIP_SOURCE_DOMAIN`: Domain to resolve (default: zecrimp.top)
// - `FASTIP_TARGET_DOMAIN`: A record to maintain (default: cf.hw.072103.xyz)
// - `FASTIP_DOH_URL`: DoH JSON endpoint (default: https://cloudflare-dns.com/dns-query)
// - `FASTIP_INTERVAL_SECS`: Seconds between runs (default: 60)
// - `FASTIP_RUN_TIMEOUT_SECS`: Deadline for one run (default: 30)
//
// ### Daemon
// - `FASTIP_LISTEN_ADDR`: Status/trigger server address (default: 0.0.0.0:8080)
// - `FASTIP_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export FASTIP_ACCESS_KEY=...
// export FASTIP_SECRET_KEY=...
// export FASTIP_PROJECT_ID=...
// fastipd
// curl http://localhost:8080/trigger
// ```

mod config;
mod http;
mod runner;
mod scheduler;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use config::Config;
use fastip_core::SyncJob;
use fastip_provider_huaweicloud::HuaweiCloudFactory;
use fastip_resolver_doh::DohResolver;
use runner::Runner;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long the scheduler and the server get to drain after a signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum FastipExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<FastipExitCode> for ExitCode {
    fn from(code: FastipExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return FastipExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return FastipExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return FastipExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return FastipExitCode::ConfigError.into();
    }

    info!("Starting fastipd daemon");
    info!(
        "Syncing {} -> {} every {}s",
        config.source_domain, config.target_domain, config.interval_secs
    );
    if config.dry_run {
        warn!("DRY-RUN mode: record sets will not be modified");
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return FastipExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            FastipExitCode::RuntimeError
        } else {
            FastipExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: Config) -> Result<()> {
    let resolver = DohResolver::new(config.doh_url.clone())?;
    let job = SyncJob::new(
        config.sync_config(),
        Box::new(resolver),
        Box::new(HuaweiCloudFactory),
    );
    let runner = Arc::new(Runner::new(
        job,
        Duration::from_secs(config.run_timeout_secs),
    ));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", config.listen_addr, e))?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = tokio::spawn(scheduler::run(
        runner.clone(),
        Duration::from_secs(config.interval_secs),
        shutdown_rx.clone(),
    ));

    let mut server_shutdown = shutdown_rx;
    let server = tokio::spawn(async move {
        axum::serve(listener, http::router(runner))
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.changed().await;
            })
            .await
    });

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);
    info!("Shutting down daemon");

    let _ = shutdown_tx.send(true);

    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let scheduler = scheduler.await;
        let server = server.await;
        (scheduler, server)
    })
    .await;

    match drained {
        Ok((scheduler, server)) => {
            scheduler.map_err(|e| anyhow::anyhow!("Scheduler task failed: {}", e))?;
            server
                .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?
                .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
            info!("Shutdown complete");
            Ok(())
        }
        Err(_) => Err(anyhow::anyhow!(
            "Shutdown timeout after {:?}",
            SHUTDOWN_TIMEOUT
        )),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
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

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

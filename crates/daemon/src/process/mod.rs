pub mod utils;

use std::net::SocketAddr;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::http_server;
use crate::{ServiceConfig, ServiceState};

use utils::ShutdownSignal;

/// Budget for background tasks to finish once shutdown has been broadcast.
const TASK_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

const LOG_FILE_PREFIX: &str = "depot.log";

/// Handle for gracefully shutting down the daemon service.
pub struct ShutdownHandle {
    signal_waiter: JoinHandle<()>,
    tasks: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<()>,
    state: ServiceState,
}

impl ShutdownHandle {
    /// Block until the service shuts down (via signal or explicit shutdown),
    /// then close the database.
    pub async fn wait(self) {
        let _ = self.signal_waiter.await;

        if timeout(TASK_DRAIN_TIMEOUT, join_all(self.tasks))
            .await
            .is_err()
        {
            tracing::error!(
                timeout_secs = TASK_DRAIN_TIMEOUT.as_secs(),
                "tasks did not stop in time"
            );
            std::process::exit(4);
        }

        self.state.database().close().await;
        tracing::info!("database closed");
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn env_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Stdout always; a daily rolling file as well when `log_dir` is set.
///
/// The returned guards flush the non-blocking writers on drop.
fn init_logging(service_config: &ServiceConfig) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();

    let (stdout_writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(guard);
    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(env_filter(service_config.log_level));

    let file_layer = service_config.log_dir.as_ref().and_then(|log_dir| {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!("Warning: cannot create log directory {:?}: {}", log_dir, e);
            return None;
        }
        let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
        let (file_writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);

        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(env_filter(service_config.log_level)),
        )
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("error creating server state: {0}")]
    State(#[from] crate::service_state::StateSetupError),
    #[error("failed to install signal handlers: {0}")]
    Signals(#[from] std::io::Error),
    #[error("failed to start HTTP server: {0}")]
    Http(#[from] http_server::HttpServerError),
}

/// Build state (reconciling any pending intents) and spawn the HTTP server.
///
/// The service keeps running if the returned handle is dropped.
pub async fn start_service(
    service_config: &ServiceConfig,
) -> Result<(ServiceState, ShutdownHandle), StartError> {
    let state = ServiceState::from_config(service_config).await?;

    let listen_addr = SocketAddr::from(([0, 0, 0, 0], service_config.port));
    let listener = http_server::bind(listen_addr).await?;
    let signal = ShutdownSignal::install()?;

    let http_config = http_server::Config::new(listen_addr, service_config.log_level);
    let http_state = state.clone();
    let http_rx = signal.subscribe();
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server::run(listener, http_config, http_state, http_rx).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tracing::info!(
        port = service_config.port,
        table = %service_config.table_name,
        "upload service running"
    );

    let handle = ShutdownHandle {
        shutdown_tx: signal.sender(),
        signal_waiter: signal.waiter,
        tasks: vec![http_task],
        state: state.clone(),
    };

    Ok((state, handle))
}

/// Run the service until a shutdown signal arrives. Exits the process with
/// code 3 if start-up fails.
pub async fn spawn_service(service_config: &ServiceConfig) {
    let _guards = init_logging(service_config);
    match start_service(service_config).await {
        Ok((_, handle)) => handle.wait().await,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(3);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_taken_port_fails_start() {
        let taken = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
        let config = ServiceConfig {
            port: taken.local_addr().unwrap().port(),
            ..Default::default()
        };

        let err = start_service(&config).await.err().unwrap();
        assert!(matches!(
            err,
            StartError::Http(http_server::HttpServerError::Bind { .. })
        ));
    }
}

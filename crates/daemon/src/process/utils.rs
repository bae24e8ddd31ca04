use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long in-flight uploads get after SIGTERM before the listener stops.
const SIGTERM_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Fan-out of a single shutdown event.
///
/// `waiter` finishes once shutdown has been broadcast, whether it came from
/// a signal or from [`ShutdownSignal::trigger`].
pub struct ShutdownSignal {
    pub waiter: JoinHandle<()>,
    tx: watch::Sender<()>,
    rx: watch::Receiver<()>,
}

impl ShutdownSignal {
    /// Install SIGINT/SIGTERM handlers. Fails only if the runtime cannot
    /// register them.
    pub fn install() -> std::io::Result<Self> {
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        let (tx, rx) = watch::channel(());
        let broadcast = tx.clone();
        let mut requested = rx.clone();

        let waiter = tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => tracing::info!("SIGINT received, shutting down"),
                _ = sigterm.recv() => {
                    tracing::info!(
                        grace_secs = SIGTERM_GRACE_PERIOD.as_secs(),
                        "SIGTERM received, draining"
                    );
                    tokio::time::sleep(SIGTERM_GRACE_PERIOD).await;
                }
                _ = requested.changed() => tracing::info!("shutdown requested"),
            }
            let _ = broadcast.send(());
        });

        Ok(Self { waiter, tx, rx })
    }

    /// A receiver for a task that must stop on shutdown.
    pub fn subscribe(&self) -> watch::Receiver<()> {
        self.rx.clone()
    }

    pub fn sender(&self) -> watch::Sender<()> {
        self.tx.clone()
    }
}

/// Route panics through `tracing` so they reach the log file too.
pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| match panic.location() {
        Some(loc) => tracing::error!(
            message = %panic,
            panic.file = loc.file(),
            panic.line = loc.line(),
        ),
        None => tracing::error!(message = %panic),
    }));
}

pub fn report_build_info() {
    let build = crate::version::build_info();
    tracing::info!(
        version = build.version,
        profile = build.build_profile,
        features = build.build_features,
        target = build.build_target.unwrap_or("unknown"),
        "depot starting"
    );
}

//! Shutdown notification for a served dispatcher.
//!
//! A [`ShutdownNotifier`] is created with the router and handed to the
//! [`Dispatcher`](super::Dispatcher) when it is sealed. It offers two ways to
//! follow a shutdown:
//!
//! - a [`CancellationToken`] that is cancelled as soon as shutdown begins, and
//!   that can also be cancelled by the embedding program to stop the server;
//! - a broadcast of [`ShutdownPhase`] events for components that need to
//!   react to each stage.
//!
//! ```rust,no_run
//! use kiwi_dispatch::{Config, FluentRouter};
//!
//! # async fn example() -> kiwi_dispatch::Result<()> {
//! let router = FluentRouter::new(Config::default())?;
//! let token = router.cancellation_token();
//!
//! tokio::spawn(async move {
//!     token.cancelled().await;
//!     tracing::info!("Flushing audit log");
//! });
//!
//! router.seal()?.start().await
//! # }
//! ```

use {
    std::time::Duration,
    tokio::{signal, sync::broadcast},
    tokio_util::sync::CancellationToken,
};

/// The stages of a graceful shutdown, emitted in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// A signal arrived or the token was cancelled. No new connections are accepted.
    Initiated,

    /// In-flight requests are draining for at most `timeout`.
    GracePeriodStarted { timeout: Duration },

    /// The grace period expired before all connections drained.
    GracePeriodEnded,
}

/// Broadcasts [`ShutdownPhase`] events and owns the shutdown token.
///
/// Clones share the same channel and token.
#[derive(Clone)]
pub struct ShutdownNotifier {
    sender: broadcast::Sender<ShutdownPhase>,
    cancel_token: CancellationToken,
}

impl ShutdownNotifier {
    /// Creates a notifier buffering up to `capacity` unread phases per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Subscribes to phases emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownPhase> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    #[must_use]
    pub fn is_shutdown_initiated(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Sends `phase` to all subscribers and returns how many received it.
    /// [`ShutdownPhase::Initiated`] also cancels the token.
    pub(crate) fn emit(&self, phase: ShutdownPhase) -> usize {
        if phase == ShutdownPhase::Initiated {
            self.cancel_token.cancel();
        }
        self.sender.send(phase).unwrap_or(0)
    }
}

impl Default for ShutdownNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}

impl std::fmt::Debug for ShutdownNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownNotifier")
            .field("subscriber_count", &self.sender.receiver_count())
            .field("is_shutdown_initiated", &self.is_shutdown_initiated())
            .finish()
    }
}

/// Resolves once Ctrl+C, SIGTERM, or a cancelled token asks the server to stop,
/// after emitting `Initiated` and `GracePeriodStarted`.
///
/// A signal handler that cannot be installed is logged and then ignored,
/// leaving the other triggers in place.
pub(crate) async fn shutdown_signal(timeout: Duration, notifier: ShutdownNotifier) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::debug!("Ctrl+C signal received"),
            Err(err) => {
                tracing::warn!("Failed to install Ctrl+C handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut handler) => {
                handler.recv().await;
                tracing::debug!("SIGTERM signal received");
            }
            Err(err) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let token = notifier.cancellation_token();
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => tracing::debug!("Shutdown requested through cancellation token"),
    }

    tracing::info!(
        "Starting graceful shutdown (timeout: {}s)",
        timeout.as_secs()
    );
    let subscribers = notifier.emit(ShutdownPhase::Initiated);
    tracing::debug!("Shutdown initiated notification sent to {} subscriber(s)", subscribers);
    notifier.emit(ShutdownPhase::GracePeriodStarted { timeout });
}

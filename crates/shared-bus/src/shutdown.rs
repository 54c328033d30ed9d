//! Shutdown signalling over a `tokio::sync::watch` channel.

use tokio::sync::watch;

/// Receiving end handed to every long-running task.
pub type ShutdownReceiver = watch::Receiver<bool>;

/// Create the shutdown channel, initially not triggered.
#[must_use]
pub fn shutdown_channel() -> (watch::Sender<bool>, ShutdownReceiver) {
    watch::channel(false)
}

/// Resolve once shutdown has been requested.
///
/// A dropped sender never resolves the future: tasks keep running until
/// they finish on their own.
pub async fn shutdown_requested(rx: &mut ShutdownReceiver) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

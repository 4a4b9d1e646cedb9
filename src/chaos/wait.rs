// src/chaos/wait.rs
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Sleep for `duration` unless shutdown is requested first.
/// Returns `false` when the pause was cut short by shutdown.
pub async fn pause(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if is_shutdown(shutdown) {
        return false;
    }

    tokio::select! {
        _ = sleep(duration) => true,
        _ = wait_for_shutdown(shutdown) => false,
    }
}

/// Resolves once shutdown is signalled. A dropped sender counts as shutdown.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

pub fn is_shutdown(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

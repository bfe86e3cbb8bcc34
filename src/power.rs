//! Power-state event source
//!
//! Suspend/resume notifications fan out over a broadcast channel; the sync
//! controller is driven by a dispatch task subscribed to it. The events
//! themselves come from outside (the HTTP surface, or whatever platform
//! monitor feeds the daemon).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::fsync::SyncController;

/// Power-state transition notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerEvent {
    /// Screen-off / early-suspend window opens
    Suspend,
    /// Window closes
    Resume,
}

/// Broadcast source of power events
pub struct PowerMonitor {
    event_tx: broadcast::Sender<PowerEvent>,
}

impl PowerMonitor {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(16);
        Self { event_tx }
    }

    /// Publish an event to all subscribers
    pub fn notify(&self, event: PowerEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PowerEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for PowerMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire the sync controller to a power monitor.
///
/// Spawns the dispatch task that turns broadcast events into
/// `on_suspend_event` / `on_resume_event` calls. The task ends when the
/// monitor is dropped.
pub fn spawn_dispatch(
    monitor: &PowerMonitor,
    controller: Arc<SyncController>,
) -> JoinHandle<()> {
    let mut rx = monitor.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(PowerEvent::Suspend) => controller.on_suspend_event(),
                Ok(PowerEvent::Resume) => controller.on_resume_event(),
                // Missed events are acceptable; the transitions are
                // idempotent and resume always wins eventually.
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!("power dispatch lagged, skipped {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsync::WritebackFlush;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingFlush(AtomicUsize);

    impl WritebackFlush for CountingFlush {
        fn flush_all(&self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached within timeout");
    }

    #[tokio::test]
    async fn test_dispatch_drives_controller() {
        let flush = Arc::new(CountingFlush(AtomicUsize::new(0)));
        let controller = Arc::new(SyncController::new(
            Arc::clone(&flush) as Arc<dyn WritebackFlush>
        ));
        let monitor = PowerMonitor::new();
        let handle = spawn_dispatch(&monitor, Arc::clone(&controller));

        monitor.notify(PowerEvent::Suspend);
        wait_until(|| controller.suspended()).await;
        assert_eq!(flush.0.load(Ordering::Relaxed), 1);

        monitor.notify(PowerEvent::Resume);
        wait_until(|| !controller.suspended()).await;

        drop(monitor);
        let _ = handle.await;
    }

    #[tokio::test]
    async fn test_notify_without_subscribers_is_ok() {
        let monitor = PowerMonitor::new();
        monitor.notify(PowerEvent::Suspend);
        monitor.notify(PowerEvent::Resume);
    }
}

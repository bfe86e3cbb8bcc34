//! Dynamic fsync deferral controller
//!
//! Holds one toggle (`active`) and one derived flag (`suspended`). While the
//! system sits in the early-suspend (screen-off) window with the toggle on,
//! filesystem sync is deferred elsewhere to save I/O; entering the window
//! flushes outstanding writeback once so nothing dirty is stranded.
//!
//! Locking follows the historical contract exactly: a single mutex guards
//! the suspend/resume transition body, while `active` is a plain atomic
//! store taken outside it. A `set_active` racing an in-flight transition can
//! produce one stale flush decision; that race is accepted as benign.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::attr::{Attr, AttrGroup};

/// Controller revision published via `Dyn_fsync_version`
pub const DYN_FSYNC_VERSION: u32 = 2;

/// Writeback flush capability
///
/// Fire-and-forget: implementations make best-effort progress, nothing is
/// checked or retried.
pub trait WritebackFlush: Send + Sync {
    /// Flush all pending dirty buffers toward stable storage
    fn flush_all(&self);
}

/// Production flusher: hands the job to the operating system
///
/// Userspace stand-in for waking the kernel flusher threads: a detached
/// `sync(1)` child. The result is deliberately not collected.
pub struct OsWriteback;

impl WritebackFlush for OsWriteback {
    fn flush_all(&self) {
        match std::process::Command::new("sync").spawn() {
            Ok(_) => debug!("writeback flush requested"),
            Err(e) => debug!("writeback flush unavailable: {}", e),
        }
    }
}

/// Sync deferral state machine
///
/// Defaults: `active = true`, `suspended = false`. `suspended` is true only
/// inside the suspend window and is always cleared on resume regardless of
/// `active`.
pub struct SyncController {
    active: AtomicBool,
    suspended: AtomicBool,
    /// Guards the suspend/resume transition body only
    transition: Mutex<()>,
    flusher: Arc<dyn WritebackFlush>,
}

impl SyncController {
    pub fn new(flusher: Arc<dyn WritebackFlush>) -> Self {
        Self {
            active: AtomicBool::new(true),
            suspended: AtomicBool::new(false),
            transition: Mutex::new(()),
            flusher,
        }
    }

    /// Whether deferral is enabled
    pub fn active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Whether the system is currently inside the suspend window
    pub fn suspended(&self) -> bool {
        self.suspended.load(Ordering::Relaxed)
    }

    /// Enable or disable deferral.
    ///
    /// Intentionally not serialized against the transition mutex; see the
    /// module docs for the accepted race.
    pub fn set_active(&self, flag: bool) {
        if flag {
            info!("dynamic fsync enabled");
        } else {
            info!("dynamic fsync disabled");
        }
        self.active.store(flag, Ordering::Relaxed);
    }

    /// Parse raw attribute input for the `Dyn_fsync_active` toggle.
    ///
    /// Domain is {0, 1}. Anything else leaves state unchanged: an in-domain
    /// parse failure and an out-of-domain number get distinct log lines,
    /// matching the historical store.
    fn store_active(&self, input: &str) {
        match input.trim().parse::<u32>() {
            Ok(1) => self.set_active(true),
            Ok(0) => self.set_active(false),
            Ok(other) => debug!("Dyn_fsync_active: bad value: {}", other),
            Err(_) => debug!("Dyn_fsync_active: unknown input, ignored"),
        }
    }

    /// Suspend-window entry notification.
    ///
    /// If deferral is active, marks the window open and fires one writeback
    /// flush. If inactive, `suspended` is left untouched.
    pub fn on_suspend_event(&self) {
        let _guard = self.transition.lock().unwrap_or_else(|e| e.into_inner());
        if self.active.load(Ordering::Relaxed) {
            self.suspended.store(true, Ordering::Relaxed);
            self.flusher.flush_all();
        }
    }

    /// Resume notification: unconditionally closes the suspend window.
    pub fn on_resume_event(&self) {
        let _guard = self.transition.lock().unwrap_or_else(|e| e.into_inner());
        self.suspended.store(false, Ordering::Relaxed);
    }

    /// Build the `dyn_fsync` attribute group
    pub fn attr_group(self: &Arc<Self>) -> AttrGroup {
        let show_active = Arc::clone(self);
        let store_active = Arc::clone(self);
        let show_suspend = Arc::clone(self);

        AttrGroup::new(
            "dyn_fsync",
            vec![
                Attr::read_write(
                    "Dyn_fsync_active",
                    move || format!("{}\n", u32::from(show_active.active())),
                    move |input| store_active.store_active(input),
                ),
                Attr::read_only("Dyn_fsync_version", || {
                    format!("version: {}\n", DYN_FSYNC_VERSION)
                }),
                Attr::read_only("Dyn_fsync_earlysuspend", move || {
                    format!("early suspend active: {}\n", u32::from(show_suspend.suspended()))
                }),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Counts flush invocations instead of touching the OS
    struct CountingFlush {
        calls: AtomicUsize,
    }

    impl CountingFlush {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn count(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    impl WritebackFlush for CountingFlush {
        fn flush_all(&self) {
            self.calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn controller() -> (Arc<SyncController>, Arc<CountingFlush>) {
        let flush = CountingFlush::new();
        let controller = Arc::new(SyncController::new(
            Arc::clone(&flush) as Arc<dyn WritebackFlush>
        ));
        (controller, flush)
    }

    #[test]
    fn test_defaults() {
        let (controller, _) = controller();
        assert!(controller.active());
        assert!(!controller.suspended());
    }

    #[test]
    fn test_suspend_while_active_flushes_once() {
        let (controller, flush) = controller();

        controller.on_suspend_event();
        assert!(controller.suspended());
        assert_eq!(flush.count(), 1);
    }

    #[test]
    fn test_suspend_while_inactive_is_inert() {
        let (controller, flush) = controller();

        controller.set_active(false);
        controller.on_suspend_event();
        assert!(!controller.suspended());
        assert_eq!(flush.count(), 0);
    }

    #[test]
    fn test_resume_always_clears_suspended() {
        let (controller, _) = controller();

        controller.on_suspend_event();
        assert!(controller.suspended());
        controller.on_resume_event();
        assert!(!controller.suspended());

        // Resume with nothing pending is still a clear
        controller.set_active(false);
        controller.on_resume_event();
        assert!(!controller.suspended());
    }

    #[test]
    fn test_each_suspend_flushes() {
        let (controller, flush) = controller();

        controller.on_suspend_event();
        controller.on_resume_event();
        controller.on_suspend_event();
        assert_eq!(flush.count(), 2);
    }

    #[test]
    fn test_store_active_domain() {
        let (controller, _) = controller();

        controller.store_active("0");
        assert!(!controller.active());

        controller.store_active("1\n");
        assert!(controller.active());

        // Out of domain and malformed inputs change nothing
        controller.store_active("2");
        assert!(controller.active());

        controller.store_active("yes");
        assert!(controller.active());

        controller.store_active("");
        assert!(controller.active());
    }

    #[test]
    fn test_deactivate_during_window_leaves_stale_flag() {
        // Documented latent inconsistency: toggling inactive inside the
        // window does not clear `suspended`; only resume does.
        let (controller, _) = controller();

        controller.on_suspend_event();
        controller.set_active(false);
        assert!(controller.suspended());

        controller.on_resume_event();
        assert!(!controller.suspended());
    }

    #[test]
    fn test_attr_group_surface() {
        let (controller, _) = controller();
        let group = controller.attr_group();

        assert_eq!(group.name(), "dyn_fsync");

        let active = group.attr("Dyn_fsync_active").unwrap();
        assert_eq!(active.show(), "1\n");
        active.store("0");
        assert_eq!(active.show(), "0\n");

        let version = group.attr("Dyn_fsync_version").unwrap();
        assert_eq!(version.show(), "version: 2\n");
        assert!(!version.store("3"));

        let earlysuspend = group.attr("Dyn_fsync_earlysuspend").unwrap();
        assert_eq!(earlysuspend.show(), "early suspend active: 0\n");
    }

    #[test]
    fn test_earlysuspend_attr_tracks_window() {
        let (controller, _) = controller();
        let group = controller.attr_group();
        let earlysuspend = group.attr("Dyn_fsync_earlysuspend").unwrap();

        controller.on_suspend_event();
        assert_eq!(earlysuspend.show(), "early suspend active: 1\n");

        controller.on_resume_event();
        assert_eq!(earlysuspend.show(), "early suspend active: 0\n");
    }
}

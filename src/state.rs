//! State shared between the frame loop and the voice thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Whether voice command mode is on.
///
/// Every read and write goes through the one mutex; callers never see the
/// guard.
#[derive(Debug, Default)]
pub struct VoiceActivation {
    active: Mutex<bool>,
}

impl VoiceActivation {
    #[must_use]
    pub fn new(active: bool) -> Self {
        Self {
            active: Mutex::new(active),
        }
    }

    fn guard(&self) -> MutexGuard<'_, bool> {
        // A panicking holder cannot leave a bool half-written
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        *self.guard()
    }

    pub fn set_active(&self, active: bool) {
        *self.guard() = active;
    }

    /// Flip the flag and return the new value
    pub fn toggle(&self) -> bool {
        let mut active = self.guard();
        *active = !*active;
        *active
    }
}

/// Cooperative shutdown request observed by both contexts
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_toggle_returns_new_value() {
        let activation = VoiceActivation::default();
        assert!(!activation.is_active());
        assert!(activation.toggle());
        assert!(activation.is_active());
        assert!(!activation.toggle());
        activation.set_active(true);
        assert!(activation.is_active());
    }

    #[test]
    fn test_concurrent_toggles_are_not_lost() {
        let activation = Arc::new(VoiceActivation::new(false));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let activation = Arc::clone(&activation);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        activation.toggle();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        // 8000 flips: back where we started
        assert!(!activation.is_active());
    }

    #[test]
    fn test_shutdown_signal_is_shared_by_clones() {
        let signal = ShutdownSignal::new();
        let other = signal.clone();
        assert!(!other.is_requested());
        signal.request();
        assert!(other.is_requested());
    }
}

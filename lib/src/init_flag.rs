//! One-shot initialisation flags.

use core::sync::atomic::{AtomicBool, Ordering};

/// A boolean latch recording that a subsystem finished initialising.
///
/// Set with release ordering so state written before `mark_set()` is
/// visible to any context that observes the flag.
pub struct InitFlag {
    flag: AtomicBool,
}

impl InitFlag {
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn mark_set(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Relaxed read for hot paths that only need eventual visibility.
    #[inline]
    pub fn is_set_relaxed(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl Default for InitFlag {
    fn default() -> Self {
        Self::new()
    }
}

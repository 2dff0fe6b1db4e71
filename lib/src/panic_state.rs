//! Faulting CPU state captured for the panic handler.
//!
//! The interrupt dispatcher records the faulting RIP/RSP here immediately
//! before panicking so the panic handler can report where execution stopped
//! even though the panic itself unwinds no further than a halt loop.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static PANIC_RIP: AtomicU64 = AtomicU64::new(0);
static PANIC_RSP: AtomicU64 = AtomicU64::new(0);
static PANIC_STATE_VALID: AtomicBool = AtomicBool::new(false);

/// Record the instruction and stack pointer at the point of failure.
pub fn set_panic_cpu_state(rip: u64, rsp: u64) {
    PANIC_RIP.store(rip, Ordering::Relaxed);
    PANIC_RSP.store(rsp, Ordering::Relaxed);
    PANIC_STATE_VALID.store(true, Ordering::Release);
}

/// Returns `Some((rip, rsp))` if a dispatcher recorded fault state.
pub fn panic_cpu_state() -> Option<(u64, u64)> {
    if PANIC_STATE_VALID.load(Ordering::Acquire) {
        Some((
            PANIC_RIP.load(Ordering::Relaxed),
            PANIC_RSP.load(Ordering::Relaxed),
        ))
    } else {
        None
    }
}

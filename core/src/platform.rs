//! Platform service seam.
//!
//! The interrupt core must acknowledge the LAPIC and reload the paging root
//! without linking against the driver or boot crates (the dependency runs
//! the other way).  Hardware touch-points are therefore registered here as
//! function pointers during early boot.  Until registration every service is
//! a safe no-op, which also lets the test suites install recording
//! implementations.

use core::sync::atomic::{AtomicPtr, Ordering};

/// Acknowledge the current interrupt at the interrupt controller.
pub type SendEoiFn = fn();

/// Load a new page-table root (CR3 on x86_64).
pub type LoadPagingRootFn = fn(u64);

static SEND_EOI_FN: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());
static LOAD_PAGING_ROOT_FN: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

pub fn register_send_eoi_fn(f: SendEoiFn) {
    SEND_EOI_FN.store(f as *mut (), Ordering::Release);
}

pub fn register_load_paging_root_fn(f: LoadPagingRootFn) {
    LOAD_PAGING_ROOT_FN.store(f as *mut (), Ordering::Release);
}

/// Signal end-of-interrupt. No-op until a controller is registered.
#[inline]
pub fn irq_send_eoi() {
    let ptr = SEND_EOI_FN.load(Ordering::Acquire);
    if ptr.is_null() {
        return;
    }
    // SAFETY: Only `register_send_eoi_fn` stores into the slot, and fn
    // pointers are pointer-sized on x86_64.
    let f: SendEoiFn = unsafe { core::mem::transmute(ptr) };
    f();
}

/// Activate the address space rooted at `root`. No-op until paging is up.
#[inline]
pub fn paging_load_root(root: u64) {
    let ptr = LOAD_PAGING_ROOT_FN.load(Ordering::Acquire);
    if ptr.is_null() {
        return;
    }
    // SAFETY: Only `register_load_paging_root_fn` stores into the slot.
    let f: LoadPagingRootFn = unsafe { core::mem::transmute(ptr) };
    f(root);
}

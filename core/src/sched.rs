//! Minimal scheduler surface used by the interrupt core.
//!
//! The dispatcher needs exactly two capabilities from the scheduler: read
//! the current process and activate a process's address space.  Everything
//! else the scheduler may grow later stays out of this module.

use core::sync::atomic::{AtomicPtr, Ordering};

use crate::platform;

/// A schedulable process as the interrupt core sees it: an identifier and
/// the physical root of its page-table hierarchy.
#[repr(C)]
#[derive(Debug)]
pub struct Process {
    pub pid: u32,
    pub page_table_root: u64,
}

impl Process {
    pub const fn new(pid: u32, page_table_root: u64) -> Self {
        Self {
            pid,
            page_table_root,
        }
    }
}

/// The process whose address space is considered active. Null when the
/// kernel is running outside any process context (early boot, idle).
static CURRENT_PROCESS: AtomicPtr<Process> = AtomicPtr::new(core::ptr::null_mut());

pub fn scheduler_set_current_process(process: *const Process) {
    CURRENT_PROCESS.store(process as *mut Process, Ordering::Release);
}

pub fn scheduler_current_process() -> *const Process {
    CURRENT_PROCESS.load(Ordering::Acquire)
}

/// Activate `process`'s address space. A null process is ignored.
///
/// Does not touch the current-process slot: the dispatcher swaps address
/// spaces around handler callbacks without the process ever being
/// "scheduled".
pub fn process_load_address_space(process: *const Process) {
    if process.is_null() {
        return;
    }
    // SAFETY: Callers pass processes that outlive the dispatch (handler
    // descriptors hold them for the kernel's lifetime).
    let root = unsafe { (*process).page_table_root };
    platform::paging_load_root(root);
}

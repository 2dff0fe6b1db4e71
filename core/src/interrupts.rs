//! Interrupt dispatch framework.
//!
//! This module provides the per-vector handler registry, the high-level
//! dispatcher invoked by the assembly common entry, and the page-fault
//! error-code decoding.  The trampolines and the register save/restore
//! sequence live in the boot crate; everything that runs after the frame is
//! on the stack lives here.
//!
//! Platform-specific operations (EOI, paging root loads) are called via the
//! platform service function pointers registered at boot time.

use core::cell::UnsafeCell;
use core::fmt;

use bitflags::bitflags;

use cinderos_abi::arch::x86_64::idt::{
    EXCEPTION_BREAKPOINT, EXCEPTION_GENERAL_PROTECTION, EXCEPTION_PAGE_FAULT, IDT_ENTRIES,
};
use cinderos_lib::cpu;
use cinderos_lib::{
    InterruptFrame, IrqMutex, kdiag_dump_interrupt_frame, klog_info, klog_warn,
    set_panic_cpu_state,
};

use crate::platform;
use crate::sched::{self, Process};

/// Handler callback signature.
///
/// Receives the saved frame (mutable: changes to `rip`, `rsp`, … take effect
/// on `iretq`) and returns `true` to claim the interrupt and stop the chain
/// walk.
pub type IsrCallback = fn(*mut InterruptFrame) -> bool;

/// A registered interrupt handler.
#[derive(Clone, Copy)]
pub struct IsrHandler {
    /// Invoked with the saved frame while interrupts are disabled.
    pub callback: IsrCallback,
    /// If non-null, this process's address space is active while the
    /// callback runs; the previously active one is reinstated afterwards.
    pub process: *const Process,
}

impl IsrHandler {
    pub const fn new(callback: IsrCallback) -> Self {
        Self {
            callback,
            process: core::ptr::null(),
        }
    }

    pub const fn with_process(callback: IsrCallback, process: *const Process) -> Self {
        Self { callback, process }
    }
}

// ---------------------------------------------------------------------------
// Handler registry
// ---------------------------------------------------------------------------
//
// Chains are singly linked through a fixed node pool anchored in a 256-slot
// head array, so registration never calls an allocator.  Registration
// happens during driver initialization; dispatch reads happen in interrupt
// context with interrupts already disabled.  The `IrqMutex` covers the
// window where a late registration could race a snapshot.

/// Total handler registrations across all vectors.
const HANDLER_POOL_SIZE: usize = 64;

/// Sentinel index terminating a chain.
const NIL: u16 = u16::MAX;

#[derive(Clone, Copy)]
struct HandlerNode {
    handler: Option<IsrHandler>,
    next: u16,
}

impl HandlerNode {
    const fn empty() -> Self {
        Self {
            handler: None,
            next: NIL,
        }
    }
}

struct HandlerTable {
    nodes: UnsafeCell<[HandlerNode; HANDLER_POOL_SIZE]>,
    heads: UnsafeCell<[u16; IDT_ENTRIES]>,
    allocated: UnsafeCell<usize>,
}

// SAFETY: All access goes through `with_handler_table`, which holds the
// registry lock with interrupts disabled.
unsafe impl Sync for HandlerTable {}

impl HandlerTable {
    const fn new() -> Self {
        Self {
            nodes: UnsafeCell::new([HandlerNode::empty(); HANDLER_POOL_SIZE]),
            heads: UnsafeCell::new([NIL; IDT_ENTRIES]),
            allocated: UnsafeCell::new(0),
        }
    }
}

static HANDLER_TABLE: HandlerTable = HandlerTable::new();
static HANDLER_TABLE_LOCK: IrqMutex<()> = IrqMutex::new(());

/// Access the registry under lock.
#[inline]
fn with_handler_table<R>(
    f: impl FnOnce(&mut [HandlerNode; HANDLER_POOL_SIZE], &mut [u16; IDT_ENTRIES], &mut usize) -> R,
) -> R {
    let _guard = HANDLER_TABLE_LOCK.lock();
    unsafe {
        f(
            &mut *HANDLER_TABLE.nodes.get(),
            &mut *HANDLER_TABLE.heads.get(),
            &mut *HANDLER_TABLE.allocated.get(),
        )
    }
}

/// Append `handler` to `vector`'s chain.
///
/// Handlers run in registration order; no deduplication is performed.  If
/// the node pool is exhausted the registration is logged and dropped; the
/// caller cannot observe the failure.  Registration happens at boot, where
/// pool exhaustion is itself fatal.
pub fn register_handler(vector: u8, handler: IsrHandler) {
    let registered = with_handler_table(|nodes, heads, allocated| {
        if *allocated >= HANDLER_POOL_SIZE {
            return false;
        }
        let index = *allocated as u16;
        *allocated += 1;
        nodes[index as usize] = HandlerNode {
            handler: Some(handler),
            next: NIL,
        };

        let head = heads[vector as usize];
        if head == NIL {
            heads[vector as usize] = index;
        } else {
            let mut tail = head;
            while nodes[tail as usize].next != NIL {
                tail = nodes[tail as usize].next;
            }
            nodes[tail as usize].next = index;
        }
        true
    });

    if !registered {
        klog_warn!(
            "INT: Handler pool exhausted, dropping registration for vector {}",
            vector
        );
    }
}

/// Shorthand for a handler without address-space activation.
pub fn register_handler_callback(vector: u8, callback: IsrCallback) {
    register_handler(vector, IsrHandler::new(callback));
}

/// Number of handlers currently chained on `vector`.
pub fn handler_count(vector: u8) -> usize {
    with_handler_table(|nodes, heads, _| {
        let mut count = 0;
        let mut index = heads[vector as usize];
        while index != NIL {
            count += 1;
            index = nodes[index as usize].next;
        }
        count
    })
}

/// Fetch the `position`-th handler of `vector`'s chain, if present.
fn chain_handler(vector: u8, position: usize) -> Option<IsrHandler> {
    with_handler_table(|nodes, heads, _| {
        let mut index = heads[vector as usize];
        let mut remaining = position;
        while index != NIL {
            if remaining == 0 {
                return nodes[index as usize].handler;
            }
            remaining -= 1;
            index = nodes[index as usize].next;
        }
        None
    })
}

// ---------------------------------------------------------------------------
// Page-fault error code
// ---------------------------------------------------------------------------

bitflags! {
    /// Page-fault error code pushed by the CPU (Intel SDM Vol. 3A, §4.7).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PageFaultCode: u64 {
        /// Fault caused by a protection violation (set) or a non-present
        /// page (clear).
        const PROTECTION = 1 << 0;
        /// Faulting access was a write (set) or a read (clear).
        const WRITE = 1 << 1;
        /// Fault originated at CPL 3.
        const USER = 1 << 2;
        /// A reserved page-table bit was set.
        const RESERVED_WRITE = 1 << 3;
        /// Fault on an instruction fetch.
        const INSTRUCTION_FETCH = 1 << 4;
    }
}

impl fmt::Display for PageFaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.contains(Self::PROTECTION) {
            f.write_str("Page Protection, ")?;
        }
        f.write_str(if self.contains(Self::WRITE) {
            "Write"
        } else {
            "Read"
        })?;
        if self.contains(Self::USER) {
            f.write_str(", CPL=3")?;
        }
        if self.contains(Self::RESERVED_WRITE) {
            f.write_str(", Reserved Write")?;
        }
        if self.contains(Self::INSTRUCTION_FETCH) {
            f.write_str(", Executed")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// High-level interrupt dispatcher.
///
/// Called by both assembly common-entry procedures with a pointer to the
/// saved frame; the returned pointer is the frame the restore sequence
/// resumes from.  Returning a different pointer is the context-switch hook;
/// this dispatcher always hands back the frame it was given.
#[unsafe(no_mangle)]
pub extern "C" fn isr_dispatch(frame: *mut InterruptFrame) -> *mut InterruptFrame {
    // SAFETY: The common entry passes its own stack pointer, which holds a
    // complete frame for the lifetime of this call.
    let frame_ref = unsafe { &mut *frame };
    let vector = (frame_ref.vector & 0xFF) as u8;

    match vector {
        EXCEPTION_BREAKPOINT => exception_panic("Breakpoint", frame_ref),
        EXCEPTION_GENERAL_PROTECTION => exception_panic("GPF", frame_ref),
        EXCEPTION_PAGE_FAULT => page_fault_panic(frame_ref),
        _ => dispatch_to_handlers(frame_ref),
    }

    frame
}

/// Walk `vector`'s handler chain and acknowledge the interrupt controller.
///
/// Other architectural exceptions fall through to this path on purpose: a
/// driver or debugger may claim them by registering a handler.
fn dispatch_to_handlers(frame: &mut InterruptFrame) {
    let vector = (frame.vector & 0xFF) as u8;

    klog_info!(
        "INT: ss=0x{:x} vector={} rflags=0x{:x}",
        frame.ss,
        vector,
        frame.rflags
    );

    // Length snapshot: handlers a callback registers for this same vector
    // join future dispatches, never the walk in progress.
    let count = handler_count(vector);
    let mut handled = false;

    for position in 0..count {
        let Some(handler) = chain_handler(vector, position) else {
            break;
        };

        let mut restore: *const Process = core::ptr::null();
        if !handler.process.is_null() {
            restore = sched::scheduler_current_process();
            sched::process_load_address_space(handler.process);
        }

        let claimed = (handler.callback)(frame as *mut InterruptFrame);

        // The snapshot is reinstated before the claim is honored so the
        // previous mapping is back even when the callback declines.
        if !restore.is_null() {
            sched::process_load_address_space(restore);
        }

        if claimed {
            handled = true;
            break;
        }
    }

    if !handled {
        klog_warn!("INT: No handler claimed vector {}", vector);
    }

    platform::irq_send_eoi();
}

/// Record the faulting context and panic. Used for exceptions with a fixed
/// fatal policy.
fn exception_panic(message: &'static str, frame: &mut InterruptFrame) -> ! {
    kdiag_dump_interrupt_frame(frame);
    set_panic_cpu_state(frame.rip, frame.rsp);
    panic!("{}", message);
}

/// Unrecoverable page fault: report the faulting address and the decoded
/// error code, then panic.
fn page_fault_panic(frame: &mut InterruptFrame) -> ! {
    let fault_addr = cpu::read_cr2();
    let code = PageFaultCode::from_bits_truncate(frame.error_code);

    klog_info!("FATAL: Page fault");
    kdiag_dump_interrupt_frame(frame);
    set_panic_cpu_state(frame.rip, frame.rsp);
    panic!("Page fault at 0x{:x} ({})", fault_addr, code);
}

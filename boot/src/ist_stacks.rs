//! Interrupt Stack Table (IST) management.
//!
//! The IDT points every vector at one dedicated, statically allocated
//! stack selected through the TSS.  The CPU switches to it on delivery,
//! so even an exception taken with a trashed RSP runs on known-good
//! memory.  Interrupts never nest here (the trampolines run with IF
//! clear until `iretq`), so a single stack is sufficient.

use core::cell::SyncUnsafeCell;

use cinderos_lib::klog_debug;

use crate::gdt;

/// 32 KB of interrupt stack.
pub const INTERRUPT_STACK_SIZE: usize = 32 * 1024;

#[repr(C, align(16))]
struct InterruptStack {
    bytes: [u8; INTERRUPT_STACK_SIZE],
}

static INTERRUPT_STACK: SyncUnsafeCell<InterruptStack> = SyncUnsafeCell::new(InterruptStack {
    bytes: [0; INTERRUPT_STACK_SIZE],
});

/// Top of the interrupt stack as programmed into the TSS.
pub fn interrupt_stack_top() -> u64 {
    let base = INTERRUPT_STACK.get() as u64;
    // The top must stay 16-byte aligned for the CPU-pushed frame.
    (base + INTERRUPT_STACK_SIZE as u64) & !0xF
}

pub fn ist_stacks_init() {
    let top = interrupt_stack_top();
    gdt::gdt_set_ist(gdt::INTERRUPT_IST_INDEX, top);
    klog_debug!(
        "IST: Interrupt stack ready, top=0x{:x} size={}K",
        top,
        INTERRUPT_STACK_SIZE / 1024
    );
}

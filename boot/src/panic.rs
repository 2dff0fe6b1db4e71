//! Kernel panic reporting.
//!
//! The `#[panic_handler]` itself lives in the kernel binary; it delegates
//! here so the boot crate can report the interrupt-time context recorded by
//! the dispatcher before halting.

use core::panic::PanicInfo;

use cinderos_lib::{cpu, klog_error, panic_cpu_state};

pub fn panic_handler_impl(info: &PanicInfo) -> ! {
    cpu::disable_interrupts();

    klog_error!("KERNEL PANIC: {}", info.message());
    if let Some(location) = info.location() {
        klog_error!("At {}:{}", location.file(), location.line());
    }
    if let Some((rip, rsp)) = panic_cpu_state() {
        klog_error!("Faulting context: rip=0x{:x} rsp=0x{:x}", rip, rsp);
    }

    cpu::halt_loop();
}

#![no_std]
#![no_main]
#![forbid(unsafe_op_in_unsafe_fn)]

use core::panic::PanicInfo;

/// Freestanding entry point.
///
/// The loader drops us here with a valid stack and the boot identity
/// mapping in place; everything else is built by `interrupts_init`.
#[unsafe(no_mangle)]
pub extern "C" fn _start() -> ! {
    cinderos_lib::klog_init();
    cinderos_boot::interrupts_init();

    #[cfg(feature = "builtin-tests")]
    cinderos_boot::builtin_tests::run_builtin_tests();

    #[cfg(not(feature = "builtin-tests"))]
    cinderos_lib::cpu::halt_loop()
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    cinderos_boot::panic_handler_impl(info)
}

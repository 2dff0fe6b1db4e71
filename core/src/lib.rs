#![no_std]

pub mod interrupts;
pub mod platform;
pub mod sched;

#[cfg(feature = "itests")]
pub mod interrupts_tests;

pub use interrupts::{
    IsrCallback, IsrHandler, PageFaultCode, handler_count, isr_dispatch, register_handler,
    register_handler_callback,
};
pub use sched::{
    Process, process_load_address_space, scheduler_current_process, scheduler_set_current_process,
};

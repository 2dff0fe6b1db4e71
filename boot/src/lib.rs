#![no_std]
#![feature(sync_unsafe_cell)]

pub mod early_init;
pub mod gdt;
pub mod idt;
pub mod isr_stubs;
pub mod ist_stacks;
pub mod panic;


pub use early_init::interrupts_init;
pub use panic::panic_handler_impl;

#![no_std]
#![allow(unsafe_op_in_unsafe_fn)]

pub mod apic;
pub mod serial;

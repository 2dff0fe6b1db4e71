pub mod apic;
pub mod exception;
pub mod gdt;
pub mod idt;
pub mod msr;

pub use apic::ApicBaseMsr;
pub use gdt::{GdtDescriptor, GdtLayout, GdtTssEntry, SegmentSelector, Tss64};
pub use idt::IdtEntry;
pub use msr::Msr;

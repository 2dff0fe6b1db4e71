//! Model-Specific Register (MSR) addresses.
//!
//! MSRs are accessed via RDMSR/WRMSR instructions using a 32-bit address.
//! This module provides a type-safe `Msr` newtype that prevents accidentally
//! using an MSR address where a port number or other value is expected.

/// Model-Specific Register address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Msr(pub u32);

impl Msr {
    /// APIC Base MSR - contains physical base address and enable flags.
    pub const APIC_BASE: Self = Self(0x1B);

    /// Returns the raw MSR address for use with RDMSR/WRMSR.
    #[inline]
    pub const fn address(self) -> u32 {
        self.0
    }

    /// Creates a new MSR from a raw address.
    ///
    /// Use this for MSRs not defined as constants.
    #[inline]
    pub const fn new(address: u32) -> Self {
        Self(address)
    }
}

//! Global Descriptor Table (GDT) and 64-bit TSS layouts.
//!
//! Layouts must match the hardware-defined formats (Intel SDM Vol. 3A,
//! §3.4.5 and §8.2.1). The kernel uses a flat three-descriptor table
//! (null, code, data) followed by the 16-byte TSS system descriptor.

/// Number of standard 8-byte descriptors before the TSS slot.
pub const GDT_STANDARD_ENTRIES: usize = 3;

/// A plain 8-byte segment descriptor.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct GdtEntry(pub u64);

impl GdtEntry {
    pub const NULL: Self = Self(0);

    /// 64-bit kernel code: present, DPL 0, executable, long-mode flag.
    pub const KERNEL_CODE: Self = Self::descriptor(0x9A, 0xA);

    /// Kernel data: present, DPL 0, writable.
    pub const KERNEL_DATA: Self = Self::descriptor(0x92, 0xC);

    /// Build a flat 4G descriptor from an access byte and flag nibble.
    const fn descriptor(access: u8, flags: u8) -> Self {
        let mut value: u64 = 0xFFFF; // limit 15:0
        value |= (access as u64) << 40;
        value |= 0xF << 48; // limit 19:16
        value |= (flags as u64) << 52;
        Self(value)
    }
}

/// The 16-byte TSS system descriptor occupying two GDT slots.
#[repr(C, packed)]
#[derive(Copy, Clone)]
pub struct GdtTssEntry {
    pub limit_low: u16,
    pub base_low: u16,
    pub base_mid: u8,
    pub access: u8,
    pub limit_flags: u8,
    pub base_high: u8,
    pub base_upper: u32,
    pub reserved: u32,
}

impl GdtTssEntry {
    pub const fn zero() -> Self {
        Self {
            limit_low: 0,
            base_low: 0,
            base_mid: 0,
            access: 0,
            limit_flags: 0,
            base_high: 0,
            base_upper: 0,
            reserved: 0,
        }
    }

    /// Describe an available 64-bit TSS at `base` with `limit` bytes - 1.
    pub const fn for_tss(base: u64, limit: u32) -> Self {
        Self {
            limit_low: (limit & 0xFFFF) as u16,
            base_low: (base & 0xFFFF) as u16,
            base_mid: ((base >> 16) & 0xFF) as u8,
            access: 0x89, // present, type = available 64-bit TSS
            limit_flags: ((limit >> 16) & 0xF) as u8,
            base_high: ((base >> 24) & 0xFF) as u8,
            base_upper: (base >> 32) as u32,
            reserved: 0,
        }
    }
}

/// 64-bit Task State Segment.
#[repr(C, packed)]
#[derive(Copy, Clone)]
pub struct Tss64 {
    pub reserved0: u32,
    pub rsp0: u64,
    pub rsp1: u64,
    pub rsp2: u64,
    pub reserved1: u64,
    /// IST stack tops; `ist[0]` is IST1 in descriptor terms.
    pub ist: [u64; 7],
    pub reserved2: u64,
    pub reserved3: u16,
    pub iomap_base: u16,
}

impl Tss64 {
    pub const fn new() -> Self {
        Self {
            reserved0: 0,
            rsp0: 0,
            rsp1: 0,
            rsp2: 0,
            reserved1: 0,
            ist: [0; 7],
            reserved2: 0,
            reserved3: 0,
            iomap_base: 0,
        }
    }
}

impl Default for Tss64 {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete in-memory GDT: the standard descriptors plus the TSS slot.
#[repr(C, align(8))]
#[derive(Copy, Clone)]
pub struct GdtLayout {
    pub entries: [GdtEntry; GDT_STANDARD_ENTRIES],
    pub tss: GdtTssEntry,
}

/// Descriptors for the three standard slots, in selector order.
pub const GDT_STANDARD_TABLE: [GdtEntry; GDT_STANDARD_ENTRIES] =
    [GdtEntry::NULL, GdtEntry::KERNEL_CODE, GdtEntry::KERNEL_DATA];

impl GdtLayout {
    pub const fn new() -> Self {
        Self {
            entries: GDT_STANDARD_TABLE,
            tss: GdtTssEntry::zero(),
        }
    }

    /// Point the TSS descriptor at `tss`.
    pub fn load_tss(&mut self, tss: &Tss64) {
        let base = tss as *const Tss64 as u64;
        self.tss = GdtTssEntry::for_tss(base, (core::mem::size_of::<Tss64>() - 1) as u32);
    }
}

impl Default for GdtLayout {
    fn default() -> Self {
        Self::new()
    }
}

/// Packed pointer/limit pair for `lgdt`.
#[repr(C, packed)]
pub struct GdtDescriptor {
    pub limit: u16,
    pub base: u64,
}

impl GdtDescriptor {
    pub fn from_layout(layout: &GdtLayout) -> Self {
        Self {
            limit: (core::mem::size_of::<GdtLayout>() - 1) as u16,
            base: layout as *const GdtLayout as u64,
        }
    }
}

/// A segment selector value as loaded into a segment register.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SegmentSelector(u16);

impl SegmentSelector {
    pub const KERNEL_CODE: Self = Self(0x08);
    pub const KERNEL_DATA: Self = Self(0x10);
    pub const TSS: Self = Self(0x18);

    pub const fn new(index: u16, rpl: u16) -> Self {
        Self((index << 3) | (rpl & 0x3))
    }

    pub const fn bits(self) -> u16 {
        self.0
    }
}

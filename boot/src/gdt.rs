use core::arch::asm;
use core::cell::SyncUnsafeCell;

use cinderos_abi::arch::x86_64::gdt::{GdtDescriptor, GdtLayout, SegmentSelector, Tss64};
use cinderos_lib::klog_debug;

/// IST slot used by every interrupt gate.
///
/// All 256 vectors switch to the same dedicated stack, so a fault taken
/// with a corrupted kernel stack still lands somewhere valid.
pub const INTERRUPT_IST_INDEX: u8 = 1;

static GDT: SyncUnsafeCell<GdtLayout> = SyncUnsafeCell::new(GdtLayout::new());
static TSS: SyncUnsafeCell<Tss64> = SyncUnsafeCell::new(Tss64::new());

#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn load_gdt(descriptor: &GdtDescriptor) {
    unsafe { asm!("lgdt [{0}]", in(reg) descriptor, options(nostack, preserves_flags)) };

    unsafe {
        asm!(
            "pushq ${code}",
            "lea 2f(%rip), %rax",
            "pushq %rax",
            "lretq",
            "2:",
            "movw ${data}, %ax",
            "movw %ax, %ds",
            "movw %ax, %es",
            "movw %ax, %ss",
            "movw %ax, %fs",
            "movw %ax, %gs",
            code = const SegmentSelector::KERNEL_CODE.bits() as usize,
            data = const SegmentSelector::KERNEL_DATA.bits() as usize,
            out("rax") _,
            options(att_syntax, nostack)
        );
    }
}

#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn load_tss() {
    let selector = SegmentSelector::TSS.bits();
    unsafe { asm!("ltr {0:x}", in(reg) selector, options(nostack, preserves_flags)) };
}

pub fn gdt_init() {
    klog_debug!("GDT: Initializing descriptor tables");

    unsafe {
        (*GDT.get()).load_tss(&*TSS.get());
        (*TSS.get()).iomap_base = core::mem::size_of::<Tss64>() as u16;

        let descriptor = GdtDescriptor::from_layout(&*GDT.get());

        load_gdt(&descriptor);
        load_tss();
    }

    klog_debug!("GDT: Initialized with TSS loaded");
}

/// Point an IST slot at a stack top. Index 0 is "no switch" and rejected.
pub fn gdt_set_ist(index: u8, stack_top: u64) {
    if index == 0 || index > 7 {
        klog_debug!("GDT: Invalid IST index {}", index);
        return;
    }
    unsafe {
        (*TSS.get()).ist[(index - 1) as usize] = stack_top;
    }
}

/// Read back an IST slot (diagnostics and tests).
pub fn gdt_ist(index: u8) -> u64 {
    if index == 0 || index > 7 {
        return 0;
    }
    unsafe { (*TSS.get()).ist[(index - 1) as usize] }
}

/// The selector every IDT gate loads into CS.
pub fn kernel_code_selector() -> u16 {
    SegmentSelector::KERNEL_CODE.bits()
}

/// The IST index every IDT gate selects.
pub fn interrupt_ist_index() -> u8 {
    INTERRUPT_IST_INDEX
}

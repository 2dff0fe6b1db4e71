//! Local APIC driver.
//!
//! The interrupt core only needs the LAPIC for end-of-interrupt signalling;
//! this driver additionally handles detection, the software enable bit, and
//! masking the local vector table so nothing fires before the kernel is
//! ready.  Registers are accessed through the boot identity mapping of the
//! 4KB register page reported by `IA32_APIC_BASE`.

use spin::Once;

use cinderos_lib::{InitFlag, cpu, klog_debug, klog_info};

use cinderos_abi::arch::x86_64::Msr;
use cinderos_abi::arch::x86_64::apic::{
    ApicBaseMsr, LAPIC_EOI, LAPIC_ESR, LAPIC_ID, LAPIC_LVT_ERROR, LAPIC_LVT_LINT0,
    LAPIC_LVT_LINT1, LAPIC_LVT_MASKED, LAPIC_LVT_PERFCNT, LAPIC_LVT_TIMER, LAPIC_SPURIOUS,
    LAPIC_SPURIOUS_ENABLE, LAPIC_VERSION,
};
use cinderos_lib::cpu::{CPUID_FEAT_EDX_APIC, CPUID_LEAF_FEATURES};

static APIC_AVAILABLE: InitFlag = InitFlag::new();
static APIC_ENABLED: InitFlag = InitFlag::new();

/// Virtual base of the LAPIC register page.
/// Initialized once during detect() and used for all register access.
static APIC_REGS: Once<u64> = Once::new();

pub fn detect() -> bool {
    klog_debug!("APIC: Detecting Local APIC availability...");

    let (_, _, _, edx) = cpu::cpuid(CPUID_LEAF_FEATURES);
    if edx & CPUID_FEAT_EDX_APIC == 0 {
        klog_debug!("APIC: Local APIC is not available");
        APIC_AVAILABLE.reset();
        return false;
    }

    APIC_AVAILABLE.mark_set();

    let apic_base_msr = cpu::read_msr(Msr::APIC_BASE);
    let apic_phys = apic_base_msr & ApicBaseMsr::ADDR_MASK;

    // The register page sits in the identity-mapped low MMIO window.
    APIC_REGS.call_once(|| apic_phys);

    let bsp_flag = if apic_base_msr & ApicBaseMsr::BSP != 0 {
        " BSP"
    } else {
        ""
    };
    let enable_flag = if apic_base_msr & ApicBaseMsr::GLOBAL_ENABLE != 0 {
        " ENABLED"
    } else {
        ""
    };
    klog_debug!("APIC: Register base: 0x{:x}, MSR flags:{}{}", apic_phys, bsp_flag, enable_flag);
    true
}

pub fn init() -> i32 {
    if !is_available() {
        klog_info!("APIC: Cannot initialize - APIC not available");
        return -1;
    }

    klog_debug!("APIC: Initializing Local APIC");

    let mut apic_base_msr = cpu::read_msr(Msr::APIC_BASE);
    if apic_base_msr & ApicBaseMsr::GLOBAL_ENABLE == 0 {
        apic_base_msr |= ApicBaseMsr::GLOBAL_ENABLE;
        cpu::write_msr(Msr::APIC_BASE, apic_base_msr);
        klog_debug!("APIC: Enabled APIC globally via MSR");
    }

    enable();

    // Nothing may fire until drivers unmask what they own.
    write_register(LAPIC_LVT_TIMER, LAPIC_LVT_MASKED);
    write_register(LAPIC_LVT_LINT0, LAPIC_LVT_MASKED);
    write_register(LAPIC_LVT_LINT1, LAPIC_LVT_MASKED);
    write_register(LAPIC_LVT_ERROR, LAPIC_LVT_MASKED);
    write_register(LAPIC_LVT_PERFCNT, LAPIC_LVT_MASKED);

    write_register(LAPIC_ESR, 0);
    write_register(LAPIC_ESR, 0);

    send_eoi();

    let apic_id = get_id();
    let apic_version = get_version();
    klog_debug!("APIC: ID: 0x{:x}, Version: 0x{:x}", apic_id, apic_version);

    klog_debug!("APIC: Initialization complete");
    0
}

pub fn is_available() -> bool {
    APIC_AVAILABLE.is_set_relaxed()
}

pub fn is_enabled() -> bool {
    APIC_ENABLED.is_set_relaxed()
}

pub fn enable() {
    if !is_available() {
        return;
    }
    let mut spurious = read_register(LAPIC_SPURIOUS);
    spurious |= LAPIC_SPURIOUS_ENABLE;
    spurious |= 0xFF;
    write_register(LAPIC_SPURIOUS, spurious);
    APIC_ENABLED.mark_set();
    klog_debug!("APIC: Local APIC enabled");
}

pub fn send_eoi() {
    if !is_enabled() {
        return;
    }
    write_register(LAPIC_EOI, 0);
}

pub fn get_id() -> u32 {
    if !is_available() {
        return 0;
    }
    read_register(LAPIC_ID) >> 24
}

pub fn get_version() -> u32 {
    if !is_available() {
        return 0;
    }
    read_register(LAPIC_VERSION) & 0xFF
}

pub fn get_base_address() -> u64 {
    APIC_REGS.get().copied().unwrap_or(0)
}

pub fn read_register(reg: u32) -> u32 {
    if !is_available() {
        return 0;
    }
    match APIC_REGS.get() {
        // SAFETY: `detect()` recorded the LAPIC register page; all register
        // offsets used by this driver stay inside that 4KB page.
        Some(base) => unsafe { core::ptr::read_volatile((base + reg as u64) as *const u32) },
        None => 0,
    }
}

pub fn write_register(reg: u32, value: u32) {
    if !is_available() {
        return;
    }
    if let Some(base) = APIC_REGS.get() {
        // SAFETY: See `read_register`.
        unsafe { core::ptr::write_volatile((base + reg as u64) as *mut u32, value) };
    }
}

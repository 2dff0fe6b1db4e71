//! Interrupt frame layout and diagnostic dumps.

use cinderos_abi::arch::x86_64::exception::get_exception_name;

/// The saved interrupt frame as laid down on the interrupt stack.
///
/// Field order is the memory layout at dispatch time, low address first:
/// the seven registers pushed by the common entry, the vector and error
/// code pushed by the trampoline (the error code is a zero placeholder for
/// vectors whose hardware frame has none), and the five words pushed by
/// the CPU on interrupt entry.  The restore path reloads registers from
/// this memory, so handlers may mutate any field and see the change take
/// effect on `iretq`.
#[repr(C)]
pub struct InterruptFrame {
    pub rdi: u64,
    pub rsi: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rbx: u64,
    pub rax: u64,
    pub rbp: u64,
    pub vector: u64,
    pub error_code: u64,
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

/// Log the contents of an interrupt frame at info level.
///
/// Accepts a raw pointer so it can be called from dispatch paths that only
/// hold one; a null pointer is reported rather than dereferenced.
pub fn kdiag_dump_interrupt_frame(frame: *const InterruptFrame) {
    if frame.is_null() {
        crate::klog_info!("KDIAG: No interrupt frame available");
        return;
    }

    // SAFETY: Non-null per the check above; callers pass frames that live on
    // the interrupt stack for the duration of the dispatch.
    let f = unsafe { &*frame };
    let vector = (f.vector & 0xFF) as u8;

    crate::klog_info!("=== INTERRUPT FRAME ===");
    crate::klog_info!(
        "Vector: {} ({})  Error code: 0x{:x}",
        vector,
        get_exception_name(vector),
        f.error_code
    );
    crate::klog_info!(
        "RIP: 0x{:016x}  CS: 0x{:x}  RFLAGS: 0x{:x}",
        f.rip,
        f.cs,
        f.rflags
    );
    crate::klog_info!("RSP: 0x{:016x}  SS: 0x{:x}", f.rsp, f.ss);
    crate::klog_info!(
        "RAX: 0x{:x}  RBX: 0x{:x}  RCX: 0x{:x}  RDX: 0x{:x}",
        f.rax,
        f.rbx,
        f.rcx,
        f.rdx
    );
    crate::klog_info!(
        "RSI: 0x{:x}  RDI: 0x{:x}  RBP: 0x{:x}",
        f.rsi,
        f.rdi,
        f.rbp
    );
}

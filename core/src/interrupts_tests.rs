//! Dispatch framework tests - drive `isr_dispatch` with synthesized frames.
//!
//! The platform seam is pointed at counting recorders so EOI writes and
//! address-space loads are observable without hardware.  Each test uses its
//! own vector: the handler registry is append-only by design, so chains
//! registered here stay in place for the rest of the run.

use core::ffi::c_int;
use core::fmt::Write;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

use cinderos_abi::arch::x86_64::idt::IRQ_BASE_VECTOR;
use cinderos_lib::{
    InterruptFrame, assert_eq_test, assert_test, assert_zero, define_test_suite,
};

use crate::interrupts::{
    IsrHandler, PageFaultCode, handler_count, isr_dispatch, register_handler,
    register_handler_callback,
};
use crate::platform;
use crate::sched::{Process, scheduler_set_current_process};

// ---------------------------------------------------------------------------
// Recorders behind the platform seam
// ---------------------------------------------------------------------------

static EOI_COUNT: AtomicU32 = AtomicU32::new(0);

fn record_eoi() {
    EOI_COUNT.fetch_add(1, Ordering::Relaxed);
}

const LOAD_LOG_CAPACITY: usize = 8;
static LOAD_LOG: [AtomicU64; LOAD_LOG_CAPACITY] =
    [const { AtomicU64::new(0) }; LOAD_LOG_CAPACITY];
static LOAD_LOG_LEN: AtomicUsize = AtomicUsize::new(0);

fn record_load_root(root: u64) {
    let slot = LOAD_LOG_LEN.fetch_add(1, Ordering::Relaxed);
    if slot < LOAD_LOG_CAPACITY {
        LOAD_LOG[slot].store(root, Ordering::Relaxed);
    }
}

fn reset_recorders() {
    platform::register_send_eoi_fn(record_eoi);
    platform::register_load_paging_root_fn(record_load_root);
    EOI_COUNT.store(0, Ordering::Relaxed);
    LOAD_LOG_LEN.store(0, Ordering::Relaxed);
}

fn create_test_frame(vector: u8) -> InterruptFrame {
    InterruptFrame {
        rdi: 0,
        rsi: 0,
        rdx: 0,
        rcx: 0,
        rbx: 0,
        rax: 0,
        rbp: 0,
        vector: vector as u64,
        error_code: 0,
        rip: 0xFFFF_FFFF_8000_0000,
        cs: 0x08,
        rflags: 0x202,
        rsp: 0xFFFF_FFFF_8010_0000,
        ss: 0x10,
    }
}

// ---------------------------------------------------------------------------
// Register and fire
// ---------------------------------------------------------------------------

static FIRE_CALLS: AtomicU32 = AtomicU32::new(0);
static FIRE_SEEN_VECTOR: AtomicU64 = AtomicU64::new(u64::MAX);

fn fire_callback(frame: *mut InterruptFrame) -> bool {
    FIRE_CALLS.fetch_add(1, Ordering::Relaxed);
    FIRE_SEEN_VECTOR.store(unsafe { (*frame).vector }, Ordering::Relaxed);
    true
}

pub fn test_dispatch_register_and_fire() -> c_int {
    reset_recorders();
    register_handler_callback(40, fire_callback);

    let mut frame = create_test_frame(40);
    isr_dispatch(&mut frame);

    assert_eq_test!(
        FIRE_CALLS.load(Ordering::Relaxed),
        1,
        "claiming handler must run exactly once"
    );
    assert_eq_test!(
        FIRE_SEEN_VECTOR.load(Ordering::Relaxed),
        40,
        "handler saw the wrong vector in the frame"
    );
    assert_eq_test!(
        EOI_COUNT.load(Ordering::Relaxed),
        1,
        "claimed dispatch must EOI exactly once"
    );
    0
}

// ---------------------------------------------------------------------------
// Chain short-circuit
// ---------------------------------------------------------------------------

static CHAIN_FIRST: AtomicU32 = AtomicU32::new(0);
static CHAIN_SECOND: AtomicU32 = AtomicU32::new(0);
static CHAIN_THIRD: AtomicU32 = AtomicU32::new(0);

fn chain_first(_frame: *mut InterruptFrame) -> bool {
    CHAIN_FIRST.fetch_add(1, Ordering::Relaxed);
    false
}

fn chain_second(_frame: *mut InterruptFrame) -> bool {
    CHAIN_SECOND.fetch_add(1, Ordering::Relaxed);
    true
}

fn chain_third(_frame: *mut InterruptFrame) -> bool {
    CHAIN_THIRD.fetch_add(1, Ordering::Relaxed);
    true
}

pub fn test_dispatch_chain_short_circuit() -> c_int {
    reset_recorders();
    register_handler_callback(50, chain_first);
    register_handler_callback(50, chain_second);
    register_handler_callback(50, chain_third);

    let mut frame = create_test_frame(50);
    isr_dispatch(&mut frame);

    assert_eq_test!(
        CHAIN_FIRST.load(Ordering::Relaxed),
        1,
        "declining handler before the claim must run"
    );
    assert_eq_test!(
        CHAIN_SECOND.load(Ordering::Relaxed),
        1,
        "claiming handler must run"
    );
    assert_zero!(
        CHAIN_THIRD.load(Ordering::Relaxed),
        "handlers after the claim must not run"
    );
    assert_eq_test!(
        EOI_COUNT.load(Ordering::Relaxed),
        1,
        "short-circuited dispatch must EOI exactly once"
    );
    0
}

// ---------------------------------------------------------------------------
// Address-space swap
// ---------------------------------------------------------------------------

static PROC_TARGET: Process = Process::new(7, 0x0005_1000);
static PROC_CURRENT: Process = Process::new(9, 0x0004_2000);

fn declining_callback(_frame: *mut InterruptFrame) -> bool {
    false
}

pub fn test_dispatch_address_space_swap() -> c_int {
    reset_recorders();
    scheduler_set_current_process(&PROC_CURRENT);
    register_handler(60, IsrHandler::with_process(declining_callback, &PROC_TARGET));

    let mut frame = create_test_frame(60);
    isr_dispatch(&mut frame);

    scheduler_set_current_process(core::ptr::null());

    assert_eq_test!(
        LOAD_LOG_LEN.load(Ordering::Relaxed),
        2,
        "address-space load count"
    );
    assert_eq_test!(
        LOAD_LOG[0].load(Ordering::Relaxed),
        PROC_TARGET.page_table_root,
        "handler process root must load before the callback"
    );
    assert_eq_test!(
        LOAD_LOG[1].load(Ordering::Relaxed),
        PROC_CURRENT.page_table_root,
        "previous root must be restored after a declining callback"
    );
    0
}

pub fn test_dispatch_swap_skipped_without_snapshot() -> c_int {
    reset_recorders();
    scheduler_set_current_process(core::ptr::null());
    register_handler(61, IsrHandler::with_process(declining_callback, &PROC_TARGET));

    let mut frame = create_test_frame(61);
    isr_dispatch(&mut frame);

    // No current process was snapshotted, so only the handler's own root
    // may have been loaded.
    assert_eq_test!(
        LOAD_LOG_LEN.load(Ordering::Relaxed),
        1,
        "null snapshot must not be restored"
    );
    0
}

// ---------------------------------------------------------------------------
// Unhandled vectors
// ---------------------------------------------------------------------------

pub fn test_dispatch_unhandled_still_eoi() -> c_int {
    reset_recorders();

    let mut frame = create_test_frame(70);
    isr_dispatch(&mut frame);

    assert_eq_test!(
        EOI_COUNT.load(Ordering::Relaxed),
        1,
        "unhandled vector must still EOI"
    );
    0
}

pub fn test_dispatch_returns_same_frame() -> c_int {
    reset_recorders();
    register_handler_callback(71, declining_callback);

    let mut frame = create_test_frame(71);
    let frame_ptr = &mut frame as *mut InterruptFrame;
    let resumed = isr_dispatch(frame_ptr);

    assert_test!(
        resumed == frame_ptr,
        "dispatcher must hand back the frame it was given"
    );
    assert_eq_test!(
        frame.rip,
        0xFFFF_FFFF_8000_0000u64,
        "declined dispatch must leave rip untouched"
    );
    0
}

// ---------------------------------------------------------------------------
// Frame mutation
// ---------------------------------------------------------------------------

const REWRITTEN_RIP: u64 = 0xFFFF_FFFF_8042_0000;

fn rip_rewriting_callback(frame: *mut InterruptFrame) -> bool {
    unsafe { (*frame).rip = REWRITTEN_RIP };
    true
}

pub fn test_dispatch_rip_rewrite_visible() -> c_int {
    reset_recorders();
    register_handler_callback(72, rip_rewriting_callback);

    let mut frame = create_test_frame(72);
    isr_dispatch(&mut frame);

    assert_eq_test!(frame.rip, REWRITTEN_RIP, "handler rip rewrite must stick");
    0
}

// ---------------------------------------------------------------------------
// In-callback registration
// ---------------------------------------------------------------------------

static NESTED_REGISTERED: AtomicBool = AtomicBool::new(false);
static NESTED_INNER_CALLS: AtomicU32 = AtomicU32::new(0);

fn nested_inner(_frame: *mut InterruptFrame) -> bool {
    NESTED_INNER_CALLS.fetch_add(1, Ordering::Relaxed);
    true
}

fn nested_outer(_frame: *mut InterruptFrame) -> bool {
    if !NESTED_REGISTERED.swap(true, Ordering::Relaxed) {
        register_handler_callback(73, nested_inner);
    }
    false
}

pub fn test_dispatch_nested_registration_deferred() -> c_int {
    reset_recorders();
    register_handler_callback(73, nested_outer);

    let mut frame = create_test_frame(73);
    isr_dispatch(&mut frame);

    assert_zero!(
        NESTED_INNER_CALLS.load(Ordering::Relaxed),
        "handler registered mid-walk must not join that walk"
    );

    let mut frame = create_test_frame(73);
    isr_dispatch(&mut frame);

    assert_eq_test!(
        NESTED_INNER_CALLS.load(Ordering::Relaxed),
        1,
        "handler registered mid-walk must join later walks"
    );
    0
}

// ---------------------------------------------------------------------------
// Registry bookkeeping
// ---------------------------------------------------------------------------

pub fn test_registry_insertion_order_count() -> c_int {
    assert_zero!(handler_count(74), "untouched vector must have an empty chain");
    register_handler_callback(74, declining_callback);
    register_handler_callback(74, declining_callback);
    assert_eq_test!(
        handler_count(74),
        2,
        "duplicate registrations must both be kept"
    );
    0
}

pub fn test_dispatch_boundary_vectors() -> c_int {
    reset_recorders();
    // Vector 255 is the top of the trampoline bank; IRQ_BASE_VECTOR the
    // first device vector. Both must take the registry path without incident.
    let mut frame = create_test_frame(255);
    isr_dispatch(&mut frame);
    let mut frame = create_test_frame(IRQ_BASE_VECTOR);
    isr_dispatch(&mut frame);

    assert_eq_test!(
        EOI_COUNT.load(Ordering::Relaxed),
        2,
        "boundary vectors must each EOI once"
    );
    0
}

// ---------------------------------------------------------------------------
// Page-fault error code decode
// ---------------------------------------------------------------------------

struct TagBuffer {
    buf: [u8; 80],
    len: usize,
}

impl TagBuffer {
    const fn new() -> Self {
        Self {
            buf: [0; 80],
            len: 0,
        }
    }

    fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

impl Write for TagBuffer {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        if self.len + bytes.len() > self.buf.len() {
            return Err(core::fmt::Error);
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }
}

fn decoded_tags(error_code: u64) -> TagBuffer {
    let mut buffer = TagBuffer::new();
    let code = PageFaultCode::from_bits_truncate(error_code);
    let _ = write!(buffer, "{}", code);
    buffer
}

pub fn test_page_fault_code_decode() -> c_int {
    let tags = decoded_tags(0b11011);
    assert_eq_test!(
        tags.as_str(),
        "Page Protection, Write, Reserved Write, Executed",
        "0b11011 decode"
    );

    let tags = decoded_tags(0);
    assert_eq_test!(tags.as_str(), "Read", "zero error code decode");

    let tags = decoded_tags(0b00010);
    assert_eq_test!(tags.as_str(), "Write", "write-only code decode");

    let tags = decoded_tags(0b00101);
    assert_eq_test!(tags.as_str(), "Page Protection, Read, CPL=3", "user read decode");
    0
}

define_test_suite!(
    interrupts,
    [
        test_dispatch_register_and_fire,
        test_dispatch_chain_short_circuit,
        test_dispatch_address_space_swap,
        test_dispatch_swap_skipped_without_snapshot,
        test_dispatch_unhandled_still_eoi,
        test_dispatch_returns_same_frame,
        test_dispatch_rip_rewrite_visible,
        test_dispatch_nested_registration_deferred,
        test_registry_insertion_order_count,
        test_dispatch_boundary_vectors,
        test_page_fault_code_decode,
    ]
);

//! Exception metadata and frame layout tests.

use core::ffi::c_int;
use core::mem::{offset_of, size_of};

use cinderos_abi::arch::x86_64::exception::{
    exception_has_error_code, exception_is_critical, get_exception_name,
};
use cinderos_lib::{InterruptFrame, assert_eq_test, assert_test, define_test_suite};

pub fn test_exception_names_valid() -> c_int {
    for vector in 0..32u8 {
        let name = get_exception_name(vector);
        assert_test!(!name.is_empty(), "empty exception name for vector {}", vector);
    }
    0
}

pub fn test_critical_exception_classification() -> c_int {
    assert_test!(exception_is_critical(8), "double fault must be critical");
    assert_test!(exception_is_critical(2), "NMI must be critical");
    assert_test!(exception_is_critical(18), "machine check must be critical");

    assert_test!(!exception_is_critical(0), "divide error must not be critical");
    assert_test!(!exception_is_critical(14), "page fault must not be critical");
    0
}

pub fn test_error_code_vector_set() -> c_int {
    // The hardware pushes an error code for exactly these vectors; the
    // trampoline shape selection depends on the set being exact.
    const WITH_ERROR_CODE: [u8; 10] = [8, 10, 11, 12, 13, 14, 17, 21, 29, 30];

    for vector in 0..=255u8 {
        let expected = WITH_ERROR_CODE.contains(&vector);
        assert_test!(
            exception_has_error_code(vector) == expected,
            "error-code predicate wrong for vector {}",
            vector
        );
    }
    0
}

pub fn test_interrupt_frame_layout() -> c_int {
    // The assembly common entry writes this layout; the offsets are part of
    // its contract, not an implementation detail.
    assert_eq_test!(offset_of!(InterruptFrame, rdi), 0, "rdi offset");
    assert_eq_test!(offset_of!(InterruptFrame, rsi), 8, "rsi offset");
    assert_eq_test!(offset_of!(InterruptFrame, rdx), 16, "rdx offset");
    assert_eq_test!(offset_of!(InterruptFrame, rcx), 24, "rcx offset");
    assert_eq_test!(offset_of!(InterruptFrame, rbx), 32, "rbx offset");
    assert_eq_test!(offset_of!(InterruptFrame, rax), 40, "rax offset");
    assert_eq_test!(offset_of!(InterruptFrame, rbp), 48, "rbp offset");
    assert_eq_test!(offset_of!(InterruptFrame, vector), 56, "vector slot offset");
    assert_eq_test!(offset_of!(InterruptFrame, error_code), 64, "error-code slot offset");
    assert_eq_test!(offset_of!(InterruptFrame, rip), 72, "rip offset");
    assert_eq_test!(offset_of!(InterruptFrame, cs), 80, "cs offset");
    assert_eq_test!(offset_of!(InterruptFrame, rflags), 88, "rflags offset");
    assert_eq_test!(offset_of!(InterruptFrame, rsp), 96, "rsp offset");
    assert_eq_test!(offset_of!(InterruptFrame, ss), 104, "ss offset");
    assert_eq_test!(size_of::<InterruptFrame>(), 112, "frame size");
    0
}

define_test_suite!(
    exception,
    [
        test_exception_names_valid,
        test_critical_exception_classification,
        test_error_code_vector_set,
        test_interrupt_frame_layout,
    ]
);

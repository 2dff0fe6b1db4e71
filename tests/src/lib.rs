#![no_std]

use core::ffi::CStr;

use cinderos_lib::ports::QEMU_DEBUG_EXIT;
use cinderos_lib::{cpu, klog_info};

pub use cinderos_lib::testing::{
    HARNESS_MAX_SUITES, TestConfig, TestRunSummary, TestSuiteDesc, TestSuiteResult, Verbosity,
    measure_elapsed_ms,
};

pub mod exception_tests;

pub const TESTS_MAX_SUITES: usize = HARNESS_MAX_SUITES;

static mut REGISTRY: [Option<&'static TestSuiteDesc>; TESTS_MAX_SUITES] = [None; TESTS_MAX_SUITES];
static mut REGISTRY_COUNT: usize = 0;

fn registry_mut() -> *mut [Option<&'static TestSuiteDesc>; TESTS_MAX_SUITES] {
    &raw mut REGISTRY
}

fn registry_count_mut() -> *mut usize {
    &raw mut REGISTRY_COUNT
}

pub fn tests_reset_registry() {
    unsafe {
        (*registry_mut()).iter_mut().for_each(|slot| *slot = None);
        *registry_count_mut() = 0;
    }
}

pub fn tests_register_suite(desc: &'static TestSuiteDesc) -> i32 {
    if desc.run.is_none() {
        return -1;
    }
    unsafe {
        if *registry_count_mut() >= TESTS_MAX_SUITES {
            return -1;
        }
        (*registry_mut())[*registry_count_mut()] = Some(desc);
        *registry_count_mut() += 1;
    }
    0
}

/// Register the suites owned by the crates this one can see.
///
/// The boot crate adds its own suites on top; it sits above this crate in
/// the dependency order.
pub fn tests_register_system_suites() {
    let _ = tests_register_suite(&exception_tests::EXCEPTION_SUITE_DESC);
    #[cfg(feature = "builtin-tests")]
    {
        let _ = tests_register_suite(&cinderos_core::interrupts_tests::INTERRUPTS_SUITE_DESC);
        let _ = tests_register_suite(&cinderos_core::sched_tests::SCHED_SUITE_DESC);
        let _ = tests_register_suite(&cinderos_drivers::apic_tests::APIC_SUITE_DESC);
    }
}

fn suite_name(result: &TestSuiteResult) -> &'static str {
    if result.name.is_null() {
        return "<unnamed>";
    }
    // SAFETY: Suite names come from `define_test_suite!`, which emits
    // NUL-terminated static byte strings.
    unsafe { CStr::from_ptr(result.name) }
        .to_str()
        .unwrap_or("<invalid utf-8>")
}

pub fn tests_run_all(config: *const TestConfig, summary: *mut TestRunSummary) -> i32 {
    if config.is_null() {
        return -1;
    }

    let mut local_summary = TestRunSummary::default();
    let summary = if summary.is_null() {
        &mut local_summary
    } else {
        unsafe {
            *summary = TestRunSummary::default();
            &mut *summary
        }
    };

    let cfg = unsafe { &*config };
    if !cfg.enabled {
        klog_info!("TESTS: Harness disabled");
        return 0;
    }

    klog_info!("TESTS: Starting test suites");

    let mut desc_count = unsafe { *registry_count_mut() };
    if desc_count > TESTS_MAX_SUITES {
        desc_count = TESTS_MAX_SUITES;
    }

    for index in 0..desc_count {
        let Some(desc) = (unsafe { (*registry_mut())[index] }) else {
            continue;
        };
        let Some(run) = desc.run else {
            continue;
        };

        let mut result = TestSuiteResult::default();
        let status = run(core::ptr::null(), &mut result);

        summary.suites[summary.suite_count] = result;
        summary.suite_count += 1;
        summary.add_suite_result(&result);

        if cfg.verbosity != Verbosity::Quiet {
            klog_info!(
                "TESTS: suite {} - {}/{} passed ({} ms){}",
                suite_name(&result),
                result.passed,
                result.total,
                result.elapsed_ms,
                if status == 0 { "" } else { " [FAILED]" }
            );
        }
    }

    klog_info!(
        "TESTS: {} suites, {} tests, {} passed, {} failed",
        summary.suite_count,
        summary.total_tests,
        summary.passed,
        summary.failed
    );

    if summary.all_passed() { 0 } else { -1 }
}

/// Request test harness shutdown via QEMU debug exit port.
///
/// This writes to the isa-debug-exit device to terminate QEMU with an exit
/// code indicating test success (0) or failure (1).  The actual exit code
/// seen by the shell will be `(value << 1) | 1`.  If no such device exists
/// the machine simply halts.
pub fn tests_request_shutdown(failed_tests: i32) -> ! {
    klog_info!("TESTS: Requesting shutdown (failed={})", failed_tests);
    let exit_value: u8 = if failed_tests == 0 { 0 } else { 1 };
    unsafe { QEMU_DEBUG_EXIT.write(exit_value) };
    cpu::halt_loop();
}

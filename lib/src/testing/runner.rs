//! Execution of a single named test function.

use core::ffi::c_int;

use super::TestResult;
use crate::{klog_debug, klog_info};

/// Run one `c_int`-returning test function and translate its status.
///
/// A zero return is a pass, anything else a fail; failures are logged with
/// the test's name so a summary line is enough to locate the culprit.
pub fn run_single_test(name: &str, test: impl FnOnce() -> c_int) -> TestResult {
    klog_debug!("TEST: running {}", name);

    let status = test();
    if status == 0 {
        TestResult::Pass
    } else {
        klog_info!("TEST: {} FAILED (status {})", name, status);
        TestResult::Fail
    }
}

//! COM1 serial console.
//!
//! Early boot logs go straight to COM1 through the klog fallback; once this
//! driver initialises it registers itself as the klog backend, adding the
//! lock that keeps log lines from interleaving when interrupt-context code
//! logs over normal-context code.  The UART itself is left as firmware
//! configured it.

use core::fmt;

use cinderos_lib::ports::{COM1, serial_write_bytes};
use cinderos_lib::{IrqMutex, klog_debug, klog_register_backend};

static PORT_LOCK: IrqMutex<()> = IrqMutex::new(());

struct SerialWriter;

impl fmt::Write for SerialWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // SAFETY: COM1 is a firmware-initialised 16550; the backend holds
        // PORT_LOCK for the whole line.
        unsafe { serial_write_bytes(COM1, s.as_bytes()) };
        Ok(())
    }
}

/// klog backend: one lock acquisition per line, trailing newline included.
fn serial_backend(args: fmt::Arguments<'_>) {
    let _guard = PORT_LOCK.lock();
    let _ = fmt::write(&mut SerialWriter, args);
    // SAFETY: See `SerialWriter::write_str`.
    unsafe { serial_write_bytes(COM1, b"\n") };
}

pub fn init() {
    klog_register_backend(serial_backend);
    klog_debug!("SERIAL: COM1 console backend registered");
}

use crate::io::Port;

pub const COM1: Port<u8> = Port::new(0x3F8);
pub const COM2: Port<u8> = Port::new(0x2F8);

pub const QEMU_DEBUG_EXIT: Port<u8> = Port::new(0xF4);
pub const BOCHS_DEBUG: Port<u8> = Port::new(0xE9);

pub const IO_DELAY: Port<u8> = Port::new(0x80);

pub const UART_REG_THR: u16 = 0;
pub const UART_REG_LSR: u16 = 5;

pub const UART_LSR_TX_EMPTY: u8 = 0x20;

// ---------------------------------------------------------------------------
// Low-level serial I/O primitives
// ---------------------------------------------------------------------------
//
// These are the **single source of truth** for putting bytes on a UART.
// Every path that writes to a serial port — early-boot klog and any later
// serial backend — must funnel through here.
//
// The functions are intentionally lock-free: callers are responsible for
// serialisation (cli/sti, IrqMutex, … whatever suits the context).

/// Write one byte to a UART, polling the Line Status Register until the
/// transmit holding register is empty.
///
/// # Safety
///
/// Port I/O.  Caller must ensure `base` refers to a valid, initialised
/// 8250/16550-compatible UART and that concurrent access is serialised.
#[inline(always)]
pub unsafe fn serial_putc(base: Port<u8>, byte: u8) {
    let lsr = base.offset(UART_REG_LSR);
    let thr = base.offset(UART_REG_THR);
    unsafe {
        while (lsr.read() & UART_LSR_TX_EMPTY) == 0 {
            core::hint::spin_loop();
        }
        thr.write(byte);
    }
}

/// Write a byte slice to a UART, converting lone `\n` into `\r\n`.
///
/// # Safety
///
/// Same requirements as [`serial_putc`].
#[inline]
pub unsafe fn serial_write_bytes(base: Port<u8>, bytes: &[u8]) {
    for &b in bytes {
        if b == b'\n' {
            unsafe { serial_putc(base, b'\r') };
        }
        unsafe { serial_putc(base, b) };
    }
}

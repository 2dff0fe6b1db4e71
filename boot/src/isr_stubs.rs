//! Trampoline bank and common entry procedures.
//!
//! Every one of the 256 vectors gets its own naked stub so the vector
//! number can be a build-time immediate instead of a table lookup on the
//! hot path.  The stubs normalize the CPU-pushed frame to one shape: for
//! vectors without a hardware error code a zero placeholder is pushed, so
//! the dispatcher always finds `vector` and `error_code` at the same
//! offsets.  Both shapes then jump to a common entry that saves the
//! general-purpose registers, hands the frame to the dispatcher, and
//! restores from whatever frame pointer the dispatcher returns.
//!
//! Interrupts are disabled by the first instruction of every stub and stay
//! disabled until `iretq` reloads RFLAGS.

use core::arch::naked_asm;

use cinderos_abi::arch::x86_64::idt::IDT_ENTRIES;

/// A trampoline entry point as installed into an IDT gate.
pub type IsrStub = unsafe extern "C" fn();

macro_rules! isr_stub {
    ($vector:literal) => {
        paste::paste! {
            #[unsafe(naked)]
            pub unsafe extern "C" fn [<isr_stub_ $vector>]() {
                naked_asm!(
                    "cli",
                    "push 0",
                    concat!("push ", stringify!($vector)),
                    "jmp {entry}",
                    entry = sym isr_common,
                );
            }
        }
    };
}

macro_rules! isr_err_stub {
    ($vector:literal) => {
        paste::paste! {
            #[unsafe(naked)]
            pub unsafe extern "C" fn [<isr_stub_ $vector>]() {
                naked_asm!(
                    "cli",
                    concat!("push ", stringify!($vector)),
                    "jmp {entry}",
                    entry = sym isr_common_error,
                );
            }
        }
    };
}

macro_rules! isr_stub_bank {
    (plain: [$($plain:literal),* $(,)?], error: [$($error:literal),* $(,)?]) => {
        $( isr_stub!($plain); )*
        $( isr_err_stub!($error); )*
    };
}

// The error list is exactly the set of vectors whose hardware frame carries
// an error code; everything else gets the zero placeholder.
isr_stub_bank!(
    plain: [
        0, 1, 2, 3, 4, 5, 6, 7, 9, 15, 16, 18, 19, 20, 22, 23,
        24, 25, 26, 27, 28, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41,
        42, 43, 44, 45, 46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57,
        58, 59, 60, 61, 62, 63, 64, 65, 66, 67, 68, 69, 70, 71, 72, 73,
        74, 75, 76, 77, 78, 79, 80, 81, 82, 83, 84, 85, 86, 87, 88, 89,
        90, 91, 92, 93, 94, 95, 96, 97, 98, 99, 100, 101, 102, 103, 104, 105,
        106, 107, 108, 109, 110, 111, 112, 113, 114, 115, 116, 117, 118, 119, 120, 121,
        122, 123, 124, 125, 126, 127, 128, 129, 130, 131, 132, 133, 134, 135, 136, 137,
        138, 139, 140, 141, 142, 143, 144, 145, 146, 147, 148, 149, 150, 151, 152, 153,
        154, 155, 156, 157, 158, 159, 160, 161, 162, 163, 164, 165, 166, 167, 168, 169,
        170, 171, 172, 173, 174, 175, 176, 177, 178, 179, 180, 181, 182, 183, 184, 185,
        186, 187, 188, 189, 190, 191, 192, 193, 194, 195, 196, 197, 198, 199, 200, 201,
        202, 203, 204, 205, 206, 207, 208, 209, 210, 211, 212, 213, 214, 215, 216, 217,
        218, 219, 220, 221, 222, 223, 224, 225, 226, 227, 228, 229, 230, 231, 232, 233,
        234, 235, 236, 237, 238, 239, 240, 241, 242, 243, 244, 245, 246, 247, 248, 249,
        250, 251, 252, 253, 254, 255,
    ],
    error: [
        8, 10, 11, 12, 13, 14, 17, 21, 29, 30,
    ]
);

// ---------------------------------------------------------------------------
// Common entries
// ---------------------------------------------------------------------------
//
// Push order puts `rdi` at the lowest address so the stack pointer is a
// valid `InterruptFrame` pointer when it lands in the first argument
// register.  The dispatcher returns the frame to resume from in `rax`;
// loading it into `rsp` before the pops makes the restore sequence
// independent of the frame's location, which is what allows a dispatcher
// to switch tasks by returning a different frame.
//
// The final 16-byte adjustment discards the vector and error-code slots.
// It is the same in both variants: `iretq` never pops an error code, so a
// CPU-pushed error code must be dropped here exactly like a synthesized
// zero.

#[unsafe(naked)]
pub unsafe extern "C" fn isr_common() {
    naked_asm!(
        "push rbp",
        "push rax",
        "push rbx",
        "push rcx",
        "push rdx",
        "push rsi",
        "push rdi",
        "mov rdi, rsp",
        "call {dispatch}",
        "mov rsp, rax",
        "pop rdi",
        "pop rsi",
        "pop rdx",
        "pop rcx",
        "pop rbx",
        "pop rax",
        "pop rbp",
        "add rsp, 16",
        "iretq",
        dispatch = sym cinderos_core::interrupts::isr_dispatch,
    );
}

#[unsafe(naked)]
pub unsafe extern "C" fn isr_common_error() {
    naked_asm!(
        "push rbp",
        "push rax",
        "push rbx",
        "push rcx",
        "push rdx",
        "push rsi",
        "push rdi",
        "mov rdi, rsp",
        "call {dispatch}",
        "mov rsp, rax",
        "pop rdi",
        "pop rsi",
        "pop rdx",
        "pop rcx",
        "pop rbx",
        "pop rax",
        "pop rbp",
        "add rsp, 16",
        "iretq",
        dispatch = sym cinderos_core::interrupts::isr_dispatch,
    );
}

// ---------------------------------------------------------------------------
// Stub table
// ---------------------------------------------------------------------------

macro_rules! isr_stub_table {
    ($($vector:literal),* $(,)?) => {
        paste::paste! {
            /// All 256 trampolines in vector order; `ISR_STUBS[v]` is the
            /// entry point the IDT gate for vector `v` must target.
            pub static ISR_STUBS: [IsrStub; IDT_ENTRIES] = [
                $( [<isr_stub_ $vector>] as IsrStub, )*
            ];
        }
    };
}

isr_stub_table!(
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
    16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31,
    32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47,
    48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63,
    64, 65, 66, 67, 68, 69, 70, 71, 72, 73, 74, 75, 76, 77, 78, 79,
    80, 81, 82, 83, 84, 85, 86, 87, 88, 89, 90, 91, 92, 93, 94, 95,
    96, 97, 98, 99, 100, 101, 102, 103, 104, 105, 106, 107, 108, 109, 110, 111,
    112, 113, 114, 115, 116, 117, 118, 119, 120, 121, 122, 123, 124, 125, 126, 127,
    128, 129, 130, 131, 132, 133, 134, 135, 136, 137, 138, 139, 140, 141, 142, 143,
    144, 145, 146, 147, 148, 149, 150, 151, 152, 153, 154, 155, 156, 157, 158, 159,
    160, 161, 162, 163, 164, 165, 166, 167, 168, 169, 170, 171, 172, 173, 174, 175,
    176, 177, 178, 179, 180, 181, 182, 183, 184, 185, 186, 187, 188, 189, 190, 191,
    192, 193, 194, 195, 196, 197, 198, 199, 200, 201, 202, 203, 204, 205, 206, 207,
    208, 209, 210, 211, 212, 213, 214, 215, 216, 217, 218, 219, 220, 221, 222, 223,
    224, 225, 226, 227, 228, 229, 230, 231, 232, 233, 234, 235, 236, 237, 238, 239,
    240, 241, 242, 243, 244, 245, 246, 247, 248, 249, 250, 251, 252, 253, 254, 255,
);

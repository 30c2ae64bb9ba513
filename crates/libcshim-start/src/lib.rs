//! # libcshim-start
//!
//! The archive a launcher links in place of the crt reference to
//! `__libc_start_main`. It carries no Rust std, so the only dynamic symbols
//! it adds to the launcher are the baseline-pinned `dlsym`/`dlvsym` and the
//! libc calls the startup path makes.
//!
//! Link with the arguments `libcshim-harness link-args` prints.

#![no_std]

pub use libcshim_abi::startup_abi::__dynamic_libc_start_main;

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo<'_>) -> ! {
    // SAFETY: abort has no preconditions and does not return.
    unsafe { libc::abort() }
}

// Unwind tables in the precompiled `core` still name the personality routine.
// Under `panic = "abort"` it is never called.
#[unsafe(no_mangle)]
pub extern "C" fn rust_eh_personality() {}

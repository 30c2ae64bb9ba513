//! Minimal launcher whose crt `_start` is routed through
//! `__dynamic_libc_start_main` by the link arguments in `build.rs`.
//!
//! Prints the shim entry address and whether its `.init_array` constructor
//! ran before `main`, then exits with status 37.

use std::sync::atomic::{AtomicBool, Ordering};

use libcshim_abi::startup_abi::shim_entry;

/// Status the launcher exits with once `main` is reached.
const LAUNCHER_STATUS: i32 = 37;

static CTOR_RAN: AtomicBool = AtomicBool::new(false);

extern "C" fn mark_ctor() {
    CTOR_RAN.store(true, Ordering::SeqCst);
}

#[used]
#[unsafe(link_section = ".init_array")]
static MARK_CTOR: extern "C" fn() = mark_ctor;

fn main() {
    println!("shim_entry={:#x}", shim_entry().get());
    println!("ctor_before_main={}", CTOR_RAN.load(Ordering::SeqCst));
    std::process::exit(LAUNCHER_STATUS);
}

// The extern "C" entry receives raw loader pointers it cannot validate; per-function
// safety docs would restate the startup ABI contract on every item.
#![allow(clippy::missing_safety_doc)]
#![cfg_attr(not(test), no_std)]
//! # libcshim-abi
//!
//! extern "C" boundary of the dynamic libc-start shim.
//!
//! Exports `__dynamic_libc_start_main`, which a prelinked launcher calls in
//! place of `__libc_start_main`. The entry plans the startup with
//! `libcshim-core` and forwards to the real start routine. The crate is
//! `no_std`; `libcshim-start` wraps it into the archive launchers link.
//!
//! # Architecture
//!
//! ```text
//! crt1 _start -> __dynamic_libc_start_main (this crate)
//!             -> plan_startup(HostResolver, shim_entry())
//!                  dlvsym("GLIBC_2.34") | dlvsym(baseline) | dlsym, never the shim itself
//!             -> real __libc_start_main(main, argc, argv, init', fini, rtld_fini, stack_end)
//! ```
//!
//! On a legacy glibc `init'` is [`init_array::csu_init_fallback`]; on a modern
//! one it is the caller's `init`, untouched.

pub mod dlfcn_abi;
pub mod init_array;
pub mod startup_abi;
pub mod startup_helpers;
pub mod util;

pub use dlfcn_abi::HostResolver;
pub use startup_abi::{InitArrayFn, StartArgs, StartMainFn};

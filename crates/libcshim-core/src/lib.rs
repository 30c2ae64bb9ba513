//! # libcshim-core
//!
//! Pure decision logic for the dynamic libc-start shim.
//!
//! A prelinked launcher calls `__dynamic_libc_start_main` where its crt
//! objects would have called `__libc_start_main`. Before handing control to
//! the real startup routine the shim has to know which glibc generation it
//! is running on:
//!
//! ```text
//! loader stub -> shim entry (abi crate) -> plan_startup (this crate) -> real __libc_start_main
//! ```
//!
//! Nothing here touches raw pointers. Symbol lookup is abstracted behind
//! [`dlfcn::SymbolResolver`] so every branch of the decision can be driven by
//! a fake resolver in tests.
//!
//! The crate is `no_std` and never allocates: the shim links it into
//! launchers that carry no Rust runtime.

#![cfg_attr(not(test), no_std)]

pub mod dlfcn;
pub mod error;
pub mod startup;

pub use dlfcn::{SymbolAddr, SymbolResolver};
pub use error::{StartupError, VersionParseError};
pub use startup::{
    GlibcVersion, InitStrategy, LibcGeneration, StartupConfig, StartupPlan, classify, plan_startup,
};

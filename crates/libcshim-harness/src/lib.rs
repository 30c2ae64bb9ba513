//! Tooling around the dynamic libc-start shim.
//!
//! This crate provides:
//! - Host probe: run the shim's classification against the running glibc
//!   and cross-check it with `gnu_get_libc_version()`.
//! - Link arguments: the flags that route a launcher's crt reference to
//!   `__libc_start_main` into the shim.
//! - Structured logs: the JSONL schema the shim's startup trace follows,
//!   with an emitter and a validator.

#![forbid(unsafe_code)]

pub mod error;
pub mod link_args;
pub mod probe;
pub mod structured_log;

pub use error::HarnessError;
pub use probe::{ProbeReport, probe, probe_host};

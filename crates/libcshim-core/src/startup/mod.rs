//! Startup planning for the dynamic libc-start shim.
//!
//! - [`classify`]: decide the glibc generation from a versioned-symbol probe.
//! - [`plan_startup`]: resolve the real start routine and pick an init strategy.
//! - [`version`]: the glibc version model behind the 2.34 cutover.
//! - [`config`]: environment knobs read from the loader-supplied `envp`.
//! - [`trace`]: allocation-free JSONL record for the startup decision.

pub mod classify;
pub mod config;
pub mod trace;
pub mod version;

pub use classify::{InitStrategy, LibcGeneration, StartupPlan, classify, plan_startup};
pub use config::StartupConfig;
pub use version::GlibcVersion;

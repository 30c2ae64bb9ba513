//! Error types for startup planning and version parsing.

use thiserror::Error;

/// Failure to build a startup plan.
///
/// At the ABI boundary every variant is fatal: there is no C runtime yet to
/// report through, so the shim aborts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    #[error("real startup routine `{symbol}` could not be resolved")]
    StartMainUnresolved { symbol: &'static str },
    #[error("startup routine `{symbol}` resolved to implausible address {addr:#x}")]
    ImplausibleAddress { symbol: &'static str, addr: usize },
    /// The lookup found the launcher's own alias of the shim entry. Jumping
    /// there would re-enter the shim until the stack runs out.
    #[error("startup routine `{symbol}` resolved to the shim entry itself at {addr:#x}")]
    ResolvedToShim { symbol: &'static str, addr: usize },
}

/// Failure to parse a glibc version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("empty glibc version string")]
    Empty,
    #[error("glibc version is missing a minor component")]
    MissingMinor,
    #[error("glibc version component {index} is not numeric")]
    NotNumeric { index: usize },
}

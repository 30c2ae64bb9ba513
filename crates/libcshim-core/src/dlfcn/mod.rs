//! Dynamic symbol lookup: names, versions and the resolver seam.
//!
//! The actual `dlsym`/`dlvsym` calls live in the ABI crate. This module only
//! names what the shim looks up and defines the trait the decision logic is
//! written against.

use core::ffi::CStr;
use core::num::NonZeroUsize;

/// The C runtime's program-initialization entry point.
pub const START_MAIN_SYMBOL: &CStr = c"__libc_start_main";

/// Symbol version at which glibc started walking `.init_array` itself.
pub const INIT_ARRAY_ABI_VERSION: &CStr = c"GLIBC_2.34";

/// The first glibc symbol version of the target architecture.
///
/// `__libc_start_main`, `dlsym` and `dlvsym` all exist at this version on
/// every glibc, including 2.34 and later where it is kept as a compat
/// version.
#[cfg(target_arch = "x86_64")]
pub const BASELINE_VERSION: Option<&CStr> = Some(c"GLIBC_2.2.5");
#[cfg(target_arch = "aarch64")]
pub const BASELINE_VERSION: Option<&CStr> = Some(c"GLIBC_2.17");
#[cfg(target_arch = "x86")]
pub const BASELINE_VERSION: Option<&CStr> = Some(c"GLIBC_2.0");
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "x86")))]
pub const BASELINE_VERSION: Option<&CStr> = None;

/// Name the shim exports in place of `__libc_start_main`.
pub const SHIM_ENTRY_SYMBOL: &str = "__dynamic_libc_start_main";

/// Address of a resolved symbol. Never null.
pub type SymbolAddr = NonZeroUsize;

/// Looks up symbols in the process-wide default search scope.
///
/// Implementations must be callable before libc has finished initializing:
/// no allocation, no locking beyond what the dynamic loader itself does.
pub trait SymbolResolver {
    /// Resolve `name` at its default version.
    fn resolve(&self, name: &CStr) -> Option<SymbolAddr>;

    /// Resolve `name` at exactly `version` (e.g. `GLIBC_2.34`).
    ///
    /// Unversioned definitions never match. The launcher's own
    /// `__libc_start_main` alias is unversioned, so a versioned lookup always
    /// lands in libc.
    fn resolve_versioned(&self, name: &CStr, version: &CStr) -> Option<SymbolAddr>;
}

impl<R: SymbolResolver + ?Sized> SymbolResolver for &R {
    fn resolve(&self, name: &CStr) -> Option<SymbolAddr> {
        (**self).resolve(name)
    }

    fn resolve_versioned(&self, name: &CStr, version: &CStr) -> Option<SymbolAddr> {
        (**self).resolve_versioned(name, version)
    }
}

/// Returns `true` if `addr` is a plausible code address for a resolved symbol.
///
/// The resolver contract already excludes null; this additionally rejects the
/// `RTLD_NEXT` pseudo-handle value, which some shims leak back as an address.
#[inline]
pub fn is_plausible_addr(addr: usize) -> bool {
    addr != 0 && addr != usize::MAX
}

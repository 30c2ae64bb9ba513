//! Host dynamic-loader adapter.
//!
//! Implements [`SymbolResolver`] over `dlsym(RTLD_DEFAULT, ..)` and
//! `dlvsym(RTLD_DEFAULT, .., ..)`. Both are usable before libc has run its
//! own initialization: the dynamic loader has already relocated libc by the
//! time `_start` calls the shim.

use core::ffi::{CStr, c_char, c_void};
use core::num::NonZeroUsize;

use libcshim_core::dlfcn::{SymbolAddr, SymbolResolver};
use libcshim_core::{GlibcVersion, VersionParseError};

unsafe extern "C" {
    fn dlsym(handle: *mut c_void, symbol: *const c_char) -> *mut c_void;
    fn dlvsym(handle: *mut c_void, symbol: *const c_char, version: *const c_char) -> *mut c_void;
    fn gnu_get_libc_version() -> *const c_char;
}

// Bind the references to the architecture's first glibc version so a launcher
// built on glibc 2.34+ does not depend on `dlsym@GLIBC_2.34`. `.symver` only
// rewrites references in this object file, hence the local declarations above
// and `codegen-units = 1` for this crate.
#[cfg(all(target_arch = "x86_64", target_env = "gnu"))]
core::arch::global_asm!(
    ".symver dlsym,dlsym@GLIBC_2.2.5",
    ".symver dlvsym,dlvsym@GLIBC_2.2.5",
);
#[cfg(all(target_arch = "aarch64", target_env = "gnu"))]
core::arch::global_asm!(
    ".symver dlsym,dlsym@GLIBC_2.17",
    ".symver dlvsym,dlvsym@GLIBC_2.17",
);

/// Resolver over the process-wide default search scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostResolver;

impl SymbolResolver for HostResolver {
    // Not inlined: a copy in a downstream object would reference the
    // unpinned default `dlsym`.
    #[inline(never)]
    fn resolve(&self, name: &CStr) -> Option<SymbolAddr> {
        // SAFETY: `name` is NUL-terminated; RTLD_DEFAULT is a valid pseudo-handle.
        let sym = unsafe { dlsym(libc::RTLD_DEFAULT, name.as_ptr()) };
        NonZeroUsize::new(sym as usize)
    }

    #[inline(never)]
    fn resolve_versioned(&self, name: &CStr, version: &CStr) -> Option<SymbolAddr> {
        // SAFETY: both strings are NUL-terminated; RTLD_DEFAULT is a valid pseudo-handle.
        let sym = unsafe { dlvsym(libc::RTLD_DEFAULT, name.as_ptr(), version.as_ptr()) };
        NonZeroUsize::new(sym as usize)
    }
}

/// Runtime glibc version as reported by `gnu_get_libc_version()`.
pub fn host_glibc_version() -> Result<GlibcVersion, VersionParseError> {
    // SAFETY: glibc returns a pointer to a static NUL-terminated string.
    let raw = unsafe { gnu_get_libc_version() };
    if raw.is_null() {
        return Err(VersionParseError::Empty);
    }
    // SAFETY: non-null static string, see above.
    let text = unsafe { CStr::from_ptr(raw) };
    GlibcVersion::parse(text.to_str().unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use libcshim_core::dlfcn::{BASELINE_VERSION, INIT_ARRAY_ABI_VERSION, START_MAIN_SYMBOL};
    use libcshim_core::{InitStrategy, classify};

    #[test]
    fn host_resolves_start_main() {
        assert!(HostResolver.resolve(START_MAIN_SYMBOL).is_some());
    }

    #[test]
    fn baseline_version_resolves_on_every_glibc() {
        if let Some(baseline) = BASELINE_VERSION {
            assert!(
                HostResolver
                    .resolve_versioned(START_MAIN_SYMBOL, baseline)
                    .is_some()
            );
            assert!(HostResolver.resolve_versioned(c"dlsym", baseline).is_some());
        }
    }

    #[test]
    fn unknown_symbol_is_none() {
        assert!(HostResolver.resolve(c"__libcshim_no_such_symbol").is_none());
        assert!(
            HostResolver
                .resolve_versioned(START_MAIN_SYMBOL, c"GLIBC_0.0")
                .is_none()
        );
    }

    #[test]
    fn init_array_abi_agrees_with_runtime_version() {
        let version = host_glibc_version().unwrap();
        let found = HostResolver
            .resolve_versioned(START_MAIN_SYMBOL, INIT_ARRAY_ABI_VERSION)
            .is_some();
        assert_eq!(found, version.walks_init_array_internally());
        assert_eq!(
            classify(&HostResolver).init_strategy() == InitStrategy::PassThrough,
            found
        );
    }
}

//! Linker arguments that splice the shim into a prelinked launcher.
//!
//! crt1's `_start` calls `__libc_start_main`. Defining that name as an alias
//! of `__dynamic_libc_start_main` at link time makes `_start` call the shim.
//! The linker exports the alias, because it overrides a libc definition, so
//! the shim resolves glibc's routine by symbol version, which the unversioned
//! alias cannot satisfy.
//!
//! `-ldl` is kept as a needed library even under `--as-needed`: on glibc
//! before 2.34 `dlvsym` lives in `libdl.so.2`, not in libc.

use std::path::Path;

use libcshim_core::dlfcn::{START_MAIN_SYMBOL, SHIM_ENTRY_SYMBOL};

use crate::error::HarnessError;

/// Which driver will receive the arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFlavor {
    /// A compiler driver (`cc`, `gcc`, `clang`): linker flags need `-Wl,`.
    Cc,
    /// The linker itself (`ld`, `ld.lld`).
    Ld,
}

impl LinkFlavor {
    pub fn parse(raw: &str) -> Result<Self, HarnessError> {
        match raw.to_ascii_lowercase().as_str() {
            "cc" | "gcc" | "clang" => Ok(Self::Cc),
            "ld" | "lld" | "ld.lld" => Ok(Self::Ld),
            _ => Err(HarnessError::UnknownFlavor(raw.to_string())),
        }
    }

    fn wrap(self, flag: String) -> String {
        match self {
            Self::Cc => format!("-Wl,{flag}"),
            Self::Ld => flag,
        }
    }

    fn wrap_all(self, flags: &[&str]) -> Vec<String> {
        match self {
            Self::Cc => vec![format!("-Wl,{}", flags.join(","))],
            Self::Ld => flags.iter().map(|flag| flag.to_string()).collect(),
        }
    }
}

/// Arguments to append to the launcher's link line.
#[must_use]
pub fn link_args(flavor: LinkFlavor, staticlib: Option<&Path>) -> Vec<String> {
    let start_main = START_MAIN_SYMBOL.to_string_lossy();
    let mut args = vec![
        flavor.wrap(format!("--undefined={SHIM_ENTRY_SYMBOL}")),
        flavor.wrap(format!("--defsym={start_main}={SHIM_ENTRY_SYMBOL}")),
    ];
    if let Some(lib) = staticlib {
        args.push(lib.display().to_string());
    }
    args.extend(flavor.wrap_all(&["--push-state", "--no-as-needed"]));
    args.push("-ldl".to_string());
    args.extend(flavor.wrap_all(&["--pop-state"]));
    args
}

//! Old-vs-new glibc classification and the once-per-process startup plan.
//!
//! glibc 2.34 moved the `.init_array` walk from the caller-supplied `init`
//! callback (historically `__libc_csu_init`, linked into every program) into
//! `__libc_start_main` itself. A launcher prelinked against an older glibc
//! therefore has to supply its own walker when it runs on an old libc and
//! must leave `init` alone on a new one. The only runtime signal is whether
//! `__libc_start_main@GLIBC_2.34` exists.

use crate::dlfcn::{
    BASELINE_VERSION, INIT_ARRAY_ABI_VERSION, START_MAIN_SYMBOL, SymbolAddr, SymbolResolver,
    is_plausible_addr,
};
use crate::error::StartupError;

/// Which side of the 2.34 init-array ABI change the running glibc is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibcGeneration {
    /// glibc < 2.34: the caller's `init` must walk `.init_array`.
    Legacy,
    /// glibc >= 2.34: `__libc_start_main` walks `.init_array` itself.
    Modern,
}

impl LibcGeneration {
    /// Generation implied by the outcome of the `GLIBC_2.34` lookup.
    #[must_use]
    pub const fn from_init_array_lookup(found: bool) -> Self {
        if found { Self::Modern } else { Self::Legacy }
    }

    /// The init strategy this generation requires.
    #[must_use]
    pub const fn init_strategy(self) -> InitStrategy {
        match self {
            Self::Legacy => InitStrategy::Fallback,
            Self::Modern => InitStrategy::PassThrough,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Modern => "modern",
        }
    }
}

/// What to hand the real start routine as its `init` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitStrategy {
    /// Forward the caller-supplied `init` unchanged.
    PassThrough,
    /// Substitute the shim's embedded init-array walker.
    Fallback,
}

impl InitStrategy {
    /// Pick the `init` value to forward.
    ///
    /// Generic so the same selection drives both the real function pointers
    /// and test doubles.
    #[inline]
    #[must_use]
    pub fn select<T>(self, caller: T, fallback: T) -> T {
        match self {
            Self::PassThrough => caller,
            Self::Fallback => fallback,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PassThrough => "pass_through",
            Self::Fallback => "fallback",
        }
    }
}

/// Classify the running glibc by probing `__libc_start_main@GLIBC_2.34`.
///
/// Pure with respect to the resolver: the same resolver always yields the
/// same generation.
#[must_use]
pub fn classify<R: SymbolResolver + ?Sized>(resolver: &R) -> LibcGeneration {
    LibcGeneration::from_init_array_lookup(lookup_init_array_abi(resolver).is_some())
}

fn lookup_init_array_abi<R: SymbolResolver + ?Sized>(resolver: &R) -> Option<SymbolAddr> {
    resolver.resolve_versioned(START_MAIN_SYMBOL, INIT_ARRAY_ABI_VERSION)
}

/// Everything the shim needs to forward control: where to jump and which
/// `init` to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupPlan {
    pub start_main: SymbolAddr,
    pub generation: LibcGeneration,
    pub strategy: InitStrategy,
}

/// Resolve the real start routine and classify the libc, once.
///
/// The routine is looked up by explicit version: `GLIBC_2.34` when the lookup
/// finds it, else the architecture's [`BASELINE_VERSION`]. Only if both miss
/// is the default-version lookup consulted. A launcher linked with
/// `--defsym=__libc_start_main=__dynamic_libc_start_main` exports that alias
/// unversioned, and only the default lookup can see it.
///
/// `shim_entry` is the address of the shim's own entry point. A resolution
/// equal to it is rejected.
pub fn plan_startup<R: SymbolResolver + ?Sized>(
    resolver: &R,
    shim_entry: SymbolAddr,
) -> Result<StartupPlan, StartupError> {
    let symbol = START_MAIN_SYMBOL.to_str().unwrap_or("__libc_start_main");
    let modern = lookup_init_array_abi(resolver);
    let generation = LibcGeneration::from_init_array_lookup(modern.is_some());

    let start_main = modern
        .or_else(|| {
            BASELINE_VERSION
                .and_then(|version| resolver.resolve_versioned(START_MAIN_SYMBOL, version))
        })
        .or_else(|| resolver.resolve(START_MAIN_SYMBOL))
        .ok_or(StartupError::StartMainUnresolved { symbol })?;
    let addr = start_main.get();
    if !is_plausible_addr(addr) {
        return Err(StartupError::ImplausibleAddress { symbol, addr });
    }
    if start_main == shim_entry {
        return Err(StartupError::ResolvedToShim { symbol, addr });
    }

    Ok(StartupPlan {
        start_main,
        generation,
        strategy: generation.init_strategy(),
    })
}

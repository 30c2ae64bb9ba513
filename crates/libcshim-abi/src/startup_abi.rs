//! Dynamic `__libc_start_main` interposition.
//!
//! `__dynamic_libc_start_main` has exactly the signature of glibc's
//! `__libc_start_main`, so relinking a launcher's crt reference to it is an
//! ABI-identical substitution. It runs once, before `main` and before libc
//! has initialized, on the only thread of the process.

use core::ffi::{c_char, c_int, c_void};

use libcshim_core::{StartupError, SymbolAddr, SymbolResolver, plan_startup};

use crate::dlfcn_abi::HostResolver;
use crate::init_array::csu_init_fallback;
use crate::startup_helpers::{config_from_envp, emit_startup_trace, envp_from_argv};

pub type MainFn = unsafe extern "C" fn(c_int, *mut *mut c_char, *mut *mut c_char) -> c_int;
pub type InitArrayFn = unsafe extern "C" fn(c_int, *mut *mut c_char, *mut *mut c_char);
pub type HookFn = unsafe extern "C" fn();
pub type StartMainFn = unsafe extern "C" fn(
    Option<MainFn>,
    c_int,
    *mut *mut c_char,
    Option<InitArrayFn>,
    Option<HookFn>,
    Option<HookFn>,
    *mut c_void,
) -> c_int;

// Resolved addresses travel as `usize` between dlsym and the call below.
const _: () = assert!(
    size_of::<usize>() >= size_of::<*const c_void>(),
    "usize must hold an object pointer"
);
const _: () = assert!(
    size_of::<usize>() <= size_of::<StartMainFn>(),
    "a function pointer must hold a usize"
);

/// The loader-supplied parameter set, forwarded as received except `init`.
#[derive(Debug, Clone, Copy)]
pub struct StartArgs {
    pub main: Option<MainFn>,
    pub argc: c_int,
    pub argv: *mut *mut c_char,
    pub init: Option<InitArrayFn>,
    pub fini: Option<HookFn>,
    pub rtld_fini: Option<HookFn>,
    pub stack_end: *mut c_void,
}

/// Address of [`__dynamic_libc_start_main`] in this process.
///
/// A launcher exports the shim under `__libc_start_main` as well, so a lookup
/// that returns this address has found the alias rather than libc.
#[must_use]
pub fn shim_entry() -> SymbolAddr {
    let entry: StartMainFn = __dynamic_libc_start_main;
    SymbolAddr::new(entry as usize).unwrap_or(SymbolAddr::MIN)
}

/// Plan the startup with `resolver` and forward to the real start routine.
///
/// `fallback` is the `init` substituted on a legacy glibc. Returns whatever
/// the start routine returns, which under a real loader is never.
///
/// # Safety
///
/// `resolver` must return the address of a function with the
/// [`StartMainFn`] ABI for `__libc_start_main`. `args` must satisfy that
/// function's contract.
pub unsafe fn start_with<R: SymbolResolver + ?Sized>(
    resolver: &R,
    args: StartArgs,
    fallback: InitArrayFn,
) -> Result<c_int, StartupError> {
    let plan = plan_startup(resolver, shim_entry())?;

    // SAFETY: argv comes from the loader (or a test fixture) with argc + 1 slots.
    let envp = unsafe { envp_from_argv(args.argc, args.argv) };
    // SAFETY: envp is the loader's NULL-terminated environment vector.
    if unsafe { config_from_envp(envp) }.trace {
        emit_startup_trace(&plan);
    }

    let init = plan.strategy.select(args.init, Some(fallback));
    // SAFETY: the resolver contract says this address is a `__libc_start_main`.
    let start_main: StartMainFn = unsafe { core::mem::transmute(plan.start_main.get()) };
    // SAFETY: forwards the loader's arguments; only `init` may differ.
    Ok(unsafe {
        start_main(
            args.main,
            args.argc,
            args.argv,
            init,
            args.fini,
            args.rtld_fini,
            args.stack_end,
        )
    })
}

/// Drop-in replacement for `__libc_start_main`.
///
/// Resolves the real routine by symbol version (`GLIBC_2.34`, then the
/// architecture baseline), substitutes [`csu_init_fallback`] for `init` when
/// the 2.34 version is absent, and forwards. If the real routine cannot be
/// resolved, or resolves back to this function, there is no runtime to
/// report through, so the process aborts.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __dynamic_libc_start_main(
    main: Option<MainFn>,
    argc: c_int,
    argv: *mut *mut c_char,
    init: Option<InitArrayFn>,
    fini: Option<HookFn>,
    rtld_fini: Option<HookFn>,
    stack_end: *mut c_void,
) -> c_int {
    let args = StartArgs {
        main,
        argc,
        argv,
        init,
        fini,
        rtld_fini,
        stack_end,
    };
    // SAFETY: HostResolver returns glibc's own `__libc_start_main`; args come from `_start`.
    match unsafe { start_with(&HostResolver, args, csu_init_fallback) } {
        Ok(rc) => rc,
        Err(_) => {
            // SAFETY: abort has no preconditions and does not return.
            unsafe { libc::abort() }
        }
    }
}

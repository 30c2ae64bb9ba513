//! Embedded `.init_array` walker for glibc < 2.34.
//!
//! Older glibc expects the program to pass an `init` callback (historically
//! `__libc_csu_init`, statically linked into every executable) that runs
//! `_init` and then every `.init_array` entry with `(argc, argv, envp)`.
//! glibc 2.34 dropped that object from its crt files, so a launcher linked
//! against a newer toolchain has nothing to pass. This module supplies it.
//!
//! The loop keeps its cursor in locals. The static-cursor variant of
//! `__libc_csu_init` exists to defeat return-to-csu gadgets in glibc's own
//! hand-laid-out epilogue; this function is compiled by rustc and has no
//! such fixed epilogue to reuse.

use core::ffi::{c_char, c_int};

use crate::startup_abi::{HookFn, InitArrayFn};

unsafe extern "C" {
    fn _init();
    static __init_array_start: [Option<InitArrayFn>; 0];
    static __init_array_end: [Option<InitArrayFn>; 0];
}

/// Run `global_ctor`, then every non-null entry of `entries` in order.
///
/// Each entry receives the same `(argc, argv, envp)` triple. An empty slice
/// runs only `global_ctor`.
///
/// # Safety
///
/// Every function pointer must be callable with the given arguments, and the
/// sequence must run at most once per process.
pub unsafe fn run_init_sequence(
    global_ctor: Option<HookFn>,
    entries: &[Option<InitArrayFn>],
    argc: c_int,
    argv: *mut *mut c_char,
    envp: *mut *mut c_char,
) {
    if let Some(ctor) = global_ctor {
        // SAFETY: caller vouches for the constructor entry point.
        unsafe { ctor() };
    }
    for &entry in entries.iter().flatten() {
        // SAFETY: caller vouches for every initializer in the array.
        unsafe { entry(argc, argv, envp) };
    }
}

/// Borrow the initializer pointers in `[start, end)`.
///
/// A null start or a reversed/empty range yields an empty slice.
///
/// # Safety
///
/// When `start < end`, both must bound one readable array of
/// `Option<InitArrayFn>` that outlives `'a`.
pub unsafe fn init_array_between<'a>(
    start: *const Option<InitArrayFn>,
    end: *const Option<InitArrayFn>,
) -> &'a [Option<InitArrayFn>] {
    if start.is_null() || end <= start {
        return &[];
    }
    let len = (end as usize - start as usize) / size_of::<Option<InitArrayFn>>();
    // SAFETY: caller guarantees `[start, end)` is one readable array.
    unsafe { core::slice::from_raw_parts(start, len) }
}

/// The executable's own `.init_array`, bounded by the linker-provided
/// `__init_array_start` / `__init_array_end`.
///
/// # Safety
///
/// Must only be called from code linked into the executable whose init
/// array is wanted (the symbols are hidden and per-object).
pub unsafe fn linker_init_array() -> &'static [Option<InitArrayFn>] {
    let start = (&raw const __init_array_start).cast::<Option<InitArrayFn>>();
    let end = (&raw const __init_array_end).cast::<Option<InitArrayFn>>();
    // SAFETY: the range is the executable's init array, which lives for the whole process.
    unsafe { init_array_between(start, end) }
}

/// `init` callback substituted on glibc < 2.34.
///
/// Runs `_init` and the executable's `.init_array`, exactly once, from
/// inside the real `__libc_start_main` before `main`.
pub unsafe extern "C" fn csu_init_fallback(
    argc: c_int,
    argv: *mut *mut c_char,
    envp: *mut *mut c_char,
) {
    // SAFETY: invoked once by the real start routine, which owns argv/envp.
    unsafe {
        run_init_sequence(
            Some(_init as HookFn),
            linker_init_array(),
            argc,
            argv,
            envp,
        )
    };
}

//! Pre-libc helpers used by the startup entry: locating `envp`, reading the
//! startup config out of it, and writing the trace line.
//!
//! Everything here avoids the allocator and libc's own state. Only `write`,
//! `getpid` and `clock_gettime` are called, all of which are thin syscall
//! (or vDSO) wrappers that work before `__libc_start_main` has run.

use core::ffi::{c_char, c_int};
use core::marker::PhantomData;
use core::ptr;

use libcshim_core::StartupPlan;
use libcshim_core::StartupConfig;
use libcshim_core::startup::trace::{StartupTrace, UnixTime};

/// Maximum number of argv/envp entries scanned at startup.
pub const MAX_STARTUP_SCAN: usize = 4096;

/// Longest env entry prefix inspected when matching config keys.
pub const MAX_ENV_ENTRY_SCAN: usize = 256;

#[must_use]
pub fn normalize_argc(argc: c_int) -> usize {
    if argc < 0 { 0 } else { argc as usize }
}

/// Locate `envp` from the loader-supplied `argv`: it starts right after the
/// NULL that terminates `argv[argc]`.
///
/// # Safety
///
/// `argv` must be null or point at `argc + 1` readable slots.
#[must_use]
pub unsafe fn envp_from_argv(argc: c_int, argv: *mut *mut c_char) -> *mut *mut c_char {
    if argv.is_null() {
        return ptr::null_mut();
    }
    // SAFETY: caller guarantees argv has argc entries plus the terminating null.
    unsafe { argv.add(normalize_argc(argc).saturating_add(1)) }
}

/// Iterator over the raw `KEY=VALUE` bytes of an `envp` vector.
pub struct EnvEntries<'a> {
    cursor: *const *mut c_char,
    remaining: usize,
    _env: PhantomData<&'a [u8]>,
}

impl<'a> EnvEntries<'a> {
    /// # Safety
    ///
    /// `envp` must be null or a NULL-terminated vector of C strings that
    /// outlives `'a`.
    #[must_use]
    pub unsafe fn new(envp: *mut *mut c_char) -> Self {
        Self {
            cursor: envp.cast_const(),
            remaining: if envp.is_null() { 0 } else { MAX_STARTUP_SCAN },
            _env: PhantomData,
        }
    }
}

impl<'a> Iterator for EnvEntries<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        // SAFETY: `new` guarantees the vector is readable up to its terminator,
        // and `remaining` stops us at the scan limit.
        let entry = unsafe { *self.cursor };
        if entry.is_null() {
            self.remaining = 0;
            return None;
        }
        self.remaining -= 1;
        // SAFETY: still inside the vector; the terminator has not been seen yet.
        self.cursor = unsafe { self.cursor.add(1) };
        // SAFETY: entry is a NUL-terminated env string owned by the loader.
        Some(unsafe { crate::util::c_string_bytes(entry, MAX_ENV_ENTRY_SCAN) })
    }
}

/// Read [`StartupConfig`] out of `envp`.
///
/// # Safety
///
/// Same contract as [`EnvEntries::new`].
#[must_use]
pub unsafe fn config_from_envp(envp: *mut *mut c_char) -> StartupConfig {
    // SAFETY: forwarded caller contract.
    StartupConfig::from_env_entries(unsafe { EnvEntries::new(envp) })
}

fn now() -> UnixTime {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec.
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) } != 0 {
        return UnixTime::default();
    }
    UnixTime {
        secs: u64::try_from(ts.tv_sec).unwrap_or(0),
        nanos: u32::try_from(ts.tv_nsec).unwrap_or(0),
    }
}

/// Write the startup decision as one JSONL line to stderr.
///
/// Failures are dropped: there is nowhere to report them this early.
pub fn emit_startup_trace(plan: &StartupPlan) {
    // SAFETY: getpid has no preconditions.
    let pid = unsafe { libc::getpid() };
    let trace = StartupTrace {
        time: now(),
        pid: u32::try_from(pid).unwrap_or(0),
        generation: plan.generation,
        strategy: plan.strategy,
        start_main: plan.start_main.get(),
    };
    let Ok(line) = trace.render() else {
        return;
    };
    let mut bytes = line.as_bytes();
    while !bytes.is_empty() {
        // SAFETY: `bytes` is a valid readable buffer of the given length.
        let n = unsafe { libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len()) };
        if n <= 0 {
            return;
        }
        bytes = &bytes[n as usize..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn normalize_argc_clamps_negative() {
        assert_eq!(normalize_argc(-7), 0);
        assert_eq!(normalize_argc(0), 0);
        assert_eq!(normalize_argc(3), 3);
    }

    #[test]
    fn envp_follows_argv_terminator() {
        let arg0 = CString::new("launcher").unwrap();
        let env0 = CString::new("LIBCSHIM_STARTUP_TRACE=1").unwrap();
        let env1 = CString::new("HOME=/root").unwrap();
        let mut vector = [
            arg0.as_ptr().cast_mut(),
            std::ptr::null_mut(),
            env0.as_ptr().cast_mut(),
            env1.as_ptr().cast_mut(),
            std::ptr::null_mut(),
        ];
        // SAFETY: vector holds argv[0], NULL, then a NULL-terminated envp.
        let envp = unsafe { envp_from_argv(1, vector.as_mut_ptr()) };
        assert_eq!(envp, vector[2..].as_mut_ptr());
        // SAFETY: envp is NULL-terminated and outlives the iterator.
        let entries: Vec<&[u8]> = unsafe { EnvEntries::new(envp) }.collect();
        assert_eq!(entries, vec![&b"LIBCSHIM_STARTUP_TRACE=1"[..], &b"HOME=/root"[..]]);
        // SAFETY: as above.
        assert!(unsafe { config_from_envp(envp) }.trace);
    }

    #[test]
    fn null_vectors_are_empty() {
        // SAFETY: null argv is handled before any read.
        assert!(unsafe { envp_from_argv(2, std::ptr::null_mut()) }.is_null());
        // SAFETY: null envp is handled before any read.
        assert_eq!(unsafe { EnvEntries::new(std::ptr::null_mut()) }.count(), 0);
        // SAFETY: as above.
        assert_eq!(
            unsafe { config_from_envp(std::ptr::null_mut()) },
            StartupConfig::default()
        );
    }
}

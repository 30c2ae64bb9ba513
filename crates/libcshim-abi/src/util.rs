//! Shared internal utilities for ABI adapters.

use core::ffi::c_char;

/// Length of a C string, reading at most `limit` bytes.
///
/// Returns the length and whether the NUL was seen within `limit`. Startup
/// code never trusts an environment string to be terminated.
///
/// # Safety
///
/// `ptr` must be readable up to the NUL or `limit` bytes, whichever is first.
pub unsafe fn scan_c_string(ptr: *const c_char, limit: usize) -> (usize, bool) {
    let mut len = 0;
    while len < limit {
        // SAFETY: `len < limit` and no NUL has been seen yet.
        if unsafe { *ptr.add(len) } == 0 {
            return (len, true);
        }
        len += 1;
    }
    (limit, false)
}

/// Borrow the bytes of a C string, stopping at `bound` if no NUL shows up.
///
/// # Safety
///
/// Same as [`scan_c_string`]; the returned slice must not outlive the string.
pub unsafe fn c_string_bytes<'a>(ptr: *const c_char, bound: usize) -> &'a [u8] {
    if ptr.is_null() {
        return &[];
    }
    // SAFETY: caller guarantees `ptr` is readable up to the NUL or `bound`.
    let (len, _) = unsafe { scan_c_string(ptr, bound) };
    // SAFETY: `len` bytes starting at `ptr` were just read above.
    unsafe { core::slice::from_raw_parts(ptr.cast::<u8>(), len) }
}

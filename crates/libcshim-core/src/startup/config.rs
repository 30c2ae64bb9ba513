//! Startup configuration.
//!
//! The shim runs before libc has initialized, so it cannot call `getenv`.
//! The ABI layer walks the loader-supplied `envp` and feeds the raw
//! `KEY=VALUE` entries here.
//!
//! - `LIBCSHIM_STARTUP_TRACE`: `1`, `true`, `on` or `yes` (any case) writes
//!   one JSONL line describing the startup decision to stderr. Anything else,
//!   or absence, keeps the shim silent.

/// Environment key enabling the startup trace line.
pub const TRACE_ENV: &[u8] = b"LIBCSHIM_STARTUP_TRACE";

const FLAG_ON: [&[u8]; 4] = [b"1", b"true", b"on", b"yes"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StartupConfig {
    pub trace: bool,
}

impl StartupConfig {
    /// Build the config from raw `KEY=VALUE` environment entries.
    ///
    /// The first occurrence of a key wins, matching `getenv`.
    #[must_use]
    pub fn from_env_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut config = Self::default();
        for entry in entries {
            if let Some(value) = env_value(entry, TRACE_ENV) {
                config.trace = flag_from_bytes_loose(value);
                break;
            }
        }
        config
    }
}

/// Returns the value part of `entry` if its key is exactly `key`.
#[must_use]
pub fn env_value<'a>(entry: &'a [u8], key: &[u8]) -> Option<&'a [u8]> {
    let rest = entry.strip_prefix(key)?;
    rest.strip_prefix(b"=")
}

/// Parse an on/off flag (case-insensitive). Unknown spellings are off.
#[must_use]
pub fn flag_from_bytes_loose(value: &[u8]) -> bool {
    FLAG_ON
        .iter()
        .any(|accepted| value.eq_ignore_ascii_case(accepted))
}

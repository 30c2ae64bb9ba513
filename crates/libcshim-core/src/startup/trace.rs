//! Allocation-free JSONL record for the startup decision.
//!
//! The shim may run before malloc is usable, so the record is formatted with
//! `core::fmt` into a fixed stack buffer. The line follows the structured log
//! schema the harness validates: `timestamp`, `trace_id`, `level`, `event`
//! plus `symbol`, `outcome` and a `details` object.

use core::fmt::{self, Write};

use crate::startup::classify::{InitStrategy, LibcGeneration};

/// Capacity of [`TraceBuffer`]. A startup record is well under half of this.
pub const TRACE_CAPACITY: usize = 512;

/// Event name of the startup decision record.
pub const STARTUP_EVENT: &str = "startup_decision";

/// Fixed-capacity line buffer. Writes past capacity fail instead of
/// truncating silently.
pub struct TraceBuffer {
    buf: [u8; TRACE_CAPACITY],
    len: usize,
}

impl TraceBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; TRACE_CAPACITY],
            len: 0,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for TraceBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for TraceBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let end = self.len.checked_add(bytes.len()).ok_or(fmt::Error)?;
        if end > TRACE_CAPACITY {
            return Err(fmt::Error);
        }
        self.buf[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }
}

/// Wall-clock instant as seconds + nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnixTime {
    pub secs: u64,
    pub nanos: u32,
}

impl fmt::Display for UnixTime {
    /// RFC 3339 UTC with millisecond precision.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.secs / 86_400;
        let rem = self.secs % 86_400;
        let (year, month, day) = civil_from_days(days);
        write!(
            f,
            "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
            rem / 3600,
            (rem % 3600) / 60,
            rem % 60,
            self.nanos / 1_000_000,
        )
    }
}

/// Days since 1970-01-01 to (year, month, day), proleptic Gregorian.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}

/// One startup decision, as emitted by the shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupTrace {
    pub time: UnixTime,
    pub pid: u32,
    pub generation: LibcGeneration,
    pub strategy: InitStrategy,
    pub start_main: usize,
}

impl StartupTrace {
    /// Format as a single newline-terminated JSONL line.
    pub fn write_jsonl<W: Write>(&self, out: &mut W) -> fmt::Result {
        write!(
            out,
            "{{\"timestamp\":\"{}\",\"trace_id\":\"libcshim::startup::{}\",\"level\":\"info\",\
             \"event\":\"{STARTUP_EVENT}\",\"api_family\":\"startup\",\"symbol\":\"__libc_start_main\",\
             \"outcome\":\"pass\",\"details\":{{\"generation\":\"{}\",\"strategy\":\"{}\",\
             \"start_main\":\"{:#x}\"}}}}\n",
            self.time,
            self.pid,
            self.generation.as_str(),
            self.strategy.as_str(),
            self.start_main,
        )
    }

    /// Render into a fresh [`TraceBuffer`].
    pub fn render(&self) -> Result<TraceBuffer, fmt::Error> {
        let mut buf = TraceBuffer::new();
        self.write_jsonl(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StartupTrace {
        StartupTrace {
            time: UnixTime {
                secs: 1_771_113_600,
                nanos: 250_000_000,
            },
            pid: 4242,
            generation: LibcGeneration::Legacy,
            strategy: InitStrategy::Fallback,
            start_main: 0x7f12_3456_7000,
        }
    }

    #[test]
    fn epoch_formats_as_rfc3339() {
        assert_eq!(UnixTime::default().to_string(), "1970-01-01T00:00:00.000Z");
        let leap = UnixTime {
            secs: 951_782_400,
            nanos: 0,
        };
        assert_eq!(leap.to_string(), "2000-02-29T00:00:00.000Z");
    }

    #[test]
    fn renders_single_line_record() {
        let buf = sample().render().unwrap();
        let line = std::str::from_utf8(buf.as_bytes()).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.starts_with("{\"timestamp\":\"2026-02-15T00:00:00.250Z\""));
        assert!(line.contains("\"trace_id\":\"libcshim::startup::4242\""));
        assert!(line.contains("\"event\":\"startup_decision\""));
        assert!(line.contains("\"generation\":\"legacy\""));
        assert!(line.contains("\"strategy\":\"fallback\""));
        assert!(line.contains("\"start_main\":\"0x7f1234567000\""));
    }

    #[test]
    fn buffer_refuses_overflow() {
        let mut buf = TraceBuffer::new();
        let chunk = "x".repeat(TRACE_CAPACITY - 1);
        assert!(buf.write_str(&chunk).is_ok());
        assert!(buf.write_str("yy").is_err());
        assert_eq!(buf.len(), TRACE_CAPACITY - 1);
        assert!(buf.write_str("y").is_ok());
        assert_eq!(buf.as_bytes().len(), TRACE_CAPACITY);
    }

    #[test]
    fn empty_buffer() {
        let buf = TraceBuffer::default();
        assert!(buf.is_empty());
        assert!(buf.as_bytes().is_empty());
    }
}

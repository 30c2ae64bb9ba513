//! glibc version model.
//!
//! Accepts the spellings glibc itself produces: symbol version tags
//! (`GLIBC_2.34`), `gnu_get_libc_version()` output (`2.35`) and development
//! snapshots (`2.37.9000`). Only major/minor participate in ordering.

use core::fmt;
use core::str::FromStr;

use crate::error::VersionParseError;

const TAG_PREFIX: &str = "GLIBC_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlibcVersion {
    pub major: u16,
    pub minor: u16,
}

impl GlibcVersion {
    /// First release whose `__libc_start_main` walks `.init_array` itself.
    pub const INIT_ARRAY_ABI: Self = Self::new(2, 34);

    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Parse `GLIBC_2.34`, `2.34` or `2.37.9000`.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let trimmed = input.trim();
        let bare = trimmed.strip_prefix(TAG_PREFIX).unwrap_or(trimmed);
        if bare.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let mut parts = bare.split('.');
        let major = parse_component(0, parts.next().unwrap_or_default())?;
        let minor = match parts.next() {
            Some(component) => parse_component(1, component)?,
            None => return Err(VersionParseError::MissingMinor),
        };
        // Patch / snapshot components are accepted but ignored.
        for (index, component) in parts.enumerate() {
            parse_component(index + 2, component)?;
        }

        Ok(Self::new(major, minor))
    }

    /// Whether this glibc runs the init array from inside `__libc_start_main`.
    #[must_use]
    pub fn walks_init_array_internally(self) -> bool {
        self >= Self::INIT_ARRAY_ABI
    }

    /// Render as a symbol version tag (`GLIBC_2.34`).
    #[must_use]
    pub const fn symbol_tag(self) -> SymbolTag {
        SymbolTag(self)
    }
}

/// Display adapter writing a version as `GLIBC_<major>.<minor>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolTag(GlibcVersion);

impl fmt::Display for SymbolTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TAG_PREFIX}{}", self.0)
    }
}

impl fmt::Display for GlibcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for GlibcVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_component(index: usize, component: &str) -> Result<u16, VersionParseError> {
    component
        .parse::<u16>()
        .map_err(|_| VersionParseError::NotNumeric { index })
}

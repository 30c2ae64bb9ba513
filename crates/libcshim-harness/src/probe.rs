//! Host probe: what would the shim decide in this process?
//!
//! Runs the same `plan_startup` the shim runs at process start, then
//! cross-checks the symbol-version verdict against the runtime version
//! string and fingerprints the libc object that answered.

use std::path::{Path, PathBuf};

use libcshim_abi::HostResolver;
use libcshim_abi::dlfcn_abi::host_glibc_version;
use libcshim_core::dlfcn::{INIT_ARRAY_ABI_VERSION, START_MAIN_SYMBOL};
use libcshim_abi::startup_abi::shim_entry;
use libcshim_core::{GlibcVersion, LibcGeneration, StartupPlan, SymbolResolver, plan_startup};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// Result of the `GLIBC_2.34` versioned-symbol probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedProbe {
    pub version: String,
    pub found: bool,
}

/// Machine-readable probe report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub symbol: String,
    /// Address the start routine resolved to, `0x`-prefixed hex.
    pub start_main_resolved: String,
    pub versioned_probe: VersionedProbe,
    pub generation: String,
    pub strategy: String,
    /// `gnu_get_libc_version()` when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    /// Whether the symbol probe and the runtime version agree on the side of
    /// the 2.34 cutover. `None` when the runtime version is unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libc_object: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libc_sha256: Option<String>,
}

/// Probe with an arbitrary resolver, rejecting this process's shim entry the
/// same way the shim does.
pub fn probe<R: SymbolResolver + ?Sized>(
    resolver: &R,
    runtime_version: Option<GlibcVersion>,
) -> Result<ProbeReport, HarnessError> {
    let plan = plan_startup(resolver, shim_entry())?;
    Ok(report_for(&plan, runtime_version))
}

/// Describe an already computed plan.
#[must_use]
pub fn report_for(plan: &StartupPlan, runtime_version: Option<GlibcVersion>) -> ProbeReport {
    let modern = plan.generation == LibcGeneration::Modern;

    ProbeReport {
        symbol: START_MAIN_SYMBOL.to_string_lossy().into_owned(),
        start_main_resolved: format!("{:#x}", plan.start_main.get()),
        versioned_probe: VersionedProbe {
            version: INIT_ARRAY_ABI_VERSION.to_string_lossy().into_owned(),
            found: modern,
        },
        generation: plan.generation.as_str().to_string(),
        strategy: plan.strategy.as_str().to_string(),
        runtime_version: runtime_version.map(|v| v.to_string()),
        consistent: runtime_version.map(|v| v.walks_init_array_internally() == modern),
        libc_object: None,
        libc_sha256: None,
    }
}

/// Probe the running process's glibc and fingerprint the object that
/// provides `__libc_start_main`.
pub fn probe_host() -> Result<ProbeReport, HarnessError> {
    let resolver = HostResolver;
    let mut report = probe(&resolver, host_glibc_version().ok())?;

    if let Some(path) = resolver
        .resolve(START_MAIN_SYMBOL)
        .and_then(|addr| object_path(addr.get()))
    {
        report.libc_sha256 = sha256_hex(&path).ok();
        report.libc_object = Some(path.display().to_string());
    }
    Ok(report)
}

/// File backing the mapping that contains `addr`, from `/proc/self/maps`.
pub fn object_path(addr: usize) -> Option<PathBuf> {
    let maps = std::fs::read_to_string("/proc/self/maps").ok()?;
    maps.lines().find_map(|line| mapping_path(line, addr))
}

// Line layout: `lo-hi perms offset dev inode   path`.
fn mapping_path(line: &str, addr: usize) -> Option<PathBuf> {
    let mut fields = line.splitn(6, ' ');
    let (lo, hi) = fields.next()?.split_once('-')?;
    let lo = usize::from_str_radix(lo, 16).ok()?;
    let hi = usize::from_str_radix(hi, 16).ok()?;
    if !(lo..hi).contains(&addr) {
        return None;
    }
    let path = fields.nth(4)?.trim_start();
    path.starts_with('/').then(|| PathBuf::from(path))
}

fn hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

/// SHA-256 of a file, lowercase hex.
pub fn sha256_hex(path: &Path) -> Result<String, HarnessError> {
    use sha2::Digest;
    let data = std::fs::read(path).map_err(|err| HarnessError::io(path, err))?;
    Ok(hex_lower(&sha2::Sha256::digest(&data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use libcshim_core::SymbolAddr;
    use std::ffi::CStr;
    use std::num::NonZeroUsize;

    struct Fake {
        has_2_34: bool,
    }

    impl SymbolResolver for Fake {
        fn resolve(&self, _name: &CStr) -> Option<SymbolAddr> {
            NonZeroUsize::new(0x4000)
        }

        fn resolve_versioned(&self, _name: &CStr, _version: &CStr) -> Option<SymbolAddr> {
            self.has_2_34.then(|| NonZeroUsize::new(0x4000)).flatten()
        }
    }

    #[test]
    fn legacy_report() {
        let report = probe(&Fake { has_2_34: false }, Some(GlibcVersion::new(2, 31))).unwrap();
        assert_eq!(report.symbol, "__libc_start_main");
        assert_eq!(report.start_main_resolved, "0x4000");
        assert_eq!(report.versioned_probe.version, "GLIBC_2.34");
        assert!(!report.versioned_probe.found);
        assert_eq!(report.generation, "legacy");
        assert_eq!(report.strategy, "fallback");
        assert_eq!(report.runtime_version.as_deref(), Some("2.31"));
        assert_eq!(report.consistent, Some(true));
    }

    #[test]
    fn mismatch_is_flagged() {
        let report = probe(&Fake { has_2_34: true }, Some(GlibcVersion::new(2, 28))).unwrap();
        assert_eq!(report.generation, "modern");
        assert_eq!(report.strategy, "pass_through");
        assert_eq!(report.consistent, Some(false));
    }

    #[test]
    fn unknown_runtime_version_omits_consistency() {
        let report = probe(&Fake { has_2_34: true }, None).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("consistent").is_none());
        assert!(json.get("runtime_version").is_none());
        assert!(json.get("libc_object").is_none());
    }

    #[test]
    fn report_for_plan_matches_probe() {
        let fake = Fake { has_2_34: true };
        let plan = plan_startup(&fake, shim_entry()).unwrap();
        let version = Some(GlibcVersion::new(2, 39));
        assert_eq!(report_for(&plan, version), probe(&fake, version).unwrap());
    }

    #[test]
    fn mapping_lines_resolve_to_their_file() {
        let line = "7f3a1c000000-7f3a1c028000 r--p 00000000 08:01 1835  /usr/lib/x86_64-linux-gnu/libc.so.6";
        assert_eq!(
            mapping_path(line, 0x7f3a_1c00_1000),
            Some(PathBuf::from("/usr/lib/x86_64-linux-gnu/libc.so.6"))
        );
        assert_eq!(mapping_path(line, 0x7f3a_1c02_8000), None);
        let anon = "7ffd0000-7ffd1000 rw-p 00000000 00:00 0                          [stack]";
        assert_eq!(mapping_path(anon, 0x7ffd_0800), None);
        assert_eq!(mapping_path("garbage", 0), None);
    }

    #[test]
    fn host_start_routine_lives_in_libc() {
        let addr = HostResolver.resolve(START_MAIN_SYMBOL).unwrap();
        let path = object_path(addr.get()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("libc"), "unexpected object {}", path.display());
    }

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(hex_lower(&[0x00, 0x0f, 0xab]), "000fab");
    }
}

//! End-to-end: launchers linked through the shim start, run their
//! constructors before `main`, and exit with `main`'s status.
//!
//! Validates that:
//! 1. The Rust launcher (linked by `build.rs`) exits 37 with its constructor run.
//! 2. With `LIBCSHIM_STARTUP_TRACE=1` exactly one valid `startup_decision`
//!    line is written, naming libc's routine rather than the shim.
//! 3. A C launcher linked against `liblibcshim_start.a` behaves the same and
//!    imports no `GLIBC_2.34`-or-later symbol version.
//!
//! The C half needs the archive from `cargo build -p libcshim-start` plus `cc`,
//! and skips when either is missing.
//!
//! Run: cargo test -p libcshim-fixture --test launcher_test

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use libcshim_abi::HostResolver;
use libcshim_core::startup::trace::STARTUP_EVENT;
use libcshim_core::{GlibcVersion, classify};
use libcshim_harness::link_args::{LinkFlavor, link_args};
use libcshim_harness::structured_log::validate_log_line;

const TRACE_ENV: &str = "LIBCSHIM_STARTUP_TRACE";

struct LauncherRun {
    status: Option<i32>,
    shim_entry: String,
    ctor_before_main: bool,
    decisions: Vec<serde_json::Value>,
}

fn stdout_field<'a>(stdout: &'a str, key: &str) -> &'a str {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(key)?.strip_prefix('='))
        .unwrap_or_else(|| panic!("launcher did not print {key}: {stdout}"))
}

fn parse_run(out: Output) -> LauncherRun {
    let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
    let decisions = stderr
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains(STARTUP_EVENT))
        .map(|(idx, line)| {
            validate_log_line(line, idx + 1)
                .unwrap_or_else(|errors| panic!("invalid trace line {line}: {errors:?}"));
            serde_json::from_str(line).expect("trace line is JSON")
        })
        .collect();
    LauncherRun {
        status: out.status.code(),
        shim_entry: stdout_field(&stdout, "shim_entry").to_string(),
        ctor_before_main: stdout_field(&stdout, "ctor_before_main") == "true",
        decisions,
    }
}

fn run_launcher(path: &Path, trace: bool) -> LauncherRun {
    let mut cmd = Command::new(path);
    if trace {
        cmd.env(TRACE_ENV, "1");
    } else {
        cmd.env_remove(TRACE_ENV);
    }
    parse_run(cmd.output().expect("launcher should spawn"))
}

fn assert_single_decision(run: &LauncherRun) {
    assert_eq!(run.decisions.len(), 1, "decisions: {:?}", run.decisions);
    let details = &run.decisions[0]["details"];
    assert_ne!(
        details["start_main"].as_str(),
        Some(run.shim_entry.as_str()),
        "start routine resolved to the shim itself"
    );
    assert_eq!(
        details["generation"].as_str(),
        Some(classify(&HostResolver).as_str())
    );
}

fn rust_launcher() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_shim-launcher"))
}

#[test]
fn rust_launcher_reaches_main_after_constructors() {
    let run = run_launcher(&rust_launcher(), false);
    assert_eq!(run.status, Some(37));
    assert!(run.ctor_before_main);
    assert!(run.decisions.is_empty());
}

#[test]
fn rust_launcher_traces_one_decision() {
    let run = run_launcher(&rust_launcher(), true);
    assert_eq!(run.status, Some(37));
    assert!(run.ctor_before_main);
    assert_single_decision(&run);
}

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("libcshim-fixture-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("scratch dir should be creatable");
    dir
}

/// `liblibcshim_start.a` next to the test's own profile directory.
fn start_archive() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let archive = exe.parent()?.parent()?.join("liblibcshim_start.a");
    archive.exists().then_some(archive)
}

const C_LAUNCHER: &str = r#"
#include <stdio.h>

extern int __dynamic_libc_start_main();

static int ctor_ran;

__attribute__((constructor)) static void mark_ctor(void) { ctor_ran = 1; }

int main(void) {
    printf("shim_entry=%#lx\n", (unsigned long)&__dynamic_libc_start_main);
    printf("ctor_before_main=%s\n", ctor_ran ? "true" : "false");
    return 23;
}
"#;

fn build_c_launcher(name: &str) -> Option<PathBuf> {
    let Some(archive) = start_archive() else {
        eprintln!("skipping: liblibcshim_start.a not built (cargo build -p libcshim-start)");
        return None;
    };
    let dir = scratch_dir();
    let source = dir.join(format!("{name}.c"));
    let binary = dir.join(name);
    std::fs::write(&source, C_LAUNCHER).expect("launcher source should be writable");

    let out = match Command::new("cc")
        .arg(&source)
        .arg("-o")
        .arg(&binary)
        .args(link_args(LinkFlavor::Cc, Some(&archive)))
        .output()
    {
        Ok(out) => out,
        Err(err) => {
            eprintln!("skipping: cc unavailable: {err}");
            return None;
        }
    };
    assert!(
        out.status.success(),
        "link failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    Some(binary)
}

/// Every `GLIBC_x.y` version tag among the binary's dynamic symbols.
fn imported_glibc_versions(binary: &Path) -> Option<Vec<GlibcVersion>> {
    let out = Command::new("objdump").arg("-T").arg(binary).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let table = String::from_utf8_lossy(&out.stdout).into_owned();
    Some(
        table
            .split_whitespace()
            .map(|token| token.trim_matches(|c| c == '(' || c == ')'))
            .filter(|token| token.starts_with("GLIBC_"))
            .filter_map(|token| GlibcVersion::parse(token).ok())
            .collect(),
    )
}

#[test]
fn c_launcher_runs_through_the_static_archive() {
    let Some(binary) = build_c_launcher("launcher_run") else {
        return;
    };

    let quiet = run_launcher(&binary, false);
    assert_eq!(quiet.status, Some(23));
    assert!(quiet.ctor_before_main);
    assert!(quiet.decisions.is_empty());

    let traced = run_launcher(&binary, true);
    assert_eq!(traced.status, Some(23));
    assert!(traced.ctor_before_main);
    assert_single_decision(&traced);
}

#[test]
fn c_launcher_imports_nothing_from_glibc_2_34() {
    let Some(binary) = build_c_launcher("launcher_symbols") else {
        return;
    };
    let Some(versions) = imported_glibc_versions(&binary) else {
        eprintln!("skipping: objdump unavailable");
        return;
    };
    assert!(!versions.is_empty(), "no versioned glibc imports found");
    let late: Vec<String> = versions
        .iter()
        .filter(|v| v.walks_init_array_internally())
        .map(|v| v.symbol_tag().to_string())
        .collect();
    assert!(late.is_empty(), "launcher needs {late:?}");
}

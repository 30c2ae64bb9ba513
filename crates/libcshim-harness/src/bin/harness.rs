//! CLI entrypoint for the libc-start shim tooling.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use libcshim_harness::HarnessError;
use libcshim_harness::link_args::{LinkFlavor, link_args};
use libcshim_harness::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, validate_log_file};

/// Tooling for the dynamic libc-start shim.
#[derive(Debug, Parser)]
#[command(name = "libcshim-harness")]
#[command(about = "Probe, link and trace tooling for the dynamic libc-start shim")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report what the shim would decide against the running glibc.
    Probe {
        /// Output JSON path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Append a `probe_decision` record to this JSONL log.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Run identifier used in trace ids.
        #[arg(long, default_value = "local")]
        run_id: String,
    },
    /// Print the linker arguments that route `__libc_start_main` to the shim.
    LinkArgs {
        /// Driver flavor: `cc` (gcc/clang) or `ld`.
        #[arg(long, default_value = "cc")]
        flavor: String,
        /// Path to the built `liblibcshim_start.a` to include.
        #[arg(long)]
        staticlib: Option<PathBuf>,
        /// Emit a JSON array instead of a space-separated line.
        #[arg(long)]
        json: bool,
    },
    /// Validate a structured JSONL log (e.g. captured startup traces).
    ValidateLog {
        /// JSONL log path.
        #[arg(long)]
        log: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Probe {
            output,
            log,
            run_id,
        } => {
            let report = libcshim_harness::probe_host()?;
            let json = serde_json::to_string_pretty(&report)?;
            let inconsistent = report.consistent == Some(false);

            if let Some(path) = log {
                let mut emitter = LogEmitter::to_file(&path, "probe", &run_id)
                    .map_err(|err| HarnessError::io(&path, err))?;
                let outcome = if inconsistent {
                    Outcome::Fail
                } else {
                    Outcome::Pass
                };
                let artifacts: Vec<String> = output
                    .iter()
                    .map(|p| p.display().to_string())
                    .chain(report.libc_object.clone())
                    .collect();
                let entry = LogEntry::new("", LogLevel::Info, "probe_decision")
                    .with_api("startup", report.symbol.clone())
                    .with_outcome(outcome)
                    .with_exit_code(i32::from(inconsistent))
                    .with_artifacts(artifacts)
                    .with_details(serde_json::to_value(&report)?);
                emitter
                    .emit_entry(entry)
                    .and_then(|()| emitter.flush())
                    .map_err(|err| HarnessError::io(&path, err))?;
            }

            match output {
                Some(path) => {
                    std::fs::write(&path, json).map_err(|err| HarnessError::io(&path, err))?;
                    eprintln!("Wrote probe report to {}", path.display());
                }
                None => println!("{json}"),
            }

            if inconsistent {
                return Err(format!(
                    "symbol probe ({}) disagrees with runtime glibc {}",
                    report.generation,
                    report.runtime_version.as_deref().unwrap_or("?"),
                )
                .into());
            }
        }
        Command::LinkArgs {
            flavor,
            staticlib,
            json,
        } => {
            let args = link_args(LinkFlavor::parse(&flavor)?, staticlib.as_deref());
            if json {
                println!("{}", serde_json::to_string(&args)?);
            } else {
                println!("{}", args.join(" "));
            }
        }
        Command::ValidateLog { log } => {
            let (lines, errors) =
                validate_log_file(&log).map_err(|err| HarnessError::io(&log, err))?;
            for error in &errors {
                eprintln!("{error}");
            }
            eprintln!(
                "Validated {}: lines={lines}, violations={}",
                log.display(),
                errors.len()
            );
            if !errors.is_empty() {
                return Err(HarnessError::InvalidLog {
                    path: log,
                    count: errors.len(),
                }
                .into());
            }
        }
    }

    Ok(())
}

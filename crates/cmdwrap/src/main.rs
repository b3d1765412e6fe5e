use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;

use cmdwrap::diagnostics::{self, Diagnostic, Location, Stage};
use cmdwrap::generate::{self, GenerateOutput, RunOutcome};
use cmdwrap::options::GenOptions;
use cmdwrap::output::{CheckOutcome, WriteOutcome, WritePolicy};
use cmdwrap_contracts::CMDWRAP_REPORT_SCHEMA_VERSION;

#[derive(Parser)]
#[command(name = "cmdwrap")]
#[command(about = "Generate vde command wrappers (wrappables JSON -> C).", long_about = None)]
struct Cli {
    /// Wrappables schema file.
    schema: PathBuf,

    /// Directory receiving <basename>_commands.h and <basename>_commands.c.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Exit 1 if the artifacts on disk differ from what would be generated.
    #[arg(long)]
    check: bool,

    #[arg(long, value_enum, default_value_t = WritePolicy::Atomic)]
    write_policy: WritePolicy,

    #[arg(long)]
    report_json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct ArtifactReport {
    path: String,
    sha256: String,
    outcome: &'static str,
}

#[derive(Debug, Serialize)]
struct CmdwrapToolReport {
    schema_version: &'static str,
    command: &'static str,
    ok: bool,
    r#in: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    artifacts: Vec<ArtifactReport>,
    diagnostics_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
    exit_code: u8,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = GenOptions {
        out_dir: cli.out_dir.clone(),
        write_policy: cli.write_policy,
        check_only: cli.check,
    };
    let command = if cli.check { "check" } else { "generate" };

    let (out, outcome) = match generate::run(&cli.schema, &options) {
        Ok(v) => v,
        Err(err) => {
            if cli.report_json {
                let report = CmdwrapToolReport {
                    schema_version: CMDWRAP_REPORT_SCHEMA_VERSION,
                    command,
                    ok: false,
                    r#in: cli.schema.display().to_string(),
                    artifacts: Vec::new(),
                    diagnostics_count: 1,
                    diagnostics: vec![err.to_diagnostic()],
                    exit_code: 2,
                };
                print_json(&report)?;
                return Ok(ExitCode::from(2));
            }
            return Err(anyhow::Error::new(err).context(format!("{command} failed")));
        }
    };

    for w in &out.warnings {
        tracing::warn!(code = %w.code, "{}", w.message);
    }

    let mut diags = out.warnings.clone();
    if let RunOutcome::Checked(results) = &outcome {
        for (path, o) in results {
            if *o == CheckOutcome::Fresh {
                continue;
            }
            let what = if *o == CheckOutcome::Missing { "missing" } else { "out of date" };
            diags.push(
                Diagnostic::error(
                    "CMDWRAP-CHECK-STALE-0001",
                    Stage::Write,
                    format!("artifact is {what}: {}", path.display()),
                )
                .at(Location::File {
                    path: path.display().to_string(),
                }),
            );
            if !cli.report_json {
                eprintln!("artifact is {what}: {}", path.display());
            }
        }
    }

    let exit_code: u8 = if outcome.up_to_date() { 0 } else { 1 };
    if cli.report_json {
        let report = diagnostics::Report::ok().with_diagnostics(diags);
        let tool_report = CmdwrapToolReport {
            schema_version: CMDWRAP_REPORT_SCHEMA_VERSION,
            command,
            ok: report.ok,
            r#in: cli.schema.display().to_string(),
            artifacts: artifact_reports(&options.out_dir, &out, &outcome),
            diagnostics_count: report.diagnostics.len(),
            diagnostics: report.diagnostics,
            exit_code,
        };
        print_json(&tool_report)?;
    }

    Ok(ExitCode::from(exit_code))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    h.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

fn artifact_reports(out_dir: &Path, out: &GenerateOutput, outcome: &RunOutcome) -> Vec<ArtifactReport> {
    let outcomes: Vec<&'static str> = match outcome {
        RunOutcome::Written(r) => r
            .iter()
            .map(|(_, o)| match o {
                WriteOutcome::Written => "written",
                WriteOutcome::Unchanged => "unchanged",
            })
            .collect(),
        RunOutcome::Checked(r) => r
            .iter()
            .map(|(_, o)| match o {
                CheckOutcome::Fresh => "fresh",
                CheckOutcome::Stale => "stale",
                CheckOutcome::Missing => "missing",
            })
            .collect(),
    };
    let a = &out.artifacts;
    [(&a.header_name, &a.header_src), (&a.source_name, &a.source_src)]
        .into_iter()
        .zip(outcomes)
        .map(|((name, src), outcome)| ArtifactReport {
            path: out_dir.join(name).display().to_string(),
            sha256: sha256_hex(src),
            outcome,
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

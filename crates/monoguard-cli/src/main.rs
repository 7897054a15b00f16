//! CLI entry point for monoguard.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, and exit codes.
//! All business logic lives in the `monoguard-app` crate.

mod tracing;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use monoguard_app::{
    CheckInput, ExplainOutput, Mode, parse_report_json, render_annotations, render_markdown,
    run_check, run_explain, runtime_error_report, serialize_report, to_renderable,
    verdict_exit_code,
};
use monoguard_settings::Overrides;
use monoguard_types::MonoguardReport;

use crate::tracing::{LogLevel, TracingConfig, TracingFormat, init_tracing};

#[derive(Parser, Debug)]
#[command(
    name = "monoguard",
    version,
    about = "Dependency constraint engine and auto-fixer for JavaScript monorepos"
)]
struct Cli {
    /// Repository root (directory containing the root package.json).
    #[arg(long, default_value = ".", global = true)]
    repo_root: Utf8PathBuf,

    /// Path to the monoguard config TOML, relative to the repo root.
    #[arg(long, default_value = "monoguard.toml", global = true)]
    config: Utf8PathBuf,

    /// Override profile (strict|warn|report).
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Override maximum violations to emit.
    #[arg(long, global = true)]
    max_violations: Option<u32>,

    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    #[arg(long, value_enum, default_value = "compact", global = true)]
    log_format: TracingFormat,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate constraints without touching any manifest.
    Check {
        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/monoguard/report.json")]
        report_out: Utf8PathBuf,

        /// Also write a Markdown report to this path.
        #[arg(long)]
        markdown_out: Option<Utf8PathBuf>,
    },

    /// Apply every autofix and write the changed manifests back.
    Fix {
        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/monoguard/report.json")]
        report_out: Utf8PathBuf,

        /// Also write a Markdown report to this path.
        #[arg(long)]
        markdown_out: Option<Utf8PathBuf>,
    },

    /// Render markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/monoguard/report.json")]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (stdout if omitted).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Render GitHub Actions annotations from an existing JSON report.
    Annotations {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/monoguard/report.json")]
        report: Utf8PathBuf,

        /// Maximum number of annotations to emit.
        #[arg(long, default_value = "10")]
        max: usize,
    },

    /// Explain a rule id or violation code with remediation guidance.
    Explain {
        /// The rule id (e.g. "deps.consistent_ranges") or code (e.g. "range_mismatch").
        identifier: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.log_level.into(),
    })?;

    match &cli.cmd {
        Commands::Check {
            report_out,
            markdown_out,
        } => cmd_run(&cli, Mode::Check, report_out, markdown_out.as_deref()),
        Commands::Fix {
            report_out,
            markdown_out,
        } => cmd_run(&cli, Mode::Fix, report_out, markdown_out.as_deref()),
        Commands::Md { report, output } => cmd_md(report, output.as_deref()),
        Commands::Annotations { report, max } => cmd_annotations(report, *max),
        Commands::Explain { identifier } => cmd_explain(identifier),
    }
}

fn cmd_run(
    cli: &Cli,
    mode: Mode,
    report_out: &Utf8Path,
    markdown_out: Option<&Utf8Path>,
) -> anyhow::Result<()> {
    let repo_root = cli
        .repo_root
        .canonicalize_utf8()
        .unwrap_or_else(|_| cli.repo_root.clone());

    let result = (|| -> anyhow::Result<i32> {
        if !repo_root.join("package.json").is_file() {
            anyhow::bail!("no package.json found at repo root: {repo_root}");
        }

        // Missing config file is allowed (defaults apply).
        let cfg_path = repo_root.join(&cli.config);
        let cfg_text = match std::fs::read_to_string(&cfg_path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(err).with_context(|| format!("read config: {cfg_path}"));
            }
        };

        let input = CheckInput {
            repo_root: &repo_root,
            config_text: &cfg_text,
            overrides: Overrides {
                profile: cli.profile.clone(),
                max_violations: cli.max_violations,
            },
            mode,
        };

        let output = run_check(input)?;

        write_report_file(report_out, &output.report).context("write report json")?;
        if let Some(markdown_out) = markdown_out {
            let md = render_markdown(&to_renderable(&output.report));
            write_text_file(markdown_out, &md).context("write markdown")?;
        }
        for path in &output.written {
            eprintln!("monoguard: updated {path}");
        }

        Ok(verdict_exit_code(output.report.verdict.clone()))
    })();

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            let report = runtime_error_report(mode.as_str(), &format!("{err:#}"));
            if let Err(write_err) = write_report_file(report_out, &report) {
                ::tracing::warn!(error = %write_err, "failed to write runtime error report");
            }
            eprintln!("monoguard error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn write_report_file(path: &Utf8Path, report: &MonoguardReport) -> anyhow::Result<()> {
    let data = serialize_report(report)?;
    write_bytes(path, &data)
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    write_bytes(path, text.as_bytes())
}

fn write_bytes(path: &Utf8Path, data: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, data).with_context(|| format!("write file: {path}"))?;
    Ok(())
}

fn read_report(path: &Utf8Path) -> anyhow::Result<MonoguardReport> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read report: {path}"))?;
    parse_report_json(&text)
}

fn cmd_md(report_path: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<()> {
    let report = read_report(report_path)?;
    let md = render_markdown(&to_renderable(&report));

    match output {
        Some(out_path) => write_text_file(out_path, &md).context("write markdown output")?,
        None => print!("{md}"),
    }
    Ok(())
}

fn cmd_annotations(report_path: &Utf8Path, max: usize) -> anyhow::Result<()> {
    let report = read_report(report_path)?;
    for annotation in render_annotations(&to_renderable(&report), max) {
        println!("{annotation}");
    }
    Ok(())
}

fn cmd_explain(identifier: &str) -> anyhow::Result<()> {
    match run_explain(identifier) {
        ExplainOutput::Found(exp) => {
            print!("{}", monoguard_app::format_explanation(&exp));
            Ok(())
        }
        ExplainOutput::NotFound {
            identifier,
            suggestions,
            available_rule_ids,
            available_codes,
        } => {
            eprint!(
                "{}",
                monoguard_app::format_not_found(
                    &identifier,
                    &suggestions,
                    available_rule_ids,
                    available_codes,
                )
            );
            std::process::exit(1);
        }
    }
}

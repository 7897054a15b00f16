//! The `check` use case: evaluate constraints, optionally persist fixes, and produce a report.

use anyhow::Context;
use camino::Utf8Path;
use monoguard_domain::policy::Mode;
use monoguard_domain::report::DomainReport;
use monoguard_settings::{Overrides, ResolvedConfig};
use monoguard_types::{MonoguardReport, RepoPath, ReportEnvelope, SCHEMA_REPORT_V1, ToolMeta, Verdict};
use time::OffsetDateTime;

/// Input for the check use case.
#[derive(Clone, Debug)]
pub struct CheckInput<'a> {
    /// Repository root path.
    pub repo_root: &'a Utf8Path,
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
    /// `Check` leaves the manifests untouched; `Fix` writes the changes back.
    pub mode: Mode,
}

/// Output from the check use case.
#[derive(Clone, Debug)]
pub struct CheckOutput {
    /// The generated report.
    pub report: MonoguardReport,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
    /// Manifests rewritten on disk (always empty in check mode).
    pub written: Vec<RepoPath>,
}

/// Run the check use case: parse config, discover workspaces, evaluate rules, produce report.
pub fn run_check(input: CheckInput<'_>) -> anyhow::Result<CheckOutput> {
    let started_at = OffsetDateTime::now_utc();

    // Parse config (empty is allowed, defaults apply).
    let cfg = if input.config_text.trim().is_empty() {
        monoguard_settings::MonoguardConfigV1::default()
    } else {
        monoguard_settings::parse_config_toml(input.config_text).context("parse config")?
    };

    let resolved = monoguard_settings::resolve_config(cfg, input.overrides.clone())
        .context("resolve config")?;

    let mut project =
        monoguard_repo::build_project(input.repo_root).context("build project")?;

    let DomainReport {
        verdict,
        violations,
        changes,
        data,
        ..
    } = monoguard_domain::evaluate(&mut project, &resolved.effective, input.mode)
        .context("evaluate constraints")?;

    let written = match input.mode {
        Mode::Fix => monoguard_repo::persist_changes(input.repo_root, &project, &changes)
            .context("write manifests")?,
        Mode::Check => Vec::new(),
    };
    tracing::info!(
        mode = input.mode.as_str(),
        profile = %resolved.effective.profile,
        written = written.len(),
        "run complete"
    );

    let finished_at = OffsetDateTime::now_utc();

    let report = ReportEnvelope {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "monoguard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at,
        finished_at,
        verdict,
        violations,
        changes,
        data,
    };

    Ok(CheckOutput {
        report,
        resolved_config: resolved,
        written,
    })
}

/// Map verdict to exit code: 0 = pass/warn, 2 = fail.
pub fn verdict_exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Warn => 0,
        Verdict::Fail => 2,
    }
}

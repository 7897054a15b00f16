use anyhow::Context;
use monoguard_render::{
    RenderableChange, RenderableData, RenderableLocation, RenderableReport, RenderableSeverity,
    RenderableVerdictStatus, RenderableViolation,
};
use monoguard_types::{
    ManifestChange, MonoguardData, MonoguardReport, SCHEMA_REPORT_V1, Severity, ToolMeta, Verdict,
    Violation, ids,
};
use time::OffsetDateTime;

pub fn parse_report_json(text: &str) -> anyhow::Result<MonoguardReport> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse report json")?;

    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if schema != SCHEMA_REPORT_V1 {
        anyhow::bail!("unknown report schema: {schema} (expected {SCHEMA_REPORT_V1})");
    }

    serde_json::from_value(value).context("parse monoguard report")
}

pub fn serialize_report(report: &MonoguardReport) -> anyhow::Result<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(report).context("serialize report")?;
    out.push(b'\n');
    Ok(out)
}

pub fn to_renderable(report: &MonoguardReport) -> RenderableReport {
    RenderableReport {
        verdict: match report.verdict {
            Verdict::Pass => RenderableVerdictStatus::Pass,
            Verdict::Warn => RenderableVerdictStatus::Warn,
            Verdict::Fail => RenderableVerdictStatus::Fail,
        },
        violations: report.violations.iter().map(renderable_violation).collect(),
        changes: report.changes.iter().map(renderable_change).collect(),
        data: RenderableData {
            mode: report.data.mode.clone(),
            violations_emitted: report.data.violations_emitted,
            violations_total: report.data.violations_total,
            changes_total: report.data.changes_total,
            truncated_reason: report.data.truncated_reason.clone(),
        },
    }
}

fn renderable_violation(v: &Violation) -> RenderableViolation {
    RenderableViolation {
        severity: match v.severity {
            Severity::Info => RenderableSeverity::Info,
            Severity::Warning => RenderableSeverity::Warning,
            Severity::Error => RenderableSeverity::Error,
        },
        rule_id: v.rule_id.clone(),
        code: v.code.clone(),
        message: v.message.clone(),
        location: v.location.as_ref().map(|loc| RenderableLocation {
            path: loc.path.as_str().to_string(),
            field: loc.field.clone(),
        }),
        help: v.help.clone(),
    }
}

fn renderable_change(c: &ManifestChange) -> RenderableChange {
    RenderableChange {
        rule_id: c.rule_id.clone(),
        workspace: c.workspace.as_str().to_string(),
        field: c.field.clone(),
        before: c.before.as_ref().map(|v| v.to_string()),
        after: c.after.as_ref().map(|v| v.to_string()),
    }
}

/// Report written when the run itself failed (bad config, unreadable manifest).
pub fn runtime_error_report(mode: &str, message: &str) -> MonoguardReport {
    let now = OffsetDateTime::now_utc();
    let data = MonoguardData {
        mode: mode.to_string(),
        profile: "unknown".to_string(),
        violations_total: 1,
        violations_emitted: 1,
        ..MonoguardData::default()
    };

    MonoguardReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "monoguard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at: now,
        finished_at: now,
        verdict: Verdict::Fail,
        violations: vec![Violation {
            severity: Severity::Error,
            rule_id: ids::RULE_TOOL_RUNTIME.to_string(),
            code: ids::CODE_RUNTIME_ERROR.to_string(),
            message: message.to_string(),
            location: None,
            help: Some("Fix the tool error and re-run monoguard.".to_string()),
            fingerprint: None,
            data: serde_json::Value::Null,
        }],
        changes: Vec::new(),
        data,
    }
}

use crate::{RenderableReport, RenderableSeverity, RenderableVerdictStatus};

pub fn render_markdown(report: &RenderableReport) -> String {
    let mut out = String::new();

    out.push_str("# Monoguard report\n\n");
    let verdict = match report.verdict {
        RenderableVerdictStatus::Pass => "PASS",
        RenderableVerdictStatus::Warn => "WARN",
        RenderableVerdictStatus::Fail => "FAIL",
    };
    out.push_str(&format!(
        "- Verdict: **{}**\n- Mode: {}\n- Violations: {} (emitted) / {} (total)\n- Changes: {}\n\n",
        verdict,
        report.data.mode,
        report.data.violations_emitted,
        report.data.violations_total,
        report.data.changes_total
    ));

    if let Some(r) = &report.data.truncated_reason {
        out.push_str(&format!("> Note: {}\n\n", r));
    }

    if report.violations.is_empty() {
        out.push_str("No violations.\n");
    } else {
        out.push_str("## Violations\n\n");

        for v in &report.violations {
            let sev = match v.severity {
                RenderableSeverity::Info => "INFO",
                RenderableSeverity::Warning => "WARN",
                RenderableSeverity::Error => "ERROR",
            };

            out.push_str(&format!("- [{}] `{}` / `{}`: {}", sev, v.rule_id, v.code, v.message));
            match &v.location {
                Some(loc) => match &loc.field {
                    Some(field) => out.push_str(&format!(" (`{}` at `{}`)\n", loc.path, field)),
                    None => out.push_str(&format!(" (`{}`)\n", loc.path)),
                },
                None => out.push('\n'),
            }

            if let Some(help) = &v.help {
                out.push_str(&format!("  - help: {}\n", help));
            }
        }
    }

    // In check mode every change is already listed as a violation.
    if report.data.mode == "fix" && !report.changes.is_empty() {
        out.push_str("\n## Changes\n\n");
        out.push_str("| Workspace | Field | Before | After |\n");
        out.push_str("|---|---|---|---|\n");
        for c in &report.changes {
            out.push_str(&format!(
                "| `{}` | `{}` | {} | {} |\n",
                c.workspace,
                c.field,
                cell(c.before.as_deref()),
                cell(c.after.as_deref())
            ));
        }
    }

    out
}

fn cell(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("`{}`", v.replace('|', "\\|")),
        None => "(absent)".to_string(),
    }
}

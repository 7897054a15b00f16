use crate::error::ProjectError;
use crate::manifest::FieldPath;
use crate::model::{Dependency, DependencyQuery, Workspace};
use crate::policy::{EffectiveConfig, FailOn, Mode};
use crate::project::Project;
use crate::report::{DomainReport, SeverityCounts};
use crate::rules::{self, Reporter};
use monoguard_types::{
    Location, ManifestChange, MonoguardData, RepoPath, Severity, Verdict, Violation, ids,
};
use serde_json::{Value, json};

/// Project wrapper that records every effective write as a [`ManifestChange`].
///
/// Repeated writes to the same field within one recorder collapse into a single change from
/// the original value to the final one; a field that ends where it started leaves no change.
pub struct Recorder<'a> {
    inner: &'a mut dyn Project,
    rule_id: &'static str,
    changes: Vec<ManifestChange>,
}

impl<'a> Recorder<'a> {
    pub fn new(inner: &'a mut dyn Project, rule_id: &'static str) -> Self {
        Self {
            inner,
            rule_id,
            changes: Vec::new(),
        }
    }

    pub fn into_changes(self) -> Vec<ManifestChange> {
        self.changes
    }

    fn record(&mut self, cwd: &RepoPath, path: &FieldPath, before: Option<Value>, after: Option<Value>) {
        let field = path.to_string();
        if let Some(pos) = self
            .changes
            .iter()
            .position(|c| &c.workspace == cwd && c.field == field)
        {
            if self.changes[pos].before == after {
                self.changes.remove(pos);
            } else {
                self.changes[pos].after = after;
            }
            return;
        }
        if before != after {
            self.changes.push(ManifestChange {
                rule_id: self.rule_id.to_string(),
                workspace: cwd.clone(),
                field,
                before,
                after,
            });
        }
    }
}

impl Project for Recorder<'_> {
    fn workspaces(&self) -> Vec<Workspace> {
        self.inner.workspaces()
    }

    fn dependencies(&self, query: &DependencyQuery<'_>) -> Vec<Dependency> {
        self.inner.dependencies(query)
    }

    fn field(&self, cwd: &RepoPath, path: &FieldPath) -> Option<Value> {
        self.inner.field(cwd, path)
    }

    fn set_field(
        &mut self,
        cwd: &RepoPath,
        path: &FieldPath,
        value: Option<Value>,
    ) -> Result<(), ProjectError> {
        let before = self.inner.field(cwd, path);
        self.inner.set_field(cwd, path, value)?;
        let after = self.inner.field(cwd, path);
        self.record(cwd, path, before, after);
        Ok(())
    }

    fn is_workspace(&self, ident: &str) -> bool {
        self.inner.is_workspace(ident)
    }
}

/// Upper bound on rule passes per evaluation.
const MAX_PASSES: usize = 8;

/// A change net of the whole evaluation, with the severity it is reported at in check mode.
///
/// Deletions made by the forbid rule carry no severity: that rule reports its own violations.
struct NetChange {
    change: ManifestChange,
    severity: Option<Severity>,
}

/// Run every enabled rule against `project`, in a fixed order, and summarize the outcome.
///
/// Order: forbid, pinned ranges, workspace protocol, consistency, peer presence, fields.
/// Each rule observes the mutations of the rules before it. A later rule can disturb what an
/// earlier one settled, so the rules are rerun until a pass leaves the project unchanged.
/// Changes are reported net of the whole evaluation: a field is compared with its value
/// before the first pass and credited to the last rule that wrote it. In [`Mode::Check`] each
/// net change is also reported as a violation of that rule.
pub fn evaluate(
    project: &mut dyn Project,
    cfg: &EffectiveConfig,
    mode: Mode,
) -> Result<DomainReport, ProjectError> {
    let workspaces_scanned = project.workspaces().len() as u32;
    let dependencies_scanned = project.dependencies(&DependencyQuery::all()).len() as u32;

    let mut violations: Vec<Violation> = Vec::new();
    let mut net = run_pass(project, cfg, &mut violations)?;

    let mut passes = 1;
    let mut settled = net.is_empty();
    while !settled && passes < MAX_PASSES {
        // Violations repeat on every pass; only the first pass reports them.
        let mut repeated = Vec::new();
        let pass = run_pass(project, cfg, &mut repeated)?;
        settled = pass.is_empty();
        for entry in pass {
            merge_change(&mut net, entry);
        }
        passes += 1;
    }
    if !settled {
        tracing::warn!(passes, "rules did not settle; later runs may report more changes");
    }

    if mode == Mode::Check {
        violations.extend(
            net.iter()
                .filter_map(|n| n.severity.map(|sev| change_violation(&n.change, sev))),
        );
    }
    let changes: Vec<ManifestChange> = net.into_iter().map(|n| n.change).collect();

    // Deterministic ordering before truncation.
    violations.sort_by(compare_violations);

    let total = violations.len() as u32;

    let mut emitted = violations;
    let mut truncated_reason: Option<String> = None;
    if emitted.len() > cfg.max_violations {
        emitted.truncate(cfg.max_violations);
        truncated_reason = Some(format!(
            "violations truncated to max_violations={}",
            cfg.max_violations
        ));
    }

    let verdict = compute_verdict(&emitted, cfg.fail_on);
    let counts = SeverityCounts::from_violations(&emitted);

    tracing::info!(
        mode = mode.as_str(),
        passes,
        violations = total,
        changes = changes.len(),
        "evaluation complete"
    );

    let data = MonoguardData {
        mode: mode.as_str().to_string(),
        profile: cfg.profile.clone(),
        workspaces_scanned,
        dependencies_scanned,
        violations_total: total,
        violations_emitted: emitted.len() as u32,
        changes_total: changes.len() as u32,
        truncated_reason,
    };

    Ok(DomainReport {
        verdict,
        violations: emitted,
        changes,
        data,
        counts,
    })
}

/// One run of every enabled rule. Returns the changes of this pass, net across its rules.
fn run_pass(
    project: &mut dyn Project,
    cfg: &EffectiveConfig,
    violations: &mut Vec<Violation>,
) -> Result<Vec<NetChange>, ProjectError> {
    let mut net: Vec<NetChange> = Vec::new();

    if let Some(policy) = cfg.forbidden.active() {
        let mut recorder = Recorder::new(project, ids::RULE_DEPS_FORBIDDEN);
        let mut reporter = Reporter::new(ids::RULE_DEPS_FORBIDDEN, policy.severity, violations);
        rules::forbid(&mut recorder, &policy.options, &mut reporter)?;
        collect(recorder, None, &mut net);
    }

    if let Some(policy) = cfg.pinned_ranges.active() {
        let mut recorder = Recorder::new(project, ids::RULE_DEPS_PINNED_RANGES);
        rules::pin_ranges(&mut recorder, &policy.options)?;
        collect(recorder, Some(policy.severity), &mut net);
    }

    if let Some(policy) = cfg.workspace_protocol.active() {
        let mut recorder = Recorder::new(project, ids::RULE_DEPS_WORKSPACE_PROTOCOL);
        rules::enforce_workspace_protocol(&mut recorder, &policy.options)?;
        collect(recorder, Some(policy.severity), &mut net);
    }

    if let Some(policy) = cfg.consistency.active() {
        let mut recorder = Recorder::new(project, ids::RULE_DEPS_CONSISTENT_RANGES);
        rules::reconcile(&mut recorder, &policy.options)?;
        collect(recorder, Some(policy.severity), &mut net);
    }

    if let Some(policy) = cfg.peer_presence.active() {
        let mut recorder = Recorder::new(project, ids::RULE_DEPS_PEER_PRESENCE);
        let mut reporter = Reporter::new(ids::RULE_DEPS_PEER_PRESENCE, policy.severity, violations);
        rules::enforce_peer_presence(&mut recorder, &policy.options, &mut reporter)?;
        collect(recorder, Some(policy.severity), &mut net);
    }

    if let Some(policy) = cfg.fields.active() {
        let mut recorder = Recorder::new(project, ids::RULE_MANIFEST_FIELDS);
        rules::set_fields(&mut recorder, &policy.options)?;
        collect(recorder, Some(policy.severity), &mut net);
    }

    Ok(net)
}

fn collect(recorder: Recorder<'_>, severity: Option<Severity>, net: &mut Vec<NetChange>) {
    for change in recorder.into_changes() {
        merge_change(net, NetChange { change, severity });
    }
}

/// Fold `next` into `net`. A field keeps its earliest `before`; a field that ends where it
/// started drops out.
fn merge_change(net: &mut Vec<NetChange>, next: NetChange) {
    let existing = net.iter().position(|n| {
        n.change.workspace == next.change.workspace && n.change.field == next.change.field
    });
    let Some(pos) = existing else {
        net.push(next);
        return;
    };
    if net[pos].change.before == next.change.after {
        net.remove(pos);
        return;
    }
    let entry = &mut net[pos];
    entry.change.after = next.change.after;
    entry.change.rule_id = next.change.rule_id;
    entry.severity = next.severity;
}

fn change_violation(change: &ManifestChange, severity: Severity) -> Violation {
    let (code, help) = match change.rule_id.as_str() {
        ids::RULE_DEPS_CONSISTENT_RANGES => (
            ids::CODE_RANGE_MISMATCH,
            "Use the same range as the other declarations of this package.",
        ),
        ids::RULE_DEPS_WORKSPACE_PROTOCOL => (
            ids::CODE_MISSING_WORKSPACE_PROTOCOL,
            "Depend on workspaces through the workspace protocol.",
        ),
        ids::RULE_DEPS_PINNED_RANGES => (
            ids::CODE_RANGE_NOT_PINNED,
            "Use the range pinned in the configuration.",
        ),
        ids::RULE_DEPS_PEER_PRESENCE => (
            ids::CODE_UNDECLARED_PEER,
            "Declare the peer dependency required by one of this workspace's dependencies.",
        ),
        _ => (
            ids::CODE_FIELD_MISMATCH,
            "Set the field to the configured value.",
        ),
    };

    let message = match (&change.before, &change.after) {
        (Some(before), Some(after)) => format!(
            "{} in {} is {} but should be {}",
            change.field,
            change.workspace,
            display_value(before),
            display_value(after)
        ),
        (None, Some(after)) => format!(
            "{} is missing in {} (expected {})",
            change.field,
            change.workspace,
            display_value(after)
        ),
        (Some(before), None) => format!(
            "{} in {} should be removed (found {})",
            change.field,
            change.workspace,
            display_value(before)
        ),
        (None, None) => format!("{} in {} is out of sync", change.field, change.workspace),
    };

    Violation {
        severity,
        rule_id: change.rule_id.clone(),
        code: code.to_string(),
        message,
        location: Some(Location {
            path: change.workspace.join("package.json"),
            field: Some(change.field.clone()),
        }),
        help: Some(help.to_string()),
        fingerprint: Some(crate::fingerprint::fingerprint_for(
            &change.rule_id,
            code,
            change.workspace.as_str(),
            &change.field,
            None,
        )),
        data: json!({
            "field": change.field,
            "workspace": change.workspace.as_str(),
            "found": change.before,
            "expected": change.after,
        }),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

fn compute_verdict(violations: &[Violation], fail_on: FailOn) -> Verdict {
    let has_error = violations.iter().any(|v| v.severity == Severity::Error);
    if has_error {
        return Verdict::Fail;
    }

    let has_warn = violations.iter().any(|v| v.severity == Severity::Warning);
    if has_warn {
        return match fail_on {
            FailOn::Warning => Verdict::Fail,
            FailOn::Error => Verdict::Warn,
        };
    }

    Verdict::Pass
}

fn compare_violations(a: &Violation, b: &Violation) -> std::cmp::Ordering {
    // Ordering priority:
    // 1) severity (error -> warning -> info)
    // 2) location.path (missing last)
    // 3) location.field (missing last)
    // 4) rule_id
    // 5) code
    // 6) message
    let severity_rank = |sev: Severity| match sev {
        Severity::Error => 0,
        Severity::Warning => 1,
        Severity::Info => 2,
    };
    let (ap, af) = match &a.location {
        Some(l) => (l.path.as_str(), l.field.as_deref().unwrap_or("~")),
        None => ("~", "~"),
    };
    let (bp, bf) = match &b.location {
        Some(l) => (l.path.as_str(), l.field.as_deref().unwrap_or("~")),
        None => ("~", "~"),
    };

    severity_rank(a.severity)
        .cmp(&severity_rank(b.severity))
        .then(ap.cmp(bp))
        .then(af.cmp(bf))
        .then(a.rule_id.cmp(&b.rule_id))
        .then(a.code.cmp(&b.code))
        .then(a.message.cmp(&b.message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::DepType;
    use crate::policy::RulePolicy;
    use crate::project::InMemoryProject;
    use crate::test_support::{config_only, range_of, resolution, workspace};
    use std::collections::BTreeMap;

    fn project() -> InMemoryProject {
        InMemoryProject::new(vec![
            workspace(
                "packages/a",
                json!({ "name": "a", "dependencies": { "pkg": "^1.0.0", "left-pad": "^1.3.0" } }),
            ),
            workspace(
                "packages/b",
                json!({ "name": "b", "dependencies": { "pkg": "^2.0.0", "a": "^0.1.0" } }),
            ),
        ])
    }

    #[test]
    fn check_mode_reports_changes_as_violations() {
        let mut project = project();
        let cfg = EffectiveConfig::default();

        let report = evaluate(&mut project, &cfg, Mode::Check).expect("evaluate");

        assert_eq!(report.verdict, Verdict::Fail);
        let codes: Vec<&str> = report.violations.iter().map(|v| v.code.as_str()).collect();
        assert!(codes.contains(&ids::CODE_RANGE_MISMATCH));
        assert!(codes.contains(&ids::CODE_MISSING_WORKSPACE_PROTOCOL));
        assert_eq!(report.data.mode, "check");
        assert_eq!(report.data.workspaces_scanned, 2);
        assert_eq!(report.data.dependencies_scanned, 4);
        assert_eq!(report.changes.len(), report.violations.len());
    }

    #[test]
    fn fix_mode_records_changes_without_violations() {
        let mut project = project();
        let cfg = EffectiveConfig::default();

        let report = evaluate(&mut project, &cfg, Mode::Fix).expect("evaluate");

        assert_eq!(report.verdict, Verdict::Pass);
        assert!(report.violations.is_empty());
        assert_eq!(report.changes.len(), 2);
        let b = project.workspace(&RepoPath::new("packages/b")).expect("b");
        assert_eq!(b.manifest.dependency(DepType::Runtime, "a"), Some("workspace:^"));
    }

    #[test]
    fn second_fix_run_is_a_noop() {
        let mut project = project();
        let cfg = EffectiveConfig::default();
        evaluate(&mut project, &cfg, Mode::Fix).expect("first");
        let report = evaluate(&mut project, &cfg, Mode::Check).expect("second");
        assert!(report.changes.is_empty());
        assert_eq!(report.verdict, Verdict::Pass);
    }

    /// `a` needs react as a peer of ui-kit; the last supplier is an optional edge that
    /// consistency does not align, so consistency and peer presence disagree on `a`.
    fn contested_peer_project() -> InMemoryProject {
        InMemoryProject::new(vec![
            workspace("packages/a", json!({ "name": "a", "dependencies": { "ui-kit": "^1.0.0" } })),
            workspace("packages/b", json!({ "name": "b", "dependencies": { "react": "^18.0.0" } })),
            workspace(
                "packages/c",
                json!({ "name": "c", "optionalDependencies": { "react": "^17.0.0" } }),
            ),
        ])
        .with_install(RepoPath::new("."), "ui-kit", resolution(&[], &[("react", "*")]))
    }

    #[test]
    fn contested_field_settles_within_one_fix() {
        let mut project = contested_peer_project();
        let cfg = EffectiveConfig::default();

        let fixed = evaluate(&mut project, &cfg, Mode::Fix).expect("fix");
        assert_eq!(fixed.changes.len(), 1);
        assert_eq!(fixed.changes[0].rule_id, ids::RULE_DEPS_PEER_PRESENCE);
        assert_eq!(fixed.changes[0].before, None);
        assert_eq!(
            range_of(&project, "packages/a", "dependencies", "react").as_deref(),
            Some("^17.0.0")
        );

        let again = evaluate(&mut project, &cfg, Mode::Fix).expect("second fix");
        assert!(again.changes.is_empty(), "second fix changed {:?}", again.changes);

        let check = evaluate(&mut project, &cfg, Mode::Check).expect("check");
        assert_eq!(check.verdict, Verdict::Pass);
        assert!(check.violations.is_empty());
    }

    #[test]
    fn check_reports_one_net_violation_per_field() {
        let mut project = contested_peer_project();
        let report = evaluate(&mut project, &EffectiveConfig::default(), Mode::Check)
            .expect("check");

        let fields: Vec<&str> = report
            .violations
            .iter()
            .filter_map(|v| v.location.as_ref().and_then(|l| l.field.as_deref()))
            .collect();
        assert_eq!(fields, vec!["dependencies.react"]);
        assert_eq!(report.violations[0].code, ids::CODE_UNDECLARED_PEER);
    }

    #[test]
    fn change_undone_by_a_later_rule_is_dropped() {
        let mut net = Vec::new();
        let change = |rule: &str, before: Option<Value>, after: Option<Value>| NetChange {
            change: ManifestChange {
                rule_id: rule.to_string(),
                workspace: RepoPath::new("packages/a"),
                field: "dependencies.react".to_string(),
                before,
                after,
            },
            severity: Some(Severity::Error),
        };

        merge_change(&mut net, change(ids::RULE_DEPS_CONSISTENT_RANGES, Some(json!("^17.0.0")), Some(json!("^18.0.0"))));
        merge_change(&mut net, change(ids::RULE_DEPS_PEER_PRESENCE, Some(json!("^18.0.0")), Some(json!("^19.0.0"))));
        assert_eq!(net.len(), 1);
        assert_eq!(net[0].change.rule_id, ids::RULE_DEPS_PEER_PRESENCE);
        assert_eq!(net[0].change.before, Some(json!("^17.0.0")));
        assert_eq!(net[0].change.after, Some(json!("^19.0.0")));

        merge_change(&mut net, change(ids::RULE_DEPS_CONSISTENT_RANGES, Some(json!("^19.0.0")), Some(json!("^17.0.0"))));
        assert!(net.is_empty());
    }

    #[test]
    fn forbidden_is_reported_once_per_edge_in_both_modes() {
        for mode in [Mode::Check, Mode::Fix] {
            let mut project = project();
            let cfg = EffectiveConfig {
                forbidden: RulePolicy {
                    enabled: true,
                    severity: Severity::Error,
                    options: vec!["left-pad".to_string()],
                },
                ..config_only()
            };
            let report = evaluate(&mut project, &cfg, mode).expect("evaluate");
            assert_eq!(report.violations.len(), 1);
            assert_eq!(report.violations[0].code, ids::CODE_FORBIDDEN_DEPENDENCY);
            assert_eq!(report.changes.len(), 1);
            assert_eq!(report.changes[0].after, None);
        }
    }

    #[test]
    fn warnings_fail_only_with_fail_on_warning() {
        let mut cfg = EffectiveConfig {
            pinned_ranges: RulePolicy {
                enabled: true,
                severity: Severity::Warning,
                options: BTreeMap::from([("pkg".to_string(), "^3.0.0".to_string())]),
            },
            ..config_only()
        };

        let report = evaluate(&mut project(), &cfg, Mode::Check).expect("evaluate");
        assert_eq!(report.verdict, Verdict::Warn);
        assert_eq!(report.counts.warning, 2);

        cfg.fail_on = FailOn::Warning;
        let report = evaluate(&mut project(), &cfg, Mode::Check).expect("evaluate");
        assert_eq!(report.verdict, Verdict::Fail);
    }

    #[test]
    fn truncation_is_recorded() {
        let mut cfg = EffectiveConfig::default();
        cfg.max_violations = 1;
        let report = evaluate(&mut project(), &cfg, Mode::Check).expect("evaluate");
        assert_eq!(report.violations.len(), 1);
        assert!(report.data.violations_total > 1);
        assert_eq!(
            report.data.truncated_reason.as_deref(),
            Some("violations truncated to max_violations=1")
        );
    }

    #[test]
    fn recorder_collapses_repeated_writes() {
        let mut inner = project();
        let cwd = RepoPath::new("packages/a");
        let path = FieldPath::dependency(DepType::Runtime, "pkg");
        let mut recorder = Recorder::new(&mut inner, ids::RULE_DEPS_PEER_PRESENCE);

        recorder.set_field(&cwd, &path, Some(json!("^2.0.0"))).expect("set");
        recorder.set_field(&cwd, &path, Some(json!("^3.0.0"))).expect("set");
        let changes = recorder.into_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].before, Some(json!("^1.0.0")));
        assert_eq!(changes[0].after, Some(json!("^3.0.0")));
    }

    #[test]
    fn recorder_drops_writes_that_return_to_the_original() {
        let mut inner = project();
        let cwd = RepoPath::new("packages/a");
        let path = FieldPath::dependency(DepType::Runtime, "pkg");
        let mut recorder = Recorder::new(&mut inner, ids::RULE_DEPS_PEER_PRESENCE);

        recorder.set_field(&cwd, &path, Some(json!("^2.0.0"))).expect("set");
        recorder.set_field(&cwd, &path, Some(json!("^1.0.0"))).expect("set");
        assert!(recorder.into_changes().is_empty());
    }

    #[test]
    fn violations_are_sorted_deterministically() {
        let mut a = EffectiveConfig::default();
        a.max_violations = 50;
        let first = evaluate(&mut project(), &a, Mode::Check).expect("evaluate");
        let second = evaluate(&mut project(), &a, Mode::Check).expect("evaluate");
        assert_eq!(first.violations, second.violations);
        let paths: Vec<String> = first
            .violations
            .iter()
            .map(|v| v.location.as_ref().expect("location").path.as_str().to_string())
            .collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }
}

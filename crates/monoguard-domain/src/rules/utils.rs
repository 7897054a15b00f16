use crate::fingerprint::fingerprint_for;
use crate::model::Dependency;
use crate::project::Project;
use monoguard_types::{Location, RepoPath, Severity, Violation};
use serde_json::Value;
use std::collections::BTreeSet;

/// Whether an edge points at a workspace of the monorepo or at a registry package.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Workspace,
    External,
}

/// Snapshot of workspace identities, taken once per rule invocation.
#[derive(Clone, Debug, Default)]
pub struct IdentityClassifier {
    names: BTreeSet<String>,
}

impl IdentityClassifier {
    pub fn from_project(project: &dyn Project) -> Self {
        let names = project
            .workspaces()
            .iter()
            .filter_map(|w| w.name().map(str::to_string))
            .collect();
        Self { names }
    }

    pub fn is_workspace(&self, ident: &str) -> bool {
        self.names.contains(ident)
    }

    pub fn classify(&self, ident: &str) -> Target {
        if self.is_workspace(ident) {
            Target::Workspace
        } else {
            Target::External
        }
    }
}

/// Violation sink for one rule: attaches messages to an edge or to a workspace.
pub struct Reporter<'a> {
    rule_id: &'static str,
    severity: Severity,
    out: &'a mut Vec<Violation>,
}

impl<'a> Reporter<'a> {
    pub fn new(rule_id: &'static str, severity: Severity, out: &'a mut Vec<Violation>) -> Self {
        Self {
            rule_id,
            severity,
            out,
        }
    }

    pub fn rule_id(&self) -> &'static str {
        self.rule_id
    }

    pub fn on_dependency(
        &mut self,
        dep: &Dependency,
        code: &str,
        message: String,
        help: &str,
        data: Value,
    ) {
        let field = dep.field_path().to_string();
        let fingerprint = fingerprint_for(
            self.rule_id,
            code,
            dep.workspace.as_str(),
            &field,
            None,
        );
        self.push(&dep.workspace, Some(field), code, message, help, fingerprint, data);
    }

    /// `subject` and `detail` feed the fingerprint (e.g. the missing peer and its requirer).
    #[allow(clippy::too_many_arguments)]
    pub fn on_workspace(
        &mut self,
        cwd: &RepoPath,
        subject: &str,
        detail: Option<&str>,
        code: &str,
        message: String,
        help: &str,
        data: Value,
    ) {
        let fingerprint = fingerprint_for(self.rule_id, code, cwd.as_str(), subject, detail);
        self.push(cwd, None, code, message, help, fingerprint, data);
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        cwd: &RepoPath,
        field: Option<String>,
        code: &str,
        message: String,
        help: &str,
        fingerprint: String,
        data: Value,
    ) {
        self.out.push(Violation {
            severity: self.severity,
            rule_id: self.rule_id.to_string(),
            code: code.to_string(),
            message,
            location: Some(Location {
                path: cwd.join("package.json"),
                field,
            }),
            help: Some(help.to_string()),
            fingerprint: Some(fingerprint),
            data,
        });
    }
}

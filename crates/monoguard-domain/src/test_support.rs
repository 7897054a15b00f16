use crate::manifest::Manifest;
use crate::model::{Resolution, Workspace};
use crate::policy::{EffectiveConfig, RulePolicy};
use crate::project::InMemoryProject;
use monoguard_types::RepoPath;
use serde_json::Value;

pub fn workspace(cwd: &str, manifest: Value) -> Workspace {
    Workspace::new(
        RepoPath::new(cwd),
        Manifest::from_value(manifest).expect("manifest must be a JSON object"),
    )
}

pub fn resolution(deps: &[(&str, &str)], peers: &[(&str, &str)]) -> Resolution {
    Resolution {
        dependencies: deps
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        peer_dependencies: peers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

pub fn project(workspaces: Vec<(&str, Value)>) -> InMemoryProject {
    InMemoryProject::new(
        workspaces
            .into_iter()
            .map(|(cwd, manifest)| workspace(cwd, manifest))
            .collect(),
    )
}

/// Range declared by `cwd` for `ident` under `field` (e.g. `dependencies`).
pub fn range_of(project: &InMemoryProject, cwd: &str, field: &str, ident: &str) -> Option<String> {
    project
        .workspace(&RepoPath::new(cwd))
        .and_then(|w| w.manifest.as_map().get(field))
        .and_then(|deps| deps.get(ident))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Every rule disabled; tests enable what they exercise.
pub fn config_only() -> EffectiveConfig {
    EffectiveConfig {
        consistency: RulePolicy::disabled(),
        workspace_protocol: RulePolicy::disabled(),
        peer_presence: RulePolicy::disabled(),
        ..EffectiveConfig::default()
    }
}

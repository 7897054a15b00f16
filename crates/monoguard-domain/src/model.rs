use crate::error::ProjectError;
use crate::manifest::{DepType, FieldPath, Manifest};
use crate::project::Project;
use monoguard_types::RepoPath;
use serde_json::Value;
use std::collections::BTreeMap;

/// A locally-owned package of the monorepo.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workspace {
    /// Repo-relative directory of the workspace (`.` for the root).
    pub cwd: RepoPath,
    pub manifest: Manifest,
}

impl Workspace {
    pub fn new(cwd: RepoPath, manifest: Manifest) -> Self {
        Self { cwd, manifest }
    }

    pub fn name(&self) -> Option<&str> {
        self.manifest.name()
    }

    pub fn manifest_path(&self) -> RepoPath {
        self.cwd.join("package.json")
    }
}

/// What an edge's target actually resolved to in the installed graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub dependencies: BTreeMap<String, String>,
    pub peer_dependencies: BTreeMap<String, String>,
}

impl Resolution {
    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self {
            dependencies: manifest
                .dependencies(DepType::Runtime)
                .into_iter()
                .collect(),
            peer_dependencies: manifest.dependencies(DepType::Peer).into_iter().collect(),
        }
    }
}

/// A declared edge `(workspace, ident, type, range)`.
///
/// This is a snapshot: mutating it goes through the [`Project`] that produced it, and the
/// snapshot itself is not refreshed.
#[derive(Clone, Debug, PartialEq)]
pub struct Dependency {
    pub workspace: RepoPath,
    pub workspace_name: Option<String>,
    pub ident: String,
    pub dep_type: DepType,
    pub range: String,
    pub resolution: Option<Resolution>,
}

impl Dependency {
    pub fn field_path(&self) -> FieldPath {
        FieldPath::dependency(self.dep_type, &self.ident)
    }

    /// Rewrite the declared range in the owning workspace's manifest.
    pub fn update(&self, project: &mut dyn Project, range: &str) -> Result<(), ProjectError> {
        project.set_field(
            &self.workspace,
            &self.field_path(),
            Some(Value::String(range.to_string())),
        )
    }

    /// Remove the declaration from the owning workspace's manifest.
    pub fn delete(&self, project: &mut dyn Project) -> Result<(), ProjectError> {
        project.set_field(&self.workspace, &self.field_path(), None)
    }
}

/// Filter for [`Project::dependencies`]. Unset fields match everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct DependencyQuery<'a> {
    pub ident: Option<&'a str>,
    pub workspace: Option<&'a RepoPath>,
    pub dep_type: Option<DepType>,
}

impl<'a> DependencyQuery<'a> {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn ident(mut self, ident: &'a str) -> Self {
        self.ident = Some(ident);
        self
    }

    pub fn workspace(mut self, cwd: &'a RepoPath) -> Self {
        self.workspace = Some(cwd);
        self
    }

    pub fn dep_type(mut self, dep_type: DepType) -> Self {
        self.dep_type = Some(dep_type);
        self
    }

    pub fn matches_workspace(&self, cwd: &RepoPath) -> bool {
        self.workspace.is_none_or(|w| w == cwd)
    }

    pub fn matches_edge(&self, ident: &str, dep_type: DepType) -> bool {
        self.ident.is_none_or(|i| i == ident) && self.dep_type.is_none_or(|t| t == dep_type)
    }
}

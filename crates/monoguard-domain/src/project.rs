//! The graph provider / manifest setter seam, plus an in-memory implementation.

use crate::error::ProjectError;
use crate::manifest::{DepType, FieldPath};
use crate::model::{Dependency, DependencyQuery, Resolution, Workspace};
use monoguard_types::RepoPath;
use serde_json::Value;
use std::collections::BTreeMap;

/// Live view of the monorepo that rules read from and write to.
///
/// Query methods return independent snapshots, so callers may mutate the project while
/// iterating a result. Writes are visible to every later query.
pub trait Project {
    /// All workspaces, in a stable order.
    fn workspaces(&self) -> Vec<Workspace>;

    /// Dependency edges matching `query`, in a stable order.
    fn dependencies(&self, query: &DependencyQuery<'_>) -> Vec<Dependency>;

    /// Current value of a manifest field, if present.
    fn field(&self, cwd: &RepoPath, path: &FieldPath) -> Option<Value>;

    /// Set (`Some`) or remove (`None`) a manifest field.
    fn set_field(
        &mut self,
        cwd: &RepoPath,
        path: &FieldPath,
        value: Option<Value>,
    ) -> Result<(), ProjectError>;

    /// Whether `ident` names one of the workspaces.
    fn is_workspace(&self, ident: &str) -> bool {
        self.workspaces().iter().any(|w| w.name() == Some(ident))
    }
}

/// A fully materialized project.
///
/// Workspaces are kept sorted by `cwd`; edges are enumerated by workspace, then by
/// [`DepType::ALL`] order, then in manifest key order.
///
/// External packages resolve through install roots: the lookup starts at the owning
/// workspace's directory and walks up to the repository root, the way `node_modules`
/// hoisting works.
#[derive(Clone, Debug, Default)]
pub struct InMemoryProject {
    workspaces: Vec<Workspace>,
    installs: BTreeMap<RepoPath, BTreeMap<String, Resolution>>,
}

impl InMemoryProject {
    pub fn new(mut workspaces: Vec<Workspace>) -> Self {
        workspaces.sort_by(|a, b| a.cwd.cmp(&b.cwd));
        workspaces.dedup_by(|a, b| a.cwd == b.cwd);
        Self {
            workspaces,
            installs: BTreeMap::new(),
        }
    }

    /// Register package metadata installed under `install_root`.
    pub fn insert_install(&mut self, install_root: RepoPath, ident: &str, resolution: Resolution) {
        self.installs
            .entry(install_root)
            .or_default()
            .insert(ident.to_string(), resolution);
    }

    pub fn with_install(mut self, install_root: RepoPath, ident: &str, resolution: Resolution) -> Self {
        self.insert_install(install_root, ident, resolution);
        self
    }

    pub fn workspace(&self, cwd: &RepoPath) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| &w.cwd == cwd)
    }

    pub fn workspaces_ref(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn into_workspaces(self) -> Vec<Workspace> {
        self.workspaces
    }

    fn resolve(&self, from: &RepoPath, ident: &str) -> Option<Resolution> {
        if let Some(target) = self.workspaces.iter().find(|w| w.name() == Some(ident)) {
            return Some(Resolution::from_manifest(&target.manifest));
        }

        let mut dir = Some(from.clone());
        while let Some(current) = dir {
            if let Some(found) = self.installs.get(&current).and_then(|pkgs| pkgs.get(ident)) {
                return Some(found.clone());
            }
            dir = current.parent();
        }
        None
    }
}

impl Project for InMemoryProject {
    fn workspaces(&self) -> Vec<Workspace> {
        self.workspaces.clone()
    }

    fn dependencies(&self, query: &DependencyQuery<'_>) -> Vec<Dependency> {
        let mut out = Vec::new();
        for ws in self
            .workspaces
            .iter()
            .filter(|w| query.matches_workspace(&w.cwd))
        {
            for dep_type in DepType::ALL {
                for (ident, range) in ws.manifest.dependencies(dep_type) {
                    if !query.matches_edge(&ident, dep_type) {
                        continue;
                    }
                    let resolution = self.resolve(&ws.cwd, &ident);
                    out.push(Dependency {
                        workspace: ws.cwd.clone(),
                        workspace_name: ws.name().map(str::to_string),
                        ident,
                        dep_type,
                        range,
                        resolution,
                    });
                }
            }
        }
        out
    }

    fn field(&self, cwd: &RepoPath, path: &FieldPath) -> Option<Value> {
        self.workspace(cwd)
            .and_then(|w| w.manifest.field(path))
            .cloned()
    }

    fn set_field(
        &mut self,
        cwd: &RepoPath,
        path: &FieldPath,
        value: Option<Value>,
    ) -> Result<(), ProjectError> {
        let ws = self
            .workspaces
            .iter_mut()
            .find(|w| &w.cwd == cwd)
            .ok_or_else(|| ProjectError::UnknownWorkspace { cwd: cwd.clone() })?;
        ws.manifest
            .set_field(path, value)
            .map_err(|e| ProjectError::NotAnObject {
                cwd: cwd.clone(),
                field: e.field,
            })
    }

    fn is_workspace(&self, ident: &str) -> bool {
        self.workspaces.iter().any(|w| w.name() == Some(ident))
    }
}

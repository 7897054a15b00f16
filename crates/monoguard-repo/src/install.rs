use crate::parse::parse_resolution;
use camino::Utf8Path;
use monoguard_domain::{DependencyQuery, InMemoryProject, Project};
use monoguard_types::RepoPath;
use std::collections::BTreeSet;

/// Register the installed metadata of every declared external package.
///
/// Install roots are every workspace directory and its ancestors up to the repository root,
/// which is where a node-style resolver would look. Missing packages are skipped; unreadable
/// metadata is logged and skipped.
pub(crate) fn load_installs(repo_root: &Utf8Path, project: &mut InMemoryProject) {
    let idents: BTreeSet<String> = project
        .dependencies(&DependencyQuery::all())
        .into_iter()
        .filter(|d| !project.is_workspace(&d.ident))
        .map(|d| d.ident)
        .filter(|ident| {
            let valid = is_package_name(ident);
            if !valid {
                tracing::warn!(ident = %ident, "skipping install lookup for invalid package name");
            }
            valid
        })
        .collect();

    let mut roots: BTreeSet<RepoPath> = BTreeSet::new();
    for ws in project.workspaces_ref() {
        let mut dir = Some(ws.cwd.clone());
        while let Some(current) = dir {
            dir = current.parent();
            roots.insert(current);
        }
    }

    let mut loaded = 0usize;
    for root in &roots {
        for ident in &idents {
            let rel = RepoPath::new(format!(
                "{}/node_modules/{}/package.json",
                root.as_str(),
                ident
            ));
            let abs = repo_root.join(rel.as_str());
            if !abs.is_file() {
                continue;
            }
            let parsed = std::fs::read_to_string(&abs)
                .map_err(anyhow::Error::from)
                .and_then(|text| parse_resolution(&rel, &text));
            match parsed {
                Ok(resolution) => {
                    project.insert_install(root.clone(), ident, resolution);
                    loaded += 1;
                }
                Err(err) => {
                    tracing::warn!(path = %rel, error = %format!("{err:#}"), "skipping unreadable package metadata");
                }
            }
        }
    }
    tracing::debug!(packages = loaded, "loaded installed package metadata");
}

/// Whether `ident` is a plain (`name`) or scoped (`@scope/name`) npm package name.
///
/// Only names of this shape map to a single directory under `node_modules`.
fn is_package_name(ident: &str) -> bool {
    let segment_ok = |s: &str| {
        !s.is_empty()
            && !s.starts_with('.')
            && !s.starts_with('_')
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
    };
    match ident.strip_prefix('@') {
        Some(scoped) => match scoped.split_once('/') {
            Some((scope, name)) => segment_ok(scope) && segment_ok(name),
            None => false,
        },
        None => segment_ok(ident),
    }
}

//! Repository adapters: discover workspaces, read and write `package.json` manifests.
//!
//! This crate is allowed to do filesystem IO. It does not run package managers; installed package
//! metadata is read from `node_modules` as it exists on disk.

#![forbid(unsafe_code)]

mod discover;
mod install;
mod parse;

use anyhow::Context;
use camino::Utf8Path;
use monoguard_domain::{InMemoryProject, Workspace};
use monoguard_types::{ManifestChange, RepoPath};
use std::collections::BTreeSet;

pub use discover::discover_workspaces;
pub use parse::{parse_manifest, parse_resolution, render_manifest};

/// Build the in-memory project used by the constraint engine.
///
/// `repo_root` is the directory containing the root `package.json`.
pub fn build_project(repo_root: &Utf8Path) -> anyhow::Result<InMemoryProject> {
    let cwds = discover::discover_workspaces(repo_root).context("discover workspaces")?;

    let mut workspaces = Vec::with_capacity(cwds.len());
    for cwd in cwds {
        let manifest_path = cwd.join("package.json");
        let abs = repo_root.join(manifest_path.as_str());
        let text = std::fs::read_to_string(&abs).with_context(|| format!("read {}", abs))?;
        let manifest = parse::parse_manifest(&manifest_path, &text)?;
        workspaces.push(Workspace::new(cwd, manifest));
    }
    tracing::debug!(workspaces = workspaces.len(), "parsed workspace manifests");

    let mut project = InMemoryProject::new(workspaces);
    install::load_installs(repo_root, &mut project);
    Ok(project)
}

/// Write back every workspace manifest touched by `changes`.
///
/// Returns the manifests written, in workspace order. A manifest whose serialized form is already
/// identical on disk is left alone.
pub fn persist_changes(
    repo_root: &Utf8Path,
    project: &InMemoryProject,
    changes: &[ManifestChange],
) -> anyhow::Result<Vec<RepoPath>> {
    let touched: BTreeSet<&RepoPath> = changes.iter().map(|c| &c.workspace).collect();

    let mut written = Vec::new();
    for ws in project.workspaces_ref() {
        if !touched.contains(&ws.cwd) {
            continue;
        }
        let manifest_path = ws.manifest_path();
        let abs = repo_root.join(manifest_path.as_str());
        let rendered = parse::render_manifest(&ws.manifest)
            .with_context(|| format!("serialize {}", manifest_path))?;

        let current = std::fs::read_to_string(&abs).ok();
        if current.as_deref() == Some(rendered.as_str()) {
            continue;
        }
        std::fs::write(&abs, rendered).with_context(|| format!("write {}", abs))?;
        tracing::info!(manifest = %manifest_path, "updated manifest");
        written.push(manifest_path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use monoguard_domain::{DependencyQuery, Project};
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    fn write_file(path: &Utf8Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write file");
    }

    #[test]
    fn build_project_reads_workspaces_and_installs() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);

        write_file(
            &root.join("package.json"),
            r#"{ "name": "root", "private": true, "workspaces": ["packages/*"] }"#,
        );
        write_file(
            &root.join("packages/a/package.json"),
            r#"{ "name": "a", "dependencies": { "ui-kit": "^1.0.0" } }"#,
        );
        write_file(
            &root.join("node_modules/ui-kit/package.json"),
            r#"{ "name": "ui-kit", "peerDependencies": { "react": "^18.0.0" } }"#,
        );

        let project = build_project(&root).expect("build project");
        let cwds: Vec<&str> = project
            .workspaces_ref()
            .iter()
            .map(|w| w.cwd.as_str())
            .collect();
        assert_eq!(cwds, vec![".", "packages/a"]);

        let edge = project
            .dependencies(&DependencyQuery::all().ident("ui-kit"))
            .pop()
            .expect("edge");
        let res = edge.resolution.expect("resolved through root node_modules");
        assert!(res.peer_dependencies.contains_key("react"));
    }

    #[test]
    fn build_project_fails_on_broken_member_manifest() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("package.json"), r#"{ "workspaces": ["packages/*"] }"#);
        write_file(&root.join("packages/a/package.json"), "{ nope");

        let err = build_project(&root).unwrap_err();
        assert!(format!("{err:#}").contains("packages/a/package.json"));
    }

    #[test]
    fn persist_writes_only_touched_manifests() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let original_b = "{\"name\":\"b\"}";
        write_file(&root.join("package.json"), r#"{ "workspaces": ["packages/*"] }"#);
        write_file(
            &root.join("packages/a/package.json"),
            r#"{"name":"a","dependencies":{"react":"^17.0.0"}}"#,
        );
        write_file(&root.join("packages/b/package.json"), original_b);

        let mut project = build_project(&root).expect("build");
        let edge = project
            .dependencies(&DependencyQuery::all().ident("react"))
            .pop()
            .expect("edge");
        edge.update(&mut project, "^18.0.0").expect("update");

        let changes = vec![ManifestChange {
            rule_id: "deps.pinned_ranges".to_string(),
            workspace: RepoPath::new("packages/a"),
            field: "dependencies.react".to_string(),
            before: Some(serde_json::json!("^17.0.0")),
            after: Some(serde_json::json!("^18.0.0")),
        }];
        let written = persist_changes(&root, &project, &changes).expect("persist");
        assert_eq!(written, vec![RepoPath::new("packages/a/package.json")]);

        let a = std::fs::read_to_string(root.join("packages/a/package.json")).expect("read a");
        assert_eq!(
            a,
            "{\n  \"name\": \"a\",\n  \"dependencies\": {\n    \"react\": \"^18.0.0\"\n  }\n}\n"
        );
        let b = std::fs::read_to_string(root.join("packages/b/package.json")).expect("read b");
        assert_eq!(b, original_b);

        // Nothing left to write.
        let again = persist_changes(&root, &project, &changes).expect("persist");
        assert!(again.is_empty());
    }

    proptest! {
        #[test]
        fn manifest_parser_never_panics(input in ".*") {
            let _ = parse_manifest(&RepoPath::new("package.json"), &input);
        }
    }
}

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSetBuilder};
use monoguard_types::RepoPath;
use serde::Deserialize;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Directories never searched for workspaces.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];

/// The `workspaces` field of the root `package.json`: either a list of globs or
/// `{ "packages": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkspacesField {
    Globs(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

#[derive(Debug, Deserialize)]
struct RootManifest {
    #[serde(default)]
    workspaces: Option<WorkspacesField>,
}

/// Discover the workspaces of the monorepo rooted at `repo_root`.
///
/// Behavior:
/// - The root directory is always a workspace (`.`).
/// - If the root `package.json` has `workspaces`, every directory containing a `package.json`
///   and matching one of its globs is a workspace; `!`-prefixed globs exclude.
/// - `node_modules` and `.git` are never searched.
pub fn discover_workspaces(repo_root: &Utf8Path) -> anyhow::Result<Vec<RepoPath>> {
    let root = repo_root.join("package.json");
    let text = std::fs::read_to_string(&root).with_context(|| format!("read {}", root))?;
    let manifest: RootManifest =
        serde_json::from_str(&text).with_context(|| format!("parse {}", root))?;

    let patterns = match manifest.workspaces {
        None => Vec::new(),
        Some(WorkspacesField::Globs(globs)) => globs,
        Some(WorkspacesField::Object { packages }) => packages,
    };

    let mut out: Vec<RepoPath> = vec![RepoPath::new(".")];
    if patterns.is_empty() {
        return Ok(out);
    }

    let (excludes, includes): (Vec<String>, Vec<String>) =
        patterns.into_iter().partition(|p| p.starts_with('!'));
    let excludes: Vec<String> = excludes
        .into_iter()
        .map(|p| p.trim_start_matches('!').to_string())
        .collect();

    let member_set = build_globset(&includes).context("compile workspaces globset")?;
    let exclude_set = build_globset(&excludes).context("compile workspace exclusions")?;

    let walker = WalkDir::new(repo_root).into_iter().filter_entry(|e| {
        e.depth() == 0
            || !e
                .file_name()
                .to_str()
                .is_some_and(|name| SKIPPED_DIRS.contains(&name))
    });

    for abs in walker
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == "package.json")
        .filter_map(|e| pathbuf_to_utf8(e.path().to_path_buf()))
    {
        let rel = abs
            .strip_prefix(repo_root)
            .unwrap_or(&abs)
            .as_str()
            .replace('\\', "/");
        let dir_rel = Utf8Path::new(&rel)
            .parent()
            .map(|p| p.as_str())
            .unwrap_or("");
        if dir_rel.is_empty() {
            continue;
        }

        let dir_rel = dir_rel.trim_start_matches("./");
        if member_set.is_match(dir_rel) && !exclude_set.is_match(dir_rel) {
            out.push(RepoPath::new(dir_rel));
        }
    }

    // Stable order.
    out.sort();
    out.dedup();

    Ok(out)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<globset::GlobSet> {
    let mut b = GlobSetBuilder::new();
    for p in patterns {
        // Workspace globs are relative directory paths; `packages/*/` means the same as `packages/*`.
        let p = p.trim_start_matches("./").trim_end_matches('/');
        b.add(Glob::new(p).with_context(|| format!("invalid workspace glob: {p}"))?);
    }
    Ok(b.build()?)
}

fn pathbuf_to_utf8(path: PathBuf) -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn paths(found: &[RepoPath]) -> Vec<&str> {
        found.iter().map(|p| p.as_str()).collect()
    }

    #[test]
    fn discover_without_workspaces_returns_root_only() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);

        write_file(&root.join("package.json"), r#"{ "name": "solo" }"#);
        write_file(&root.join("packages/a/package.json"), r#"{ "name": "a" }"#);

        let found = discover_workspaces(&root).expect("discover");
        assert_eq!(paths(&found), vec!["."]);
    }

    #[test]
    fn discover_globs_with_negation() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);

        write_file(
            &root.join("package.json"),
            r#"{ "private": true, "workspaces": ["packages/*", "tools/**", "!tools/skip*"] }"#,
        );
        write_file(&root.join("packages/a/package.json"), r#"{ "name": "a" }"#);
        write_file(&root.join("packages/b/package.json"), r#"{ "name": "b" }"#);
        write_file(&root.join("packages/no-manifest/README.md"), "hi");
        write_file(&root.join("tools/util/package.json"), r#"{ "name": "util" }"#);
        write_file(&root.join("tools/skip-this/package.json"), r#"{ "name": "skip" }"#);

        let found = discover_workspaces(&root).expect("discover");
        assert_eq!(
            paths(&found),
            vec![".", "packages/a", "packages/b", "tools/util"]
        );
    }

    #[test]
    fn discover_accepts_packages_object_form() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);

        write_file(
            &root.join("package.json"),
            r#"{ "workspaces": { "packages": ["apps/*"], "nohoist": ["**/react"] } }"#,
        );
        write_file(&root.join("apps/web/package.json"), r#"{ "name": "web" }"#);

        let found = discover_workspaces(&root).expect("discover");
        assert_eq!(paths(&found), vec![".", "apps/web"]);
    }

    #[test]
    fn discover_skips_node_modules() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);

        write_file(&root.join("package.json"), r#"{ "workspaces": ["**"] }"#);
        write_file(&root.join("packages/a/package.json"), r#"{ "name": "a" }"#);
        write_file(
            &root.join("node_modules/react/package.json"),
            r#"{ "name": "react" }"#,
        );
        write_file(
            &root.join("packages/a/node_modules/left-pad/package.json"),
            r#"{ "name": "left-pad" }"#,
        );

        let found = discover_workspaces(&root).expect("discover");
        assert_eq!(paths(&found), vec![".", "packages/a"]);
    }

    #[test]
    fn discover_requires_root_manifest() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        assert!(discover_workspaces(&root).is_err());
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("package.json"), r#"{ "workspaces": ["packages/["] }"#);
        let err = discover_workspaces(&root).unwrap_err();
        assert!(format!("{err:#}").contains("invalid workspace glob"));
    }
}

use anyhow::Context;
use monoguard_domain::{Manifest, Resolution};
use monoguard_types::RepoPath;
use serde_json::Value;

/// Parse a `package.json` into a [`Manifest`], keeping key order.
pub fn parse_manifest(path: &RepoPath, text: &str) -> anyhow::Result<Manifest> {
    let value: Value =
        serde_json::from_str(text).with_context(|| format!("parse {}", path.as_str()))?;
    Manifest::from_value(value)
        .with_context(|| format!("{} must contain a JSON object", path.as_str()))
}

/// Read the dependency maps of an installed package's `package.json`.
pub fn parse_resolution(path: &RepoPath, text: &str) -> anyhow::Result<Resolution> {
    let manifest = parse_manifest(path, text)?;
    Ok(Resolution::from_manifest(&manifest))
}

/// Serialize a manifest the way package managers write it: two-space indent, trailing newline.
pub fn render_manifest(manifest: &Manifest) -> anyhow::Result<String> {
    let mut out = serde_json::to_string_pretty(manifest.as_map())?;
    out.push('\n');
    Ok(out)
}

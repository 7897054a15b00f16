use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a violation.
///
/// Identity fields:
/// - rule_id
/// - code
/// - workspace (repo-relative cwd)
/// - subject (the dependency or field the violation is about)
/// - detail (optional, e.g. the package that requires a missing peer)
pub fn fingerprint_for(
    rule_id: &str,
    code: &str,
    workspace: &str,
    subject: &str,
    detail: Option<&str>,
) -> String {
    let mut parts = vec![rule_id, code, workspace, subject];
    if let Some(d) = detail {
        parts.push(d);
    }
    let canonical = parts.join("|");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

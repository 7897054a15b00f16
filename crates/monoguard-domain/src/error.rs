//! Error types for project (graph provider / manifest setter) operations.

use monoguard_types::RepoPath;
use thiserror::Error;

/// Failures raised by a [`crate::Project`] implementation.
///
/// These are the only conditions that abort a rule; policy violations are reported instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    /// No workspace is registered at the given coordinate.
    #[error("unknown workspace: {cwd}")]
    UnknownWorkspace { cwd: RepoPath },

    /// A field path had no segments or an empty segment.
    #[error("invalid field path: {path:?}")]
    InvalidFieldPath { path: String },

    /// An intermediate field exists but is not a JSON object.
    #[error("field {field} in {cwd} is not an object")]
    NotAnObject { cwd: RepoPath, field: String },

    /// A manifest document was not a JSON object.
    #[error("manifest for {cwd} is not a JSON object")]
    InvalidManifest { cwd: RepoPath },
}

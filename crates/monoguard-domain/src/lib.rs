//! Pure constraint evaluation (no IO).
//!
//! Input: a [`project::Project`] exposing the workspaces and their dependency edges.
//! Output: violations, manifest changes applied to the project, and a verdict.

#![forbid(unsafe_code)]

pub mod error;
pub mod manifest;
pub mod model;
pub mod policy;
pub mod project;
pub mod report;
pub mod rules;

mod engine;
mod fingerprint;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use engine::{Recorder, evaluate};
pub use error::ProjectError;
pub use manifest::{DepType, FieldPath, Manifest};
pub use model::{Dependency, DependencyQuery, Resolution, Workspace};
pub use project::{InMemoryProject, Project};

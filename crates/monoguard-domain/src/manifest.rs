//! The `package.json` data contract.
//!
//! The engine only owns the four dependency maps and generic field access; every other field is
//! passed through untouched, in its original order.

use crate::error::ProjectError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Which manifest bucket a dependency edge lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepType {
    Runtime,
    Dev,
    Peer,
    Optional,
}

impl DepType {
    /// Canonical enumeration order.
    pub const ALL: [DepType; 4] = [
        DepType::Runtime,
        DepType::Dev,
        DepType::Peer,
        DepType::Optional,
    ];

    pub fn manifest_field(self) -> &'static str {
        match self {
            DepType::Runtime => "dependencies",
            DepType::Dev => "devDependencies",
            DepType::Peer => "peerDependencies",
            DepType::Optional => "optionalDependencies",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DepType::Runtime => "runtime",
            DepType::Dev => "dev",
            DepType::Peer => "peer",
            DepType::Optional => "optional",
        }
    }
}

impl fmt::Display for DepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path into the manifest object, one segment per nesting level.
///
/// Package identities may contain dots (`lodash.merge`), so dependency paths are built from
/// segments rather than parsed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parse a dotted field name (`publishConfig.access`).
    pub fn parse(dotted: &str) -> Result<Self, ProjectError> {
        let segments: Vec<String> = dotted.split('.').map(str::to_string).collect();
        Self::from_segments(segments).ok_or_else(|| ProjectError::InvalidFieldPath {
            path: dotted.to_string(),
        })
    }

    pub fn from_segments(segments: Vec<String>) -> Option<Self> {
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(Self(segments))
    }

    /// The slot of `ident` in the bucket for `dep_type`.
    pub fn dependency(dep_type: DepType, ident: &str) -> Self {
        Self(vec![dep_type.manifest_field().to_string(), ident.to_string()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Raised when a nested write crosses a non-object value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field {field} is not an object")]
pub struct NotAnObject {
    pub field: String,
}

/// A workspace manifest: the `package.json` object with its key order preserved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(Map<String, Value>);

impl Manifest {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a parsed JSON document; `None` if it is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Declared `(ident, range)` pairs of one bucket, in manifest order.
    ///
    /// Entries whose range is not a string are not dependency edges and are skipped.
    pub fn dependencies(&self, dep_type: DepType) -> Vec<(String, String)> {
        let Some(Value::Object(deps)) = self.0.get(dep_type.manifest_field()) else {
            return Vec::new();
        };
        deps.iter()
            .filter_map(|(ident, range)| range.as_str().map(|r| (ident.clone(), r.to_string())))
            .collect()
    }

    pub fn dependency(&self, dep_type: DepType, ident: &str) -> Option<&str> {
        self.0
            .get(dep_type.manifest_field())
            .and_then(|deps| deps.get(ident))
            .and_then(Value::as_str)
    }

    pub fn field(&self, path: &FieldPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.0.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Write `value` at `path`, creating intermediate objects as needed.
    ///
    /// `None` and `Some(Value::Null)` remove the field, along with any parent object the
    /// removal leaves empty. An existing key keeps its position; a new key is appended, so a
    /// slot is never duplicated.
    pub fn set_field(&mut self, path: &FieldPath, value: Option<Value>) -> Result<(), NotAnObject> {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            remove_path(&mut self.0, path.segments());
            return Ok(());
        };
        let Some((last, parents)) = path.segments().split_last() else {
            return Ok(());
        };

        let mut current = &mut self.0;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match entry {
                Value::Object(map) => map,
                _ => {
                    return Err(NotAnObject {
                        field: parents[..=depth].join("."),
                    });
                }
            };
        }
        current.insert(last.clone(), value);
        Ok(())
    }
}

/// Remove the value at `segments`. Returns whether anything was removed.
fn remove_path(map: &mut Map<String, Value>, segments: &[String]) -> bool {
    match segments {
        [] => false,
        [last] => map.shift_remove(last).is_some(),
        [first, rest @ ..] => {
            let Some(Value::Object(child)) = map.get_mut(first) else {
                return false;
            };
            let removed = remove_path(child, rest);
            if removed && child.is_empty() {
                map.shift_remove(first);
            }
            removed
        }
    }
}

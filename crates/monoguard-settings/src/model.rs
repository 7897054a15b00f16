use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_CONFIG_V1: &str = "monoguard.config.v1";

/// `monoguard.toml` schema v1.
///
/// This is a *user-facing* config model: every field is optional and resolution layers it on
/// top of a profile preset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonoguardConfigV1 {
    /// Optional schema string for tooling (`monoguard.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// `strict` (default), `warn` or `report`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// When to fail the check: `error` or `warning`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on: Option<String>,

    /// How many violations to emit before truncating the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_violations: Option<u32>,

    /// Map of rule_id -> config.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleConfig {
    /// Override preset enable/disable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Override preset severity: `info`, `warning`, `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    /// Globs over workspace paths, workspace names and package names. Replaces the preset list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<Vec<String>>,

    /// Dependency types reconciled when the target is a workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<TogglesConfig>,

    /// Dependency types reconciled when the target is an external package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<TogglesConfig>,

    /// `last-visited` (default) or `highest`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_break: Option<String>,

    /// `last-visited` (default) or `require-agreement`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppliers: Option<String>,

    /// Forbidden package names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,

    /// Package name -> literal range.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ranges: BTreeMap<String, String>,

    /// Dotted field path -> value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldSetting>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TogglesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// Value of a `manifest.fields` entry.
///
/// `{ template = "..." }` is expanded per workspace (`{name}`, `{cwd}`); `{ unset = true }`
/// removes the field; anything else is written verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldSetting {
    Template { template: String },
    Unset { unset: bool },
    Literal(serde_json::Value),
}

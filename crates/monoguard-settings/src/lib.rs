//! Config parsing and profile/preset resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

pub use model::{FieldSetting, MonoguardConfigV1, RuleConfig, SCHEMA_CONFIG_V1, TogglesConfig};
pub use resolve::{Overrides, ResolvedConfig, rule_options};

/// Parse `monoguard.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<MonoguardConfigV1> {
    let cfg: MonoguardConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config used by the engine (profile preset, then file, then overrides).
pub fn resolve_config(
    cfg: MonoguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}

/// JSON schema of `monoguard.toml`, for editor tooling.
pub fn config_json_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(MonoguardConfigV1);
    serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
}

use crate::model::{FieldSetting, MonoguardConfigV1, RuleConfig, TogglesConfig};
use crate::presets;
use anyhow::Context;
use monoguard_domain::FieldPath;
use monoguard_domain::policy::{
    ConsistencyOverrides, EffectiveConfig, FailOn, FieldMap, FieldValue, IgnoreList,
    PeerSupplierPolicy, RulePolicy, TieBreak, TypeOverrides,
};
use monoguard_types::{Severity, ids};
use serde_json::Value;

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub max_violations: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub effective: EffectiveConfig,
}

pub fn resolve_config(
    cfg: MonoguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| "strict".to_string());

    let mut effective = presets::preset(&profile);

    // max violations
    if let Some(mv) = overrides.max_violations.or(cfg.max_violations) {
        effective.max_violations = mv as usize;
    }

    // per-rule overrides
    for (rule_id, rc) in cfg.rules.iter() {
        match rule_id.as_str() {
            ids::RULE_DEPS_CONSISTENT_RANGES => {
                reject_options(rule_id, rc)?;
                apply_common(rule_id, rc, &mut effective.consistency, false)?;
                let overrides = ConsistencyOverrides {
                    ignore: rc.ignore.clone().map(|p| ignore_list(rule_id, p)).transpose()?,
                    workspace: type_overrides(rc.workspace),
                    external: type_overrides(rc.external),
                    tie_break: rc
                        .tie_break
                        .as_deref()
                        .map(parse_tie_break)
                        .transpose()?,
                };
                let base = std::mem::take(&mut effective.consistency.options);
                effective.consistency.options = base.with_overrides(overrides);
            }
            ids::RULE_DEPS_WORKSPACE_PROTOCOL => {
                reject_options(rule_id, rc)?;
                apply_common(rule_id, rc, &mut effective.workspace_protocol, false)?;
                if let Some(patterns) = rc.ignore.clone() {
                    effective.workspace_protocol.options = ignore_list(rule_id, patterns)?;
                }
            }
            ids::RULE_DEPS_FORBIDDEN => {
                reject_options(rule_id, rc)?;
                apply_common(rule_id, rc, &mut effective.forbidden, !rc.packages.is_empty())?;
                effective.forbidden.options = rc.packages.clone();
            }
            ids::RULE_DEPS_PINNED_RANGES => {
                reject_options(rule_id, rc)?;
                apply_common(rule_id, rc, &mut effective.pinned_ranges, !rc.ranges.is_empty())?;
                effective.pinned_ranges.options = rc.ranges.clone();
            }
            ids::RULE_MANIFEST_FIELDS => {
                reject_options(rule_id, rc)?;
                apply_common(rule_id, rc, &mut effective.fields, !rc.fields.is_empty())?;
                effective.fields.options = field_map(rc)?;
            }
            ids::RULE_DEPS_PEER_PRESENCE => {
                reject_options(rule_id, rc)?;
                apply_common(rule_id, rc, &mut effective.peer_presence, false)?;
                if let Some(patterns) = rc.ignore.clone() {
                    effective.peer_presence.options.ignore = ignore_list(rule_id, patterns)?;
                }
                if let Some(s) = rc.suppliers.as_deref() {
                    effective.peer_presence.options.suppliers = parse_suppliers(s)?;
                }
            }
            other => anyhow::bail!(
                "unknown rule id: {other} (see `monoguard explain` for the list of rules)"
            ),
        }
    }

    // fail_on override from config
    if let Some(fail_on_s) = cfg.fail_on.as_deref() {
        effective.fail_on = parse_fail_on(fail_on_s)?;
    }

    Ok(ResolvedConfig { effective })
}

/// `enabled` wins; otherwise a rule switches on when it has been given options.
fn apply_common<T>(
    rule_id: &str,
    rc: &RuleConfig,
    policy: &mut RulePolicy<T>,
    configured: bool,
) -> anyhow::Result<()> {
    if configured {
        policy.enabled = true;
    }
    if let Some(enabled) = rc.enabled {
        policy.enabled = enabled;
    }
    if let Some(sev) = rc.severity.as_deref() {
        policy.severity =
            parse_severity(sev).with_context(|| format!("invalid severity for {rule_id}"))?;
    }
    Ok(())
}

/// Options a `[rules."<id>"]` table accepts besides `enabled` and `severity`.
///
/// Unknown rule ids accept none.
pub fn rule_options(rule_id: &str) -> &'static [&'static str] {
    match rule_id {
        ids::RULE_DEPS_CONSISTENT_RANGES => &["ignore", "workspace", "external", "tie_break"],
        ids::RULE_DEPS_WORKSPACE_PROTOCOL => &["ignore"],
        ids::RULE_DEPS_FORBIDDEN => &["packages"],
        ids::RULE_DEPS_PINNED_RANGES => &["ranges"],
        ids::RULE_MANIFEST_FIELDS => &["fields"],
        ids::RULE_DEPS_PEER_PRESENCE => &["ignore", "suppliers"],
        _ => &[],
    }
}

fn reject_options(rule_id: &str, rc: &RuleConfig) -> anyhow::Result<()> {
    let supported = rule_options(rule_id);
    let set = [
        ("ignore", rc.ignore.is_some()),
        ("workspace", rc.workspace.is_some()),
        ("external", rc.external.is_some()),
        ("tie_break", rc.tie_break.is_some()),
        ("suppliers", rc.suppliers.is_some()),
        ("packages", !rc.packages.is_empty()),
        ("ranges", !rc.ranges.is_empty()),
        ("fields", !rc.fields.is_empty()),
    ];
    for (name, present) in set {
        if present && !supported.contains(&name) {
            anyhow::bail!("option `{name}` is not supported by {rule_id}");
        }
    }
    Ok(())
}

fn ignore_list(rule_id: &str, patterns: Vec<String>) -> anyhow::Result<IgnoreList> {
    IgnoreList::new(patterns).with_context(|| format!("invalid ignore glob for {rule_id}"))
}

fn type_overrides(cfg: Option<TogglesConfig>) -> TypeOverrides {
    let cfg = cfg.unwrap_or_default();
    TypeOverrides {
        runtime: cfg.runtime,
        dev: cfg.dev,
        peer: cfg.peer,
        optional: cfg.optional,
    }
}

fn field_map(rc: &RuleConfig) -> anyhow::Result<FieldMap> {
    let mut out = FieldMap::new();
    for (path, setting) in &rc.fields {
        let field = FieldPath::parse(path)
            .with_context(|| format!("invalid field path in {}", ids::RULE_MANIFEST_FIELDS))?;
        let value = match setting {
            FieldSetting::Literal(v) => FieldValue::Literal(v.clone()),
            FieldSetting::Unset { unset: true } => FieldValue::Literal(Value::Null),
            FieldSetting::Unset { unset: false } => {
                anyhow::bail!("field {path}: `unset` must be true when present")
            }
            FieldSetting::Template { template } => {
                let template = template.clone();
                FieldValue::computed(move |ws| {
                    Value::String(
                        template
                            .replace("{name}", ws.name().unwrap_or_default())
                            .replace("{cwd}", ws.cwd.as_str()),
                    )
                })
            }
        };
        out.push((field, value));
    }
    Ok(out)
}

fn parse_tie_break(v: &str) -> anyhow::Result<TieBreak> {
    match v {
        "last-visited" => Ok(TieBreak::LastVisited),
        "highest" => Ok(TieBreak::Highest),
        other => anyhow::bail!("unknown tie_break: {other} (expected last-visited|highest)"),
    }
}

fn parse_suppliers(v: &str) -> anyhow::Result<PeerSupplierPolicy> {
    match v {
        "last-visited" => Ok(PeerSupplierPolicy::LastVisited),
        "require-agreement" => Ok(PeerSupplierPolicy::RequireAgreement),
        other => anyhow::bail!(
            "unknown suppliers policy: {other} (expected last-visited|require-agreement)"
        ),
    }
}

fn parse_severity(v: &str) -> anyhow::Result<Severity> {
    match v {
        "info" => Ok(Severity::Info),
        "warning" | "warn" => Ok(Severity::Warning),
        "error" => Ok(Severity::Error),
        other => anyhow::bail!("unknown severity: {other} (expected info|warning|error)"),
    }
}

fn parse_fail_on(v: &str) -> anyhow::Result<FailOn> {
    match v {
        "error" => Ok(FailOn::Error),
        "warning" | "warn" => Ok(FailOn::Warning),
        other => anyhow::bail!("unknown fail_on: {other} (expected error|warning)"),
    }
}

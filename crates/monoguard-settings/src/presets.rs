use monoguard_domain::policy::{
    ConsistencyPolicy, EffectiveConfig, FailOn, IgnoreList, PeerPresencePolicy, RulePolicy,
};
use monoguard_types::Severity;

/// Preset profiles are opinionated defaults.
///
/// Keep these small and readable. Anything complex should go into repo config.
pub fn preset(profile: &str) -> EffectiveConfig {
    match profile {
        "warn" => warn_profile(),
        "report" => report_profile(),
        // default
        _ => strict_profile(),
    }
}

fn strict_profile() -> EffectiveConfig {
    default_rules("strict", FailOn::Error, Severity::Error)
}

fn warn_profile() -> EffectiveConfig {
    default_rules("warn", FailOn::Warning, Severity::Warning)
}

fn report_profile() -> EffectiveConfig {
    // Same rules as `warn`, but warnings never fail the run.
    default_rules("report", FailOn::Error, Severity::Warning)
}

/// Rules that need options start disabled and are switched on by configuring them.
fn default_rules(profile: &str, fail_on: FailOn, severity: Severity) -> EffectiveConfig {
    EffectiveConfig {
        profile: profile.to_string(),
        fail_on,
        max_violations: 200,
        consistency: RulePolicy {
            enabled: true,
            severity,
            options: ConsistencyPolicy::default(),
        },
        workspace_protocol: RulePolicy {
            enabled: true,
            severity,
            options: IgnoreList::default(),
        },
        forbidden: off(severity),
        pinned_ranges: off(severity),
        fields: off(severity),
        peer_presence: RulePolicy {
            enabled: true,
            severity,
            options: PeerPresencePolicy::default(),
        },
    }
}

fn off<T: Default>(severity: Severity) -> RulePolicy<T> {
    RulePolicy {
        enabled: false,
        severity,
        options: T::default(),
    }
}

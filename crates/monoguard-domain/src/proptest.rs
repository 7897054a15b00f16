//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Convergence and idempotence of the rewriting rules
//! - Totality of the protocol, forbid and pin rules
//! - Determinism of the evaluation report

use crate::engine::evaluate;
use crate::manifest::{DepType, Manifest};
use crate::model::{DependencyQuery, Workspace};
use crate::policy::{ConsistencyPolicy, EffectiveConfig, IgnoreList, Mode};
use crate::project::{InMemoryProject, Project};
use crate::rules::{
    IdentityClassifier, Reporter, Target, enforce_workspace_protocol, forbid, pin_ranges,
    reconcile,
};
use monoguard_types::{RepoPath, Severity, ids};
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

/// Identities drawn from a small pool so that edges collide; `w0`..`w2` are workspaces.
const IDENTS: &[&str] = &["w0", "w1", "w2", "react", "lodash", "@scope/zod"];

fn arb_range() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..5, 0u32..5, 0u32..5).prop_map(|(ma, mi, pa)| format!("^{ma}.{mi}.{pa}")),
        (0u32..5, 0u32..5).prop_map(|(ma, mi)| format!("~{ma}.{mi}")),
        Just("*".to_string()),
        Just("workspace:^".to_string()),
    ]
}

fn arb_dep_type() -> impl Strategy<Value = DepType> {
    prop_oneof![
        Just(DepType::Runtime),
        Just(DepType::Dev),
        Just(DepType::Peer),
        Just(DepType::Optional),
    ]
}

/// Strategy for one workspace manifest: a name plus a handful of edges.
fn arb_edges() -> impl Strategy<Value = Vec<(DepType, usize, String)>> {
    prop::collection::vec((arb_dep_type(), 0..IDENTS.len(), arb_range()), 0..8)
}

fn arb_project() -> impl Strategy<Value = InMemoryProject> {
    prop::collection::vec(arb_edges(), 1..4).prop_map(|manifests| {
        let workspaces = manifests
            .into_iter()
            .enumerate()
            .map(|(i, edges)| {
                let mut fields = Map::new();
                fields.insert("name".to_string(), json!(format!("w{i}")));
                for (dep_type, ident, range) in edges {
                    let section = fields
                        .entry(dep_type.manifest_field().to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(deps) = section {
                        deps.insert(IDENTS[ident].to_string(), Value::String(range));
                    }
                }
                Workspace::new(
                    RepoPath::new(format!("packages/w{i}")),
                    Manifest::new(fields),
                )
            })
            .collect();
        InMemoryProject::new(workspaces)
    })
}

fn snapshot(p: &InMemoryProject) -> Vec<Workspace> {
    p.workspaces()
}

// ============================================================================
// Rule properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn reconcile_is_idempotent(mut p in arb_project()) {
        reconcile(&mut p, &ConsistencyPolicy::default()).expect("first");
        let first = snapshot(&p);
        reconcile(&mut p, &ConsistencyPolicy::default()).expect("second");
        prop_assert_eq!(snapshot(&p), first);
    }

    #[test]
    fn reconcile_leaves_one_range_per_eligible_ident(mut p in arb_project()) {
        let policy = ConsistencyPolicy::default();
        reconcile(&mut p, &policy).expect("reconcile");

        let classifier = IdentityClassifier::from_project(&p);
        let mut ranges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for dep in p.dependencies(&DependencyQuery::all()) {
            let toggles = policy.toggles(classifier.classify(&dep.ident) == Target::Workspace);
            if toggles.allows(dep.dep_type) {
                ranges.entry(dep.ident).or_default().insert(dep.range);
            }
        }
        for (ident, set) in ranges {
            prop_assert_eq!(set.len(), 1, "ident {} kept ranges {:?}", ident, set);
        }
    }

    #[test]
    fn workspace_protocol_is_total(mut p in arb_project()) {
        enforce_workspace_protocol(&mut p, &IgnoreList::default()).expect("protocol");
        for dep in p.dependencies(&DependencyQuery::all()) {
            if p.is_workspace(&dep.ident) {
                prop_assert_eq!(dep.range.as_str(), ids::WORKSPACE_PROTOCOL_RANGE);
            }
        }
    }

    #[test]
    fn forbid_removes_every_edge_and_reports_each(mut p in arb_project(), pick in 0..IDENTS.len()) {
        let ident = IDENTS[pick];
        let before = p.dependencies(&DependencyQuery::all().ident(ident)).len();

        let mut out = Vec::new();
        let mut reporter = Reporter::new(ids::RULE_DEPS_FORBIDDEN, Severity::Error, &mut out);
        forbid(&mut p, &[ident.to_string()], &mut reporter).expect("forbid");

        prop_assert!(p.dependencies(&DependencyQuery::all().ident(ident)).is_empty());
        prop_assert_eq!(out.len(), before);
    }

    #[test]
    fn pin_ranges_is_total(mut p in arb_project(), pick in 0..IDENTS.len(), range in arb_range()) {
        let ident = IDENTS[pick];
        let ranges = BTreeMap::from([(ident.to_string(), range.clone())]);
        pin_ranges(&mut p, &ranges).expect("pin");
        for dep in p.dependencies(&DependencyQuery::all().ident(ident)) {
            prop_assert_eq!(&dep.range, &range);
        }
    }
}

// ============================================================================
// Engine properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn evaluation_is_deterministic(p in arb_project()) {
        let cfg = EffectiveConfig::default();
        let a = evaluate(&mut p.clone(), &cfg, Mode::Check).expect("a");
        let b = evaluate(&mut p.clone(), &cfg, Mode::Check).expect("b");
        prop_assert_eq!(a.violations, b.violations);
        prop_assert_eq!(a.changes, b.changes);
        prop_assert_eq!(a.verdict, b.verdict);
    }

    #[test]
    fn fix_then_check_is_clean(mut p in arb_project()) {
        let cfg = EffectiveConfig::default();
        evaluate(&mut p, &cfg, Mode::Fix).expect("fix");
        let report = evaluate(&mut p, &cfg, Mode::Check).expect("check");
        prop_assert!(report.changes.is_empty(), "leftover changes: {:?}", report.changes);
        prop_assert!(report.violations.iter().all(|v| v.code != ids::CODE_RANGE_MISMATCH));
    }

    #[test]
    fn check_and_fix_agree_on_changes(p in arb_project()) {
        let cfg = EffectiveConfig::default();
        let check = evaluate(&mut p.clone(), &cfg, Mode::Check).expect("check");
        let fix = evaluate(&mut p.clone(), &cfg, Mode::Fix).expect("fix");
        prop_assert_eq!(check.changes, fix.changes);
        prop_assert_eq!(check.violations.len() as u32, check.data.violations_total.min(cfg.max_violations as u32));
    }
}

use crate::manifest::{DepType, FieldPath};
use crate::model::{Dependency, Workspace};
use globset::{Glob, GlobSet, GlobSetBuilder};
use monoguard_types::Severity;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailOn {
    Error,
    Warning,
}

/// `Check` reports every change as a violation; `Fix` expects the caller to persist them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Check,
    Fix,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Check => "check",
            Mode::Fix => "fix",
        }
    }
}

/// Which dependency types take part in a rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TypeToggles {
    pub runtime: bool,
    pub dev: bool,
    pub peer: bool,
    pub optional: bool,
}

impl TypeToggles {
    pub fn allows(&self, dep_type: DepType) -> bool {
        match dep_type {
            DepType::Runtime => self.runtime,
            DepType::Dev => self.dev,
            DepType::Peer => self.peer,
            DepType::Optional => self.optional,
        }
    }

    /// Apply `overrides` on top of `self`: every set field replaces the current value.
    pub fn with_overrides(self, overrides: TypeOverrides) -> Self {
        Self {
            runtime: overrides.runtime.unwrap_or(self.runtime),
            dev: overrides.dev.unwrap_or(self.dev),
            peer: overrides.peer.unwrap_or(self.peer),
            optional: overrides.optional.unwrap_or(self.optional),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TypeOverrides {
    pub runtime: Option<bool>,
    pub dev: Option<bool>,
    pub peer: Option<bool>,
    pub optional: Option<bool>,
}

/// Glob patterns naming workspaces or packages a rule must not touch.
///
/// An edge is ignored when a pattern matches its source workspace's `cwd`, its source
/// workspace's name, or its target identity. Rules go through [`IgnoreList::scope`] so that a
/// pattern naming a workspace by `cwd` also covers the edges targeting that workspace.
#[derive(Clone, Debug, Default)]
pub struct IgnoreList {
    patterns: Vec<String>,
    set: Option<GlobSet>,
}

impl IgnoreList {
    pub fn new(patterns: Vec<String>) -> Result<Self, globset::Error> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            builder.add(Glob::new(pattern)?);
        }
        let set = builder.build()?;
        Ok(Self {
            patterns,
            set: Some(set),
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, value: &str) -> bool {
        self.set.as_ref().is_some_and(|s| s.is_match(value))
    }

    pub fn ignores_workspace(&self, ws: &Workspace) -> bool {
        self.matches(ws.cwd.as_str()) || ws.name().is_some_and(|n| self.matches(n))
    }

    pub fn ignores(&self, dep: &Dependency) -> bool {
        self.matches(dep.workspace.as_str())
            || dep.workspace_name.as_deref().is_some_and(|n| self.matches(n))
            || self.matches(&dep.ident)
    }

    /// Bind the patterns to the workspaces of one rule invocation.
    pub fn scope(&self, workspaces: &[Workspace]) -> IgnoreScope<'_> {
        let names = if self.is_empty() {
            BTreeSet::new()
        } else {
            workspaces
                .iter()
                .filter(|ws| self.ignores_workspace(ws))
                .filter_map(|ws| ws.name().map(str::to_string))
                .collect()
        };
        IgnoreScope { list: self, names }
    }
}

/// An [`IgnoreList`] resolved against the workspaces of a project.
#[derive(Clone, Debug)]
pub struct IgnoreScope<'a> {
    list: &'a IgnoreList,
    /// Names of the ignored workspaces.
    names: BTreeSet<String>,
}

impl IgnoreScope<'_> {
    pub fn ignores_workspace(&self, ws: &Workspace) -> bool {
        self.list.ignores_workspace(ws)
    }

    /// Whether edges targeting `ident` are off limits.
    pub fn ignores_ident(&self, ident: &str) -> bool {
        self.list.matches(ident) || self.names.contains(ident)
    }

    pub fn ignores(&self, dep: &Dependency) -> bool {
        self.list.ignores(dep) || self.names.contains(&dep.ident)
    }
}

impl PartialEq for IgnoreList {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

/// How the consistency rule picks the range every eligible edge converges to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// The range of the last eligible edge in enumeration order.
    #[default]
    LastVisited,
    /// The range with the greatest lower bound; ties go to the last visited.
    Highest,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConsistencyPolicy {
    pub ignore: IgnoreList,
    /// Toggles for edges whose target is a workspace.
    pub workspace: TypeToggles,
    /// Toggles for edges whose target is an external package.
    pub external: TypeToggles,
    pub tie_break: TieBreak,
}

impl Default for ConsistencyPolicy {
    fn default() -> Self {
        Self {
            ignore: IgnoreList::default(),
            workspace: TypeToggles {
                runtime: true,
                ..TypeToggles::default()
            },
            external: TypeToggles {
                runtime: true,
                dev: true,
                ..TypeToggles::default()
            },
            tie_break: TieBreak::LastVisited,
        }
    }
}

/// Caller-supplied deltas for [`ConsistencyPolicy`].
#[derive(Clone, Debug, Default)]
pub struct ConsistencyOverrides {
    pub ignore: Option<IgnoreList>,
    pub workspace: TypeOverrides,
    pub external: TypeOverrides,
    pub tie_break: Option<TieBreak>,
}

impl ConsistencyPolicy {
    /// Layer `overrides` on top of `self`. Toggles are merged per type; `ignore` replaces.
    pub fn with_overrides(self, overrides: ConsistencyOverrides) -> Self {
        Self {
            ignore: overrides.ignore.unwrap_or(self.ignore),
            workspace: self.workspace.with_overrides(overrides.workspace),
            external: self.external.with_overrides(overrides.external),
            tie_break: overrides.tie_break.unwrap_or(self.tie_break),
        }
    }

    pub fn toggles(&self, target_is_workspace: bool) -> &TypeToggles {
        if target_is_workspace {
            &self.workspace
        } else {
            &self.external
        }
    }
}

/// What to do when several declarations could supply a missing peer with different ranges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PeerSupplierPolicy {
    /// Apply every supplier's range in turn; the last one wins.
    #[default]
    LastVisited,
    /// Report a conflict and leave the peer undeclared.
    RequireAgreement,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeerPresencePolicy {
    pub ignore: IgnoreList,
    pub suppliers: PeerSupplierPolicy,
}

pub type ComputeFn = Arc<dyn Fn(&Workspace) -> Value + Send + Sync>;

/// A field value for the bulk field setter.
#[derive(Clone)]
pub enum FieldValue {
    Literal(Value),
    Computed(ComputeFn),
}

impl FieldValue {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Workspace) -> Value + Send + Sync + 'static,
    {
        FieldValue::Computed(Arc::new(f))
    }

    pub fn resolve(&self, ws: &Workspace) -> Value {
        match self {
            FieldValue::Literal(v) => v.clone(),
            FieldValue::Computed(f) => f(ws),
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            FieldValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Ordered `(field, value)` pairs.
pub type FieldMap = Vec<(FieldPath, FieldValue)>;

#[derive(Clone, Debug)]
pub struct RulePolicy<T> {
    pub enabled: bool,
    pub severity: Severity,
    pub options: T,
}

impl<T: Default> RulePolicy<T> {
    pub fn enabled(severity: Severity) -> Self {
        Self {
            enabled: true,
            severity,
            options: T::default(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            severity: Severity::Info,
            options: T::default(),
        }
    }
}

impl<T> RulePolicy<T> {
    pub fn active(&self) -> Option<&Self> {
        self.enabled.then_some(self)
    }
}

#[derive(Clone, Debug)]
pub struct EffectiveConfig {
    pub profile: String,
    pub fail_on: FailOn,
    pub max_violations: usize,
    pub consistency: RulePolicy<ConsistencyPolicy>,
    pub workspace_protocol: RulePolicy<IgnoreList>,
    pub forbidden: RulePolicy<Vec<String>>,
    pub pinned_ranges: RulePolicy<BTreeMap<String, String>>,
    pub fields: RulePolicy<FieldMap>,
    pub peer_presence: RulePolicy<PeerPresencePolicy>,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            profile: "strict".to_string(),
            fail_on: FailOn::Error,
            max_violations: 200,
            consistency: RulePolicy::enabled(Severity::Error),
            workspace_protocol: RulePolicy::enabled(Severity::Error),
            forbidden: RulePolicy::disabled(),
            pinned_ranges: RulePolicy::disabled(),
            fields: RulePolicy::disabled(),
            peer_presence: RulePolicy::enabled(Severity::Error),
        }
    }
}

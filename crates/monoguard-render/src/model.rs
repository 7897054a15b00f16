#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableVerdictStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableLocation {
    pub path: String,
    /// Dotted manifest field, e.g. `dependencies.react`.
    pub field: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableViolation {
    pub severity: RenderableSeverity,
    pub rule_id: String,
    pub code: String,
    pub message: String,
    pub location: Option<RenderableLocation>,
    pub help: Option<String>,
}

/// A manifest edit; `before`/`after` are compact JSON, `None` when the field is absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableChange {
    pub rule_id: String,
    pub workspace: String,
    pub field: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableData {
    pub mode: String,
    pub violations_emitted: u32,
    pub violations_total: u32,
    pub changes_total: u32,
    pub truncated_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableReport {
    pub verdict: RenderableVerdictStatus,
    pub violations: Vec<RenderableViolation>,
    pub changes: Vec<RenderableChange>,
    pub data: RenderableData,
}

//! Stable identifiers for rules and violation codes.
//!
//! `rule_id` is a dotted namespace. `code` is a short snake_case discriminator.

// Rules
pub const RULE_DEPS_CONSISTENT_RANGES: &str = "deps.consistent_ranges";
pub const RULE_DEPS_WORKSPACE_PROTOCOL: &str = "deps.workspace_protocol";
pub const RULE_DEPS_FORBIDDEN: &str = "deps.forbidden";
pub const RULE_DEPS_PINNED_RANGES: &str = "deps.pinned_ranges";
pub const RULE_MANIFEST_FIELDS: &str = "manifest.fields";
pub const RULE_DEPS_PEER_PRESENCE: &str = "deps.peer_presence";

// Codes: deps.consistent_ranges
pub const CODE_RANGE_MISMATCH: &str = "range_mismatch";

// Codes: deps.workspace_protocol
pub const CODE_MISSING_WORKSPACE_PROTOCOL: &str = "missing_workspace_protocol";

// Codes: deps.forbidden
pub const CODE_FORBIDDEN_DEPENDENCY: &str = "forbidden_dependency";

// Codes: deps.pinned_ranges
pub const CODE_RANGE_NOT_PINNED: &str = "range_not_pinned";

// Codes: manifest.fields
pub const CODE_FIELD_MISMATCH: &str = "field_mismatch";

// Codes: deps.peer_presence
pub const CODE_MISSING_PEER_SUPPLIER: &str = "missing_peer_supplier";
pub const CODE_UNDECLARED_PEER: &str = "undeclared_peer";
pub const CODE_CONFLICTING_PEER_SUPPLIERS: &str = "conflicting_peer_suppliers";

// Tool-level
pub const RULE_TOOL_RUNTIME: &str = "tool.runtime";
pub const CODE_RUNTIME_ERROR: &str = "runtime_error";

/// The range marker written for workspace-to-workspace edges.
pub const WORKSPACE_PROTOCOL_RANGE: &str = "workspace:^";

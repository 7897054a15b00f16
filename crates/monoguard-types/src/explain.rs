//! Explain registry for rules and codes.
//!
//! Maps rule IDs and codes to human-readable explanations with remediation guidance.

use crate::ids;

/// Explanation entry for a rule or code.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the rule/code.
    pub title: &'static str,
    /// What the rule does and why it exists.
    pub description: &'static str,
    /// How to fix violations.
    pub remediation: &'static str,
    /// Before/after manifest examples.
    pub examples: ExamplePair,
}

/// Before and after manifest examples.
#[derive(Debug, Clone)]
pub struct ExamplePair {
    /// Manifest that would trigger a violation.
    pub before: &'static str,
    /// Manifest that passes the rule.
    pub after: &'static str,
}

/// Look up an explanation by rule_id or code.
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        // Rule IDs
        ids::RULE_DEPS_CONSISTENT_RANGES => Some(explain_consistent_ranges()),
        ids::RULE_DEPS_WORKSPACE_PROTOCOL => Some(explain_workspace_protocol()),
        ids::RULE_DEPS_FORBIDDEN => Some(explain_forbidden()),
        ids::RULE_DEPS_PINNED_RANGES => Some(explain_pinned_ranges()),
        ids::RULE_MANIFEST_FIELDS => Some(explain_manifest_fields()),
        ids::RULE_DEPS_PEER_PRESENCE => Some(explain_peer_presence()),

        // Codes
        ids::CODE_RANGE_MISMATCH => Some(retitle(explain_consistent_ranges(), "Range Mismatch")),
        ids::CODE_MISSING_WORKSPACE_PROTOCOL => Some(retitle(
            explain_workspace_protocol(),
            "Missing Workspace Protocol",
        )),
        ids::CODE_FORBIDDEN_DEPENDENCY => {
            Some(retitle(explain_forbidden(), "Forbidden Dependency"))
        }
        ids::CODE_RANGE_NOT_PINNED => Some(retitle(explain_pinned_ranges(), "Range Not Pinned")),
        ids::CODE_FIELD_MISMATCH => Some(retitle(explain_manifest_fields(), "Field Mismatch")),
        ids::CODE_UNDECLARED_PEER => Some(retitle(explain_peer_presence(), "Undeclared Peer")),
        ids::CODE_MISSING_PEER_SUPPLIER => Some(explain_missing_peer_supplier()),
        ids::CODE_CONFLICTING_PEER_SUPPLIERS => Some(explain_conflicting_peer_suppliers()),

        _ => None,
    }
}

/// List all known rule IDs.
pub fn all_rule_ids() -> &'static [&'static str] {
    &[
        ids::RULE_DEPS_CONSISTENT_RANGES,
        ids::RULE_DEPS_WORKSPACE_PROTOCOL,
        ids::RULE_DEPS_FORBIDDEN,
        ids::RULE_DEPS_PINNED_RANGES,
        ids::RULE_MANIFEST_FIELDS,
        ids::RULE_DEPS_PEER_PRESENCE,
    ]
}

/// List all known codes.
pub fn all_codes() -> &'static [&'static str] {
    &[
        ids::CODE_RANGE_MISMATCH,
        ids::CODE_MISSING_WORKSPACE_PROTOCOL,
        ids::CODE_FORBIDDEN_DEPENDENCY,
        ids::CODE_RANGE_NOT_PINNED,
        ids::CODE_FIELD_MISMATCH,
        ids::CODE_UNDECLARED_PEER,
        ids::CODE_MISSING_PEER_SUPPLIER,
        ids::CODE_CONFLICTING_PEER_SUPPLIERS,
    ]
}

fn retitle(mut exp: Explanation, title: &'static str) -> Explanation {
    exp.title = title;
    exp
}

// --- Rule-level explanations ---

fn explain_consistent_ranges() -> Explanation {
    Explanation {
        title: "Consistent Dependency Ranges",
        description: "\
Detects the same package being declared with different ranges across workspaces.

Divergent ranges for one package mean:
- Several copies of the package may be installed side by side
- Workspaces test against different versions than they ship with
- Upgrades have to be repeated manifest by manifest

Which dependency types participate is configurable separately for workspace
targets (default: `dependencies` only) and external targets (default:
`dependencies` and `devDependencies`).",
        remediation: "\
Run `monoguard fix` to align every eligible declaration to one range, or edit
the manifests by hand. Use `ignore` to exempt workspaces that must diverge.",
        examples: ExamplePair {
            before: r#"// packages/a/package.json
{ "dependencies": { "lodash": "^4.17.0" } }
// packages/b/package.json
{ "dependencies": { "lodash": "^4.17.21" } }"#,
            after: r#"// packages/a/package.json
{ "dependencies": { "lodash": "^4.17.21" } }
// packages/b/package.json
{ "dependencies": { "lodash": "^4.17.21" } }"#,
        },
    }
}

fn explain_workspace_protocol() -> Explanation {
    Explanation {
        title: "Workspace Protocol",
        description: "\
Detects dependencies on other workspaces of the monorepo that use a registry
range instead of the `workspace:^` protocol.

A registry range on a local package can silently resolve to a published copy
instead of the sources in the repository.",
        remediation: "\
Declare workspace-to-workspace dependencies as `workspace:^`. `monoguard fix`
rewrites them for every dependency type.",
        examples: ExamplePair {
            before: r#"{ "dependencies": { "@acme/utils": "^1.2.0" } }"#,
            after: r#"{ "dependencies": { "@acme/utils": "workspace:^" } }"#,
        },
    }
}

fn explain_forbidden() -> Explanation {
    Explanation {
        title: "Forbidden Dependency",
        description: "\
Detects declarations of packages listed as forbidden, in any workspace and any
dependency type. The rule has no ignore list.",
        remediation: "\
Remove the dependency and migrate to the approved alternative. `monoguard fix`
deletes the declaration; the violation is still reported so the removal is
visible in the report.",
        examples: ExamplePair {
            before: r#"{ "dependencies": { "left-pad": "^1.3.0", "lodash": "^4.17.21" } }"#,
            after: r#"{ "dependencies": { "lodash": "^4.17.21" } }"#,
        },
    }
}

fn explain_pinned_ranges() -> Explanation {
    Explanation {
        title: "Pinned Ranges",
        description: "\
Detects declarations of configured packages whose range differs from the
literal range pinned in `monoguard.toml`. The literal is not validated.",
        remediation: "\
Use exactly the pinned range, or change the pin in `monoguard.toml`.",
        examples: ExamplePair {
            before: r#"{ "devDependencies": { "typescript": "^4.9.0" } }"#,
            after: r#"{ "devDependencies": { "typescript": "5.4.5" } }"#,
        },
    }
}

fn explain_manifest_fields() -> Explanation {
    Explanation {
        title: "Manifest Fields",
        description: "\
Detects workspaces whose manifest fields differ from the configured values.
Values are either literals or templates computed from the workspace
(`{name}`, `{cwd}`).",
        remediation: "\
Set the field to the configured value. `monoguard fix` writes the value into
every workspace manifest.",
        examples: ExamplePair {
            before: r#"{ "name": "@acme/a", "license": "ISC" }"#,
            after: r#"{ "name": "@acme/a", "license": "MIT" }"#,
        },
    }
}

fn explain_peer_presence() -> Explanation {
    Explanation {
        title: "Peer Dependency Presence",
        description: "\
Detects packages whose peer dependencies are not declared by the workspace that
depends on them.

When a workspace depends on `react-dom`, which peers on `react`, the workspace
has to provide `react` itself. The range is copied from another declaration of
`react` in the monorepo. If the workspace already lists `react` as a peer, the
fix goes to `devDependencies`, because an ancestor supplies it at install time.",
        remediation: "\
Declare the peer dependency in the workspace, using the same range as the rest
of the monorepo. `monoguard fix` inserts it.",
        examples: ExamplePair {
            before: r#"{ "dependencies": { "react-dom": "^18.2.0" } }"#,
            after: r#"{ "dependencies": { "react-dom": "^18.2.0", "react": "^18.2.0" } }"#,
        },
    }
}

fn explain_missing_peer_supplier() -> Explanation {
    Explanation {
        title: "Missing Peer Supplier",
        description: "\
A package requires a peer dependency that no workspace declares as a regular,
dev, or optional dependency. There is no range to copy, so it cannot be
fixed automatically.",
        remediation: "\
Add the peer dependency to the workspace with an explicit range, or list the
peer in the rule's `ignore` patterns.",
        examples: ExamplePair {
            before: r#"{ "dependencies": { "styled-components": "^6.0.0" } }"#,
            after: r#"{ "dependencies": { "styled-components": "^6.0.0", "react": "^18.2.0" } }"#,
        },
    }
}

fn explain_conflicting_peer_suppliers() -> Explanation {
    Explanation {
        title: "Conflicting Peer Suppliers",
        description: "\
A peer dependency has to be added, but the other declarations of the package
disagree on its range. Only reported when the rule is configured with
`suppliers = \"require-agreement\"`.",
        remediation: "\
Align the existing declarations first (see `deps.consistent_ranges`), then rerun
`monoguard fix`.",
        examples: ExamplePair {
            before: r#"// packages/a/package.json
{ "dependencies": { "react": "^17.0.0" } }
// packages/b/package.json
{ "dependencies": { "react": "^18.2.0" } }"#,
            after: r#"// packages/a/package.json
{ "dependencies": { "react": "^18.2.0" } }
// packages/b/package.json
{ "dependencies": { "react": "^18.2.0" } }"#,
        },
    }
}

//! The `explain` use case: what a rule or violation code means, how to configure the rule,
//! and what `monoguard fix` does to a manifest.

use monoguard_types::explain::{self, Explanation};
use monoguard_types::ids;
use serde_json::Value;

/// Codes each rule can emit. Codes of changes come first, then reported-only codes.
const RULE_CODES: &[(&str, &[&str])] = &[
    (ids::RULE_DEPS_CONSISTENT_RANGES, &[ids::CODE_RANGE_MISMATCH]),
    (ids::RULE_DEPS_WORKSPACE_PROTOCOL, &[ids::CODE_MISSING_WORKSPACE_PROTOCOL]),
    (ids::RULE_DEPS_FORBIDDEN, &[ids::CODE_FORBIDDEN_DEPENDENCY]),
    (ids::RULE_DEPS_PINNED_RANGES, &[ids::CODE_RANGE_NOT_PINNED]),
    (ids::RULE_MANIFEST_FIELDS, &[ids::CODE_FIELD_MISMATCH]),
    (
        ids::RULE_DEPS_PEER_PRESENCE,
        &[
            ids::CODE_UNDECLARED_PEER,
            ids::CODE_MISSING_PEER_SUPPLIER,
            ids::CODE_CONFLICTING_PEER_SUPPLIERS,
        ],
    ),
];

/// Codes reported without a manifest change; `fix` leaves them for the user.
const REPORT_ONLY_CODES: &[&str] = &[
    ids::CODE_MISSING_PEER_SUPPLIER,
    ids::CODE_CONFLICTING_PEER_SUPPLIERS,
];

/// A resolved explanation: the registry text plus the rule it belongs to.
#[derive(Clone, Debug)]
pub struct Explained {
    pub explanation: Explanation,
    pub rule_id: &'static str,
    pub codes: &'static [&'static str],
    /// Set when the identifier was a code rather than a rule id.
    pub code: Option<&'static str>,
}

impl Explained {
    /// Whether `monoguard fix` rewrites manifests for this identifier.
    pub fn autofixes(&self) -> bool {
        match self.code {
            Some(code) => !REPORT_ONLY_CODES.contains(&code),
            None => true,
        }
    }
}

/// Output from the explain use case.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    Found(Explained),
    /// Unknown identifier; `suggestions` holds known identifiers that look alike.
    NotFound {
        identifier: String,
        suggestions: Vec<&'static str>,
        available_rule_ids: &'static [&'static str],
        available_codes: &'static [&'static str],
    },
}

/// Look up an explanation for a rule id or code.
pub fn run_explain(identifier: &str) -> ExplainOutput {
    let owner = RULE_CODES.iter().find_map(|(rule_id, codes)| {
        if *rule_id == identifier {
            Some((*rule_id, *codes, None))
        } else {
            codes
                .iter()
                .find(|c| **c == identifier)
                .map(|c| (*rule_id, *codes, Some(*c)))
        }
    });

    match (explain::lookup_explanation(identifier), owner) {
        (Some(explanation), Some((rule_id, codes, code))) => ExplainOutput::Found(Explained {
            explanation,
            rule_id,
            codes,
            code,
        }),
        _ => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            suggestions: suggestions(identifier),
            available_rule_ids: explain::all_rule_ids(),
            available_codes: explain::all_codes(),
        },
    }
}

fn suggestions(identifier: &str) -> Vec<&'static str> {
    let needle = identifier.trim().to_lowercase();
    if needle.len() < 3 {
        return Vec::new();
    }
    explain::all_rule_ids()
        .iter()
        .chain(explain::all_codes())
        .copied()
        .filter(|known| known.contains(needle.as_str()) || needle.contains(known))
        .collect()
}

/// Format an explanation for terminal display.
pub fn format_explanation(exp: &Explained) -> String {
    let info = &exp.explanation;
    let mut out = String::new();

    out.push_str(info.title);
    out.push('\n');
    out.push_str(&"=".repeat(info.title.len()));
    out.push_str("\n\n");

    out.push_str(&format!("Rule:    {}\n", exp.rule_id));
    out.push_str(&format!("Codes:   {}\n", exp.codes.join(", ")));
    let autofix = if exp.autofixes() {
        "yes (`monoguard fix`)"
    } else {
        "no, reported only"
    };
    out.push_str(&format!("Autofix: {autofix}\n\n"));

    out.push_str(info.description);
    out.push_str("\n\n");
    out.push_str("Remediation\n");
    out.push_str("-----------\n");
    out.push_str(info.remediation);
    out.push_str("\n\n");

    out.push_str("Configuration\n");
    out.push_str("-------------\n");
    out.push_str(&format!("[rules.\"{}\"]\n", exp.rule_id));
    out.push_str("enabled, severity");
    for option in monoguard_settings::rule_options(exp.rule_id) {
        out.push_str(", ");
        out.push_str(option);
    }
    out.push_str("\n\n");

    out.push_str("Example\n");
    out.push_str("-------\n");
    let diff = manifest_diff(info.examples.before, info.examples.after);
    if diff.is_empty() {
        out.push_str("Before:\n");
        out.push_str(info.examples.before);
        out.push_str("\nAfter:\n");
        out.push_str(info.examples.after);
        out.push('\n');
    } else {
        for line in diff {
            out.push_str(&line);
            out.push('\n');
        }
    }

    out
}

/// Format the "not found" error message for terminal display.
pub fn format_not_found(
    identifier: &str,
    suggestions: &[&'static str],
    rule_ids: &[&'static str],
    codes: &[&'static str],
) -> String {
    let mut out = format!("Unknown rule id or code: {identifier}\n");
    if !suggestions.is_empty() {
        out.push_str(&format!("Did you mean: {}?\n", suggestions.join(", ")));
    }
    out.push_str("\nRule ids:\n");
    for id in rule_ids {
        out.push_str(&format!("  - {id}\n"));
    }
    out.push_str("\nCodes:\n");
    for code in codes {
        out.push_str(&format!("  - {code}\n"));
    }
    out
}

/// Field-level changes between two example documents, one line per changed field.
///
/// A document is either a single manifest or several, each introduced by a
/// `// <path>` line. Unparseable documents yield no lines.
fn manifest_diff(before: &str, after: &str) -> Vec<String> {
    let (Some(before), Some(after)) = (split_documents(before), split_documents(after)) else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    for (label, after_doc) in &after {
        let empty = Vec::new();
        let before_doc = before
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, d)| d)
            .unwrap_or(&empty);

        for (field, old) in before_doc {
            let new = after_doc.iter().find(|(f, _)| f == field).map(|(_, v)| v);
            if new != Some(old) {
                lines.push(change_line(label, field, Some(old), new));
            }
        }
        for (field, new) in after_doc {
            if !before_doc.iter().any(|(f, _)| f == field) {
                lines.push(change_line(label, field, None, Some(new)));
            }
        }
    }
    lines
}

fn change_line(label: &str, field: &str, before: Option<&Value>, after: Option<&Value>) -> String {
    let show = |v: Option<&Value>| v.map_or_else(|| "(absent)".to_string(), Value::to_string);
    let field = if label.is_empty() {
        field.to_string()
    } else {
        format!("{label}: {field}")
    };
    format!("{field}: {} -> {}", show(before), show(after))
}

type Document = Vec<(String, Value)>;

fn split_documents(text: &str) -> Option<Vec<(String, Document)>> {
    let mut raw: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        if let Some(label) = line.trim().strip_prefix("//") {
            raw.push((label.trim().to_string(), String::new()));
            continue;
        }
        if raw.is_empty() {
            raw.push((String::new(), String::new()));
        }
        if let Some((_, body)) = raw.last_mut() {
            body.push_str(line);
            body.push('\n');
        }
    }

    raw.into_iter()
        .map(|(label, body)| {
            let value: Value = serde_json::from_str(&body).ok()?;
            let mut fields = Vec::new();
            flatten("", &value, &mut fields);
            Some((label, fields))
        })
        .collect()
}

/// Leaf fields of `value` as dotted paths, in document order.
fn flatten(prefix: &str, value: &Value, out: &mut Document) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        other if !prefix.is_empty() => out.push((prefix.to_string(), other.clone())),
        _ => {}
    }
}

use crate::error::ProjectError;
use crate::model::{Dependency, DependencyQuery};
use crate::policy::{ConsistencyPolicy, TieBreak};
use crate::project::Project;
use crate::rules::utils::{IdentityClassifier, Target};
use semver::Version;

/// Align the declared range of every eligible edge with the other eligible edges sharing its
/// target identity.
///
/// An edge is eligible when no ignore pattern matches it and the policy enables its dependency
/// type for its target kind (workspace or external). Ineligible edges are neither rewritten nor
/// used as a source. With [`TieBreak::LastVisited`] every eligible edge ends up with the range
/// of the last eligible edge in enumeration order.
pub fn reconcile(project: &mut dyn Project, policy: &ConsistencyPolicy) -> Result<(), ProjectError> {
    let classifier = IdentityClassifier::from_project(project);
    let workspaces = project.workspaces();
    let ignore = policy.ignore.scope(&workspaces);
    let eligible = |dep: &Dependency| {
        !ignore.ignores(dep)
            && policy
                .toggles(classifier.classify(&dep.ident) == Target::Workspace)
                .allows(dep.dep_type)
    };

    let edges = project.dependencies(&DependencyQuery::all());
    let mut rewritten = 0usize;
    for edge in edges.iter().filter(|e| eligible(e)) {
        let peers: Vec<Dependency> = project
            .dependencies(&DependencyQuery::all().ident(&edge.ident))
            .into_iter()
            .filter(|e| eligible(e))
            .collect();

        let Some(winner) = pick_range(&peers, policy.tie_break) else {
            continue;
        };
        let current = project
            .dependencies(
                &DependencyQuery::all()
                    .ident(&edge.ident)
                    .workspace(&edge.workspace)
                    .dep_type(edge.dep_type),
            )
            .pop();
        let Some(current) = current else {
            continue;
        };
        if current.range == winner {
            continue;
        }

        tracing::debug!(
            workspace = %edge.workspace,
            ident = %edge.ident,
            dep_type = %edge.dep_type,
            from = %current.range,
            to = %winner,
            "aligning dependency range"
        );
        current.update(project, &winner)?;
        rewritten += 1;
    }

    tracing::info!(rewritten, "consistency pass complete");
    Ok(())
}

fn pick_range(candidates: &[Dependency], tie_break: TieBreak) -> Option<String> {
    let chosen = match tie_break {
        TieBreak::LastVisited => candidates.last(),
        // `max_by_key` keeps the last of equal elements.
        TieBreak::Highest => candidates.iter().max_by_key(|d| range_floor(&d.range)),
    };
    chosen.map(|d| d.range.clone())
}

/// Lower bound of a range such as `^1.2.3`, `~1.2`, `>=2.0.0 <3` or `1.x`.
///
/// Returns `None` for ranges without a leading version (`*`, `latest`, `workspace:^`), which
/// sort below any version.
pub(crate) fn range_floor(range: &str) -> Option<Version> {
    let first = range.split_whitespace().next()?;
    let first = first.split("||").next()?;
    let trimmed = first.trim_start_matches(['^', '~', '=', '>', '<', 'v']);

    let mut parts: Vec<&str> = trimmed.splitn(3, '.').collect();
    match parts.first() {
        None | Some(&"") | Some(&"*") | Some(&"x") | Some(&"X") => return None,
        Some(_) => {}
    }
    for part in parts.iter_mut() {
        if *part == "x" || *part == "X" || *part == "*" {
            *part = "0";
        }
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&parts.join(".")).ok()
}

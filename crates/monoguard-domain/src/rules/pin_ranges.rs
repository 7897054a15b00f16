use crate::error::ProjectError;
use crate::model::DependencyQuery;
use crate::project::Project;
use std::collections::BTreeMap;

/// Rewrite every edge on a pinned identity to the literal range given for it.
///
/// The literal is not validated; a malformed range surfaces wherever the manifest is consumed.
pub fn pin_ranges(
    project: &mut dyn Project,
    ranges: &BTreeMap<String, String>,
) -> Result<(), ProjectError> {
    for (ident, range) in ranges {
        for dep in project.dependencies(&DependencyQuery::all().ident(ident)) {
            if &dep.range == range {
                continue;
            }
            tracing::debug!(
                workspace = %dep.workspace,
                ident = %dep.ident,
                from = %dep.range,
                to = %range,
                "pinning dependency range"
            );
            dep.update(project, range)?;
        }
    }
    Ok(())
}

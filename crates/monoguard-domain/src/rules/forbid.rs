use crate::error::ProjectError;
use crate::model::DependencyQuery;
use crate::project::Project;
use crate::rules::utils::Reporter;
use monoguard_types::ids;
use serde_json::json;

/// Report and delete every edge on a forbidden identity, in any workspace and any type.
pub fn forbid(
    project: &mut dyn Project,
    forbidden: &[String],
    reporter: &mut Reporter<'_>,
) -> Result<(), ProjectError> {
    for ident in forbidden {
        for dep in project.dependencies(&DependencyQuery::all().ident(ident)) {
            reporter.on_dependency(
                &dep,
                ids::CODE_FORBIDDEN_DEPENDENCY,
                format!(
                    "dependency '{}' is forbidden ({} in {})",
                    dep.ident,
                    dep.dep_type.manifest_field(),
                    dep.workspace
                ),
                "Remove the dependency or replace it with an approved alternative.",
                json!({
                    "dependency": dep.ident,
                    "range": dep.range,
                    "type": dep.dep_type.as_str(),
                    "workspace": dep.workspace.as_str(),
                }),
            );
            dep.delete(project)?;
        }
    }
    Ok(())
}

use crate::error::ProjectError;
use crate::model::DependencyQuery;
use crate::policy::IgnoreList;
use crate::project::Project;
use crate::rules::utils::IdentityClassifier;
use monoguard_types::ids::WORKSPACE_PROTOCOL_RANGE;

/// Rewrite every non-ignored edge that targets a workspace to the `workspace:^` marker,
/// whatever its dependency type.
pub fn enforce_workspace_protocol(
    project: &mut dyn Project,
    ignore: &IgnoreList,
) -> Result<(), ProjectError> {
    let classifier = IdentityClassifier::from_project(project);
    let workspaces = project.workspaces();
    let ignore = ignore.scope(&workspaces);

    for dep in project.dependencies(&DependencyQuery::all()) {
        if ignore.ignores(&dep) || !classifier.is_workspace(&dep.ident) {
            continue;
        }
        if dep.range == WORKSPACE_PROTOCOL_RANGE {
            continue;
        }
        tracing::debug!(
            workspace = %dep.workspace,
            ident = %dep.ident,
            from = %dep.range,
            "switching to workspace protocol"
        );
        dep.update(project, WORKSPACE_PROTOCOL_RANGE)?;
    }
    Ok(())
}

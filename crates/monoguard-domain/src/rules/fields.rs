use crate::error::ProjectError;
use crate::manifest::FieldPath;
use crate::policy::FieldValue;
use crate::project::Project;

/// Apply every `(field, value)` pair to every workspace manifest.
///
/// Computed values are evaluated against the workspace as it was when the pass started.
/// A `null` value removes the field.
pub fn set_fields(
    project: &mut dyn Project,
    fields: &[(FieldPath, FieldValue)],
) -> Result<(), ProjectError> {
    for ws in project.workspaces() {
        for (path, value) in fields {
            let value = value.resolve(&ws);
            project.set_field(&ws.cwd, path, Some(value))?;
        }
    }
    Ok(())
}

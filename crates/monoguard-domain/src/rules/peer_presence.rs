use crate::error::ProjectError;
use crate::manifest::{DepType, FieldPath};
use crate::model::{Dependency, DependencyQuery};
use crate::policy::{PeerPresencePolicy, PeerSupplierPolicy};
use crate::project::Project;
use crate::rules::utils::Reporter;
use monoguard_types::ids;
use serde_json::{Value, json};
use std::collections::BTreeSet;

/// Make every workspace declare the peer dependencies of the packages it depends on.
///
/// For each non-peer edge with a resolution, each peer of the resolved package that the
/// package does not also list as a regular dependency must be declared by the workspace. The
/// range is copied from the other non-peer declarations of that peer ("suppliers"). The fix
/// goes to `devDependencies` when the workspace already lists the peer in its own
/// `peerDependencies`, and to `dependencies` otherwise.
pub fn enforce_peer_presence(
    project: &mut dyn Project,
    policy: &PeerPresencePolicy,
    reporter: &mut Reporter<'_>,
) -> Result<(), ProjectError> {
    let workspaces = project.workspaces();
    let ignore = policy.ignore.scope(&workspaces);

    for ws in &workspaces {
        if ignore.ignores_workspace(ws) {
            continue;
        }
        let requirers = project.dependencies(&DependencyQuery::all().workspace(&ws.cwd));

        for requirer in requirers.iter().filter(|d| d.dep_type != DepType::Peer) {
            if ignore.ignores(requirer) {
                continue;
            }
            let Some(resolution) = &requirer.resolution else {
                continue;
            };

            for peer in resolution.peer_dependencies.keys() {
                if ignore.ignores_ident(peer) || resolution.dependencies.contains_key(peer) {
                    continue;
                }

                let suppliers: Vec<Dependency> = project
                    .dependencies(&DependencyQuery::all().ident(peer))
                    .into_iter()
                    .filter(|d| d.dep_type != DepType::Peer && !ignore.ignores(d))
                    .collect();

                if suppliers.is_empty() {
                    reporter.on_workspace(
                        &ws.cwd,
                        peer,
                        Some(&requirer.ident),
                        ids::CODE_MISSING_PEER_SUPPLIER,
                        format!(
                            "missing peer dependency '{}' required by '{}', and no workspace provides it",
                            peer, requirer.ident
                        ),
                        "Declare the peer dependency with an explicit range.",
                        json!({
                            "peer": peer,
                            "required_by": requirer.ident,
                            "workspace": ws.cwd.as_str(),
                        }),
                    );
                }

                let declares_peer = !project
                    .dependencies(
                        &DependencyQuery::all()
                            .ident(peer)
                            .workspace(&ws.cwd)
                            .dep_type(DepType::Peer),
                    )
                    .is_empty();
                let bucket = if declares_peer {
                    DepType::Dev
                } else {
                    DepType::Runtime
                };
                let path = FieldPath::dependency(bucket, peer);

                match policy.suppliers {
                    PeerSupplierPolicy::LastVisited => {
                        for supplier in &suppliers {
                            project.set_field(
                                &ws.cwd,
                                &path,
                                Some(Value::String(supplier.range.clone())),
                            )?;
                        }
                    }
                    PeerSupplierPolicy::RequireAgreement => {
                        let ranges: BTreeSet<&str> =
                            suppliers.iter().map(|s| s.range.as_str()).collect();
                        if ranges.len() > 1 {
                            reporter.on_workspace(
                                &ws.cwd,
                                peer,
                                Some(&requirer.ident),
                                ids::CODE_CONFLICTING_PEER_SUPPLIERS,
                                format!(
                                    "peer dependency '{}' required by '{}' is declared with conflicting ranges: {}",
                                    peer,
                                    requirer.ident,
                                    ranges.iter().copied().collect::<Vec<_>>().join(", ")
                                ),
                                "Align the existing declarations of the peer, then rerun the fix.",
                                json!({
                                    "peer": peer,
                                    "required_by": requirer.ident,
                                    "ranges": ranges,
                                    "workspace": ws.cwd.as_str(),
                                }),
                            );
                            continue;
                        }
                        if let Some(range) = ranges.into_iter().next() {
                            project.set_field(
                                &ws.cwd,
                                &path,
                                Some(Value::String(range.to_string())),
                            )?;
                        }
                    }
                }

                if !suppliers.is_empty() {
                    tracing::debug!(
                        workspace = %ws.cwd,
                        peer = %peer,
                        required_by = %requirer.ident,
                        bucket = %bucket,
                        "declared peer dependency"
                    );
                }
            }
        }
    }
    Ok(())
}

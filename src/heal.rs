//! Quorum-based repair of missing manifests.
//!
//! Healing runs while the deployment is still usable: a surviving majority
//! keeps serving reads while fresh or replaced endpoints are folded back in.
//! The ordering carried by any surviving manifest is authoritative; absent
//! slots get freshly minted identities spliced into it, and the updated
//! ordering is republished to the whole fleet.

use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use crate::check::check_manifests;
use crate::endpoint::StorageEndpoint;
use crate::error::FormatError;
use crate::init::init_format;
use crate::loader::load_all_manifests;
use crate::loader::LoadError;
use crate::manifest::FormatManifest;
use crate::publish::save_all_manifests;

/// Heal missing manifests across the fleet.
///
/// - Every manifest present: nothing to do.
/// - Every manifest absent: delegates to the initializer.
/// - Otherwise: validates the survivors, splices a fresh identity into the
///   ordering at every absent slot, and republishes the updated ordering to
///   every writable endpoint. Identities of surviving endpoints never
///   change.
///
/// Absent slots whose endpoint is unreachable are only replaced when the
/// caller grants `force`; without it the heal refuses with
/// [`FormatError::NeedsForce`]. A forcibly replaced endpoint is excluded
/// from future mounts until it is re-formatted, and no write is attempted
/// against it.
pub async fn heal_format(
    endpoints: &[Arc<dyn StorageEndpoint>],
    force: bool,
) -> Result<(), FormatError> {
    let endpoint_count = endpoints.len();
    let (manifests, errors) = load_all_manifests(endpoints).await;

    // Anything beyond "fresh" or "offline" is not repairable here.
    for err in errors.iter().flatten() {
        match err {
            LoadError::Unformatted | LoadError::Unreachable => {}
            LoadError::Corrupted => return Err(FormatError::Corrupted),
            LoadError::Endpoint { source } => {
                return Err(FormatError::Endpoint {
                    source: source.clone(),
                })
            }
        }
    }

    if manifests.iter().all(|slot| slot.is_some()) {
        debug!("every manifest present, nothing to heal");
        return Ok(());
    }
    let Some(reference) = manifests.iter().flatten().next().cloned() else {
        // No manifest anywhere: the fleet is fresh.
        return init_format(endpoints).await;
    };

    check_manifests(&manifests)?;

    let dead: Vec<usize> = errors
        .iter()
        .enumerate()
        .filter(|(_, err)| matches!(err, Some(LoadError::Unreachable)))
        .map(|(index, _)| index)
        .collect();
    if !dead.is_empty() && !force {
        warn!(
            dead = ?dead,
            "healing would mark offline endpoints dead, caller must grant force"
        );
        return Err(FormatError::NeedsForce);
    }

    let reference_xl = reference.xl.as_ref().ok_or(FormatError::Corrupted)?;

    // Splice a fresh identity into every absent slot. The checker has
    // already pinned the ordering length to the fleet size, so bootstrap
    // position and ordering position coincide here.
    let mut new_order = reference_xl.jbod.clone();
    let mut healed: Vec<usize> = Vec::new();
    for (index, slot) in manifests.iter().enumerate() {
        if slot.is_none() {
            new_order[index] = Uuid::new_v4().to_string();
            healed.push(index);
        }
    }

    let updated: Vec<Option<FormatManifest>> = manifests
        .iter()
        .enumerate()
        .map(|(index, slot)| match slot {
            // Survivors keep their identity; only the ordering is rewritten.
            Some(manifest) => {
                let mut manifest = manifest.clone();
                if let Some(xl) = manifest.xl.as_mut() {
                    xl.jbod = new_order.clone();
                }
                Some(manifest)
            }
            // Dead slot: its replacement identity is already in the
            // ordering, but nothing can be written to the endpoint.
            None if dead.contains(&index) => None,
            // Fresh slot: full new manifest under the replacement identity.
            None => Some(FormatManifest::new_xl(
                new_order[index].clone(),
                new_order.clone(),
            )),
        })
        .collect();

    info!(
        endpoint_count,
        healed = ?healed,
        dead = ?dead,
        "healing deployment format"
    );
    save_all_manifests(endpoints, &updated).await
}

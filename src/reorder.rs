//! Canonical reordering of the bootstrap endpoint vector.
//!
//! The erasure code requires endpoints in the same order on every mount.
//! Callers hand endpoints over in whatever order their configuration lists
//! them; this module permutes that vector into the ordering agreed by the
//! fleet's manifests.

use std::sync::Arc;

use crate::error::FormatError;
use crate::manifest::FormatManifest;
use crate::endpoint::StorageEndpoint;

/// Permute `endpoints` into the canonical order recorded in `manifests`.
///
/// The ordering is taken from the first present manifest; the consistency
/// checker has already established that all present manifests agree on it.
/// `result[k]` is the endpoint whose identity sits at position `k` of the
/// ordering. Slots whose manifest is absent stay `None`; the caller's
/// erasure code must tolerate the holes up to its own quorum.
///
/// An identity that does not occur in the agreed ordering is a fatal
/// [`FormatError::UnknownIdentity`].
pub fn reorder_endpoints(
    endpoints: &[Arc<dyn StorageEndpoint>],
    manifests: &[Option<FormatManifest>],
) -> Result<Vec<Option<Arc<dyn StorageEndpoint>>>, FormatError> {
    let order = manifests
        .iter()
        .flatten()
        .filter_map(|manifest| manifest.xl.as_ref())
        .map(|xl| xl.jbod.as_slice())
        .next();
    let Some(order) = order else {
        // Nothing to order by; every slot stays empty.
        return Ok(vec![None; endpoints.len()]);
    };

    let mut reordered: Vec<Option<Arc<dyn StorageEndpoint>>> = vec![None; endpoints.len()];
    for (bootstrap_index, manifest) in manifests.iter().enumerate() {
        let Some(manifest) = manifest else { continue };
        let Some(xl) = manifest.xl.as_ref() else { continue };
        let canonical_index = order
            .iter()
            .position(|identity| identity == &xl.disk)
            .ok_or_else(|| FormatError::UnknownIdentity {
                identity: xl.disk.clone(),
            })?;
        reordered[canonical_index] = Some(Arc::clone(&endpoints[bootstrap_index]));
    }
    Ok(reordered)
}

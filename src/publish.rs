//! Atomic manifest publish across the fleet.
//!
//! One independent task per endpoint: purge any stale temp file, append the
//! serialized manifest to `format.json.tmp`, then rename it over
//! `format.json`. The rename is the only commit point; a crash anywhere
//! before it leaves the previous manifest (or its absence) intact, and the
//! next mount's healer converges the stragglers.

use std::sync::Arc;

use tracing::debug;

use crate::constants::FORMAT_FILE;
use crate::constants::FORMAT_FILE_TMP;
use crate::constants::FORMAT_META_VOLUME;
use crate::endpoint::StorageEndpoint;
use crate::error::FormatError;
use crate::manifest::FormatManifest;

/// Publish `manifests[i]` to `endpoints[i]` for every populated slot.
///
/// Slots with no manifest are skipped; the healer uses this to leave dead
/// endpoints untouched. All endpoints are written concurrently and the call
/// joins before inspecting outcomes, so a failure on one endpoint never
/// cancels the writes in flight on the others. The first error (in slot
/// order) is returned; partial publishes are intentionally left in place.
pub async fn save_all_manifests(
    endpoints: &[Arc<dyn StorageEndpoint>],
    manifests: &[Option<FormatManifest>],
) -> Result<(), FormatError> {
    debug_assert_eq!(endpoints.len(), manifests.len());

    let results = futures::future::join_all(
        endpoints
            .iter()
            .zip(manifests.iter())
            .map(|(endpoint, manifest)| publish_one(endpoint.as_ref(), manifest.as_ref())),
    )
    .await;

    for result in results {
        result?;
    }
    Ok(())
}

async fn publish_one(
    endpoint: &dyn StorageEndpoint,
    manifest: Option<&FormatManifest>,
) -> Result<(), FormatError> {
    let Some(manifest) = manifest else {
        return Ok(());
    };
    let data = manifest.encode().map_err(|err| FormatError::Codec {
        message: err.to_string(),
    })?;

    // A stale temp file from a crashed publish must not be appended to.
    // The outcome of the purge itself is irrelevant.
    let _ = endpoint.delete(FORMAT_META_VOLUME, FORMAT_FILE_TMP).await;

    endpoint
        .append(FORMAT_META_VOLUME, FORMAT_FILE_TMP, &data)
        .await
        .map_err(|source| FormatError::Endpoint { source })?;

    // Commit point.
    endpoint
        .rename(
            FORMAT_META_VOLUME,
            FORMAT_FILE_TMP,
            FORMAT_META_VOLUME,
            FORMAT_FILE,
        )
        .await
        .map_err(|source| FormatError::Endpoint { source })?;

    debug!(endpoint = %endpoint.locator(), "manifest published");
    Ok(())
}

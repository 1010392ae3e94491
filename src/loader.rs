//! Manifest loading and fleet-level error reduction.
//!
//! [`load_manifest`] classifies a single endpoint; [`load_all_manifests`]
//! fans the classification out across the fleet and joins before anything
//! inspects the results; [`reduce_format_errors`] collapses the aligned
//! error vector into one fleet verdict for the caller's mount-or-heal
//! decision.

use std::sync::Arc;

use snafu::Snafu;
use tracing::debug;
use tracing::warn;

use crate::constants::FORMAT_BACKEND_XL;
use crate::constants::FORMAT_FILE;
use crate::constants::FORMAT_META_VOLUME;
use crate::endpoint::EndpointError;
use crate::endpoint::StorageEndpoint;
use crate::error::FormatError;
use crate::manifest::FormatManifest;

/// Classified outcome of loading one endpoint's manifest.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum LoadError {
    /// The endpoint looks fresh: no manifest and at most one volume.
    #[snafu(display("endpoint is unformatted"))]
    Unformatted,

    /// The endpoint holds user data but no readable manifest. Refuse to
    /// silently reinitialize it.
    #[snafu(display("endpoint holds user data without a valid manifest"))]
    Corrupted,

    /// The endpoint did not respond.
    #[snafu(display("endpoint is unreachable"))]
    Unreachable,

    /// Any other endpoint failure, passed through.
    #[snafu(display("{source}"))]
    Endpoint {
        /// The underlying endpoint error.
        source: EndpointError,
    },
}

/// Load and classify `format.json` from one endpoint.
///
/// Classification rules:
/// - manifest read and parsed: success;
/// - manifest or meta-volume absent, at most one volume listed:
///   [`LoadError::Unformatted`] (a fresh disk);
/// - manifest absent but more than one volume listed:
///   [`LoadError::Corrupted`] (user data with no manifest);
/// - malformed manifest payload: [`LoadError::Corrupted`];
/// - transport failure: [`LoadError::Unreachable`].
pub async fn load_manifest(endpoint: &dyn StorageEndpoint) -> Result<FormatManifest, LoadError> {
    let data = match endpoint.read_all(FORMAT_META_VOLUME, FORMAT_FILE).await {
        Ok(data) => data,
        // Missing file and missing meta-volume mean the same thing here:
        // nothing has ever been published. Look at the volume listing to
        // tell a fresh disk from one carrying orphaned user data.
        Err(err) if err.is_not_found() => {
            let volumes = match endpoint.list_volumes().await {
                Ok(volumes) => volumes,
                Err(EndpointError::Unreachable) => return Err(LoadError::Unreachable),
                Err(source) => return Err(LoadError::Endpoint { source }),
            };
            if volumes.len() > 1 {
                warn!(
                    endpoint = %endpoint.locator(),
                    volume_count = volumes.len(),
                    "manifest missing on an endpoint that holds user data"
                );
                return Err(LoadError::Corrupted);
            }
            debug!(endpoint = %endpoint.locator(), "endpoint is fresh");
            return Err(LoadError::Unformatted);
        }
        Err(EndpointError::Unreachable) => return Err(LoadError::Unreachable),
        Err(source) => return Err(LoadError::Endpoint { source }),
    };

    let manifest = match FormatManifest::decode(&data) {
        Ok(manifest) => manifest,
        Err(err) => {
            warn!(
                endpoint = %endpoint.locator(),
                error = %err,
                "manifest payload is malformed"
            );
            return Err(LoadError::Corrupted);
        }
    };
    // An "xl" record without its xl section is as unusable as bad JSON.
    if manifest.format == FORMAT_BACKEND_XL && manifest.xl.is_none() {
        warn!(endpoint = %endpoint.locator(), "xl manifest is missing its xl section");
        return Err(LoadError::Corrupted);
    }
    debug!(endpoint = %endpoint.locator(), "manifest loaded");
    Ok(manifest)
}

/// Load manifests from every endpoint concurrently.
///
/// Returns two index-aligned vectors: `manifests[i]` is set iff endpoint `i`
/// produced a manifest, `errors[i]` is set otherwise. The fan-out itself
/// never fails; per-endpoint outcomes are always reported positionally.
pub async fn load_all_manifests(
    endpoints: &[Arc<dyn StorageEndpoint>],
) -> (Vec<Option<FormatManifest>>, Vec<Option<LoadError>>) {
    let results = futures::future::join_all(
        endpoints.iter().map(|endpoint| load_manifest(endpoint.as_ref())),
    )
    .await;

    let mut manifests = Vec::with_capacity(endpoints.len());
    let mut errors = Vec::with_capacity(endpoints.len());
    for result in results {
        match result {
            Ok(manifest) => {
                manifests.push(Some(manifest));
                errors.push(None);
            }
            Err(err) => {
                manifests.push(None);
                errors.push(Some(err));
            }
        }
    }
    (manifests, errors)
}

/// Collapse the fleet's error vector into a single verdict.
///
/// - every endpoint unformatted: [`FormatError::Unformatted`] — the caller
///   may initialize a fresh deployment;
/// - at least one unformatted, none unreachable, rest healthy:
///   [`FormatError::SomeUnformatted`] — the caller may heal;
/// - at least one unformatted and at least one unreachable:
///   [`FormatError::SomeOffline`] — healing needs force;
/// - anything else: `None`; the caller inspects the raw vector for
///   corruption or quorum failures.
///
/// Pure classification over the vector; no policy decision is taken here.
pub fn reduce_format_errors(errors: &[Option<LoadError>], endpoint_count: usize) -> Option<FormatError> {
    let unformatted = errors
        .iter()
        .filter(|e| matches!(e, Some(LoadError::Unformatted)))
        .count();
    let unreachable = errors
        .iter()
        .filter(|e| matches!(e, Some(LoadError::Unreachable)))
        .count();

    if unformatted == endpoint_count {
        Some(FormatError::Unformatted)
    } else if unformatted > 0 && unreachable == 0 {
        Some(FormatError::SomeUnformatted)
    } else if unformatted > 0 && unreachable > 0 {
        Some(FormatError::SomeOffline)
    } else {
        None
    }
}

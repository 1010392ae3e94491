//! Mount-time classification of the fleet.
//!
//! The entry point a deployment calls on startup. One concurrent load pass
//! over all bootstrap endpoints, then a strictly sequential decision:
//!
//! ```text
//! load fleet ──► fatal error?  ──► refuse (corrupted / passthrough)
//!            ──► all fresh?    ──► Unformatted (caller may initialize)
//!            ──► all offline?  ──► Unreachable
//!            ──► quorum lost?  ──► NoReadQuorum
//!            ──► inconsistent? ──► checker verdict
//!            ──► healthy       ──► endpoints permuted into canonical order
//! ```
//!
//! The two quorum thresholds keep a split brain from being read as a
//! healthy cluster with a few missing disks: too many unreachable disks
//! mean no majority agrees on anything, and too many fresh disks mixed
//! with live ones mean the fleet needs an explicit heal first.

use std::sync::Arc;

use tracing::info;
use tracing::warn;

use crate::check::check_manifests;
use crate::constants::read_quorum;
use crate::endpoint::StorageEndpoint;
use crate::error::FormatError;
use crate::loader::load_all_manifests;
use crate::loader::LoadError;
use crate::reorder::reorder_endpoints;

/// Quorum verdict over the fleet's unformatted / unreachable counts.
///
/// Pure and total: the outcome depends only on the three counts. `None`
/// means the fleet composition alone is no obstacle and consistency
/// checking decides.
pub fn mount_verdict(
    unformatted: usize,
    unreachable: usize,
    endpoint_count: usize,
) -> Option<FormatError> {
    let tolerance = endpoint_count.saturating_sub(read_quorum(endpoint_count));
    if unformatted == endpoint_count {
        Some(FormatError::Unformatted)
    } else if unreachable == endpoint_count {
        Some(FormatError::Unreachable)
    } else if unreachable > tolerance {
        Some(FormatError::NoReadQuorum)
    } else if unformatted > tolerance {
        // Too many fresh disks mixed with live ones; an explicit heal must
        // decide, not the mount.
        Some(FormatError::NoReadQuorum)
    } else {
        None
    }
}

/// Load, validate, and canonically order the deployment's endpoints.
///
/// On success returns the endpoint vector permuted into the canonical
/// ordering; slots for tolerated-absent endpoints are `None` and the
/// caller's erasure code must absorb them.
///
/// Surfaced non-fatal refusals: [`FormatError::Unformatted`] (run the
/// initializer) and the quorum refusals. Everything else is fatal per the
/// crate's error taxonomy.
pub async fn mount_format(
    endpoints: &[Arc<dyn StorageEndpoint>],
) -> Result<Vec<Option<Arc<dyn StorageEndpoint>>>, FormatError> {
    let endpoint_count = endpoints.len();
    let (manifests, errors) = load_all_manifests(endpoints).await;

    let mut unformatted: usize = 0;
    let mut unreachable: usize = 0;
    for err in errors.iter().flatten() {
        match err {
            LoadError::Unformatted => unformatted += 1,
            LoadError::Unreachable => unreachable += 1,
            LoadError::Corrupted => {
                warn!("refusing to mount a fleet with a corrupted endpoint");
                return Err(FormatError::Corrupted);
            }
            LoadError::Endpoint { source } => {
                return Err(FormatError::Endpoint {
                    source: source.clone(),
                })
            }
        }
    }

    if let Some(verdict) = mount_verdict(unformatted, unreachable, endpoint_count) {
        return Err(verdict);
    }

    check_manifests(&manifests)?;

    info!(
        endpoint_count,
        unformatted,
        unreachable,
        quorum = read_quorum(endpoint_count),
        "deployment format verified"
    );
    reorder_endpoints(endpoints, &manifests)
}

//! First-time deployment format.
//!
//! Runs only when the mount reported every endpoint unformatted. Minting
//! the identities and fixing their order is the single moment the
//! deployment's canonical ordering comes into existence; it never changes
//! afterwards except slot-by-slot through the healer.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::endpoint::StorageEndpoint;
use crate::error::FormatError;
use crate::manifest::FormatManifest;
use crate::publish::save_all_manifests;

/// Format a fresh deployment.
///
/// Mints one identity per endpoint, fixes the canonical ordering to the
/// bootstrap order supplied by the caller, and publishes one manifest per
/// endpoint through the atomic publish protocol. Any endpoint failure
/// aborts with that error; partially published manifests are left for the
/// healer to reconcile on the next mount.
pub async fn init_format(endpoints: &[Arc<dyn StorageEndpoint>]) -> Result<(), FormatError> {
    let order: Vec<String> = endpoints
        .iter()
        .map(|_| Uuid::new_v4().to_string())
        .collect();

    let manifests: Vec<Option<FormatManifest>> = order
        .iter()
        .map(|identity| Some(FormatManifest::new_xl(identity.clone(), order.clone())))
        .collect();

    info!(
        endpoint_count = endpoints.len(),
        "formatting fresh deployment"
    );
    save_all_manifests(endpoints, &manifests).await
}

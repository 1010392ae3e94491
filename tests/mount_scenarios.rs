//! End-to-end mount / initialize / heal scenarios over in-memory fleets.
//!
//! Each test walks the same path a deployment takes at startup: load the
//! fleet, act on the verdict, and verify the on-disk outcome across all
//! endpoints.

use std::sync::Arc;

use atoll_format::heal_format;
use atoll_format::init_format;
use atoll_format::load_all_manifests;
use atoll_format::mount_format;
use atoll_format::reduce_format_errors;
use atoll_format::EndpointError;
use atoll_format::FormatError;
use atoll_format::FormatManifest;
use atoll_format::LocalEndpoint;
use atoll_format::MemoryEndpoint;
use atoll_format::StorageEndpoint;
use atoll_format::FORMAT_FILE;
use atoll_format::FORMAT_META_VOLUME;

fn fresh_fleet(count: usize) -> (Vec<Arc<MemoryEndpoint>>, Vec<Arc<dyn StorageEndpoint>>) {
    let concrete: Vec<Arc<MemoryEndpoint>> =
        (0..count).map(|i| MemoryEndpoint::new(format!("m{i}"))).collect();
    let dynamic = concrete
        .iter()
        .map(|e| e.clone() as Arc<dyn StorageEndpoint>)
        .collect();
    (concrete, dynamic)
}

async fn formatted_fleet(count: usize) -> (Vec<Arc<MemoryEndpoint>>, Vec<Arc<dyn StorageEndpoint>>) {
    let (concrete, dynamic) = fresh_fleet(count);
    init_format(&dynamic).await.unwrap();
    (concrete, dynamic)
}

async fn manifest_on(endpoint: &MemoryEndpoint) -> FormatManifest {
    let data = endpoint.file(FORMAT_META_VOLUME, FORMAT_FILE).await.unwrap();
    FormatManifest::decode(&data).unwrap()
}

async fn identity_on(endpoint: &MemoryEndpoint) -> String {
    manifest_on(endpoint).await.xl.unwrap().disk
}

// ============================================================================
// Scenario: fresh deployment
// ============================================================================

#[tokio::test]
async fn fresh_fleet_mounts_as_unformatted_then_initializes() {
    let (concrete, dynamic) = fresh_fleet(4);

    let err = mount_format(&dynamic).await.unwrap_err();
    assert_eq!(err, FormatError::Unformatted);

    init_format(&dynamic).await.unwrap();

    // Four manifests, four distinct identities, one shared ordering equal to
    // the bootstrap sequence.
    let mut identities = Vec::new();
    for endpoint in &concrete {
        identities.push(identity_on(endpoint).await);
    }
    for endpoint in &concrete {
        let manifest = manifest_on(endpoint).await;
        assert_eq!(manifest.xl.unwrap().jbod, identities);
    }
    identities.sort();
    identities.dedup();
    assert_eq!(identities.len(), 4, "identities must be distinct");
}

// ============================================================================
// Scenario: healthy remount under a shuffled bootstrap order
// ============================================================================

#[tokio::test]
async fn shuffled_remount_restores_canonical_order() {
    let (concrete, dynamic) = formatted_fleet(4).await;

    // Same fleet, bootstrap order [E2, E0, E3, E1].
    let shuffled: Vec<Arc<dyn StorageEndpoint>> = [2usize, 0, 3, 1]
        .iter()
        .map(|&i| dynamic[i].clone())
        .collect();

    let ordered = mount_format(&shuffled).await.unwrap();
    for (canonical_index, endpoint) in concrete.iter().enumerate() {
        let slot = ordered[canonical_index].as_ref().expect("slot filled");
        assert_eq!(slot.locator(), endpoint.locator());
    }
}

// ============================================================================
// Scenario: single replaced disk
// ============================================================================

#[tokio::test]
async fn replaced_disk_heals_with_fresh_identity() {
    let (concrete, mut dynamic) = formatted_fleet(4).await;
    let old_identity = identity_on(&concrete[2]).await;
    let survivors: Vec<String> = {
        let mut ids = Vec::new();
        for endpoint in [&concrete[0], &concrete[1], &concrete[3]] {
            ids.push(identity_on(endpoint).await);
        }
        ids
    };

    let blank = MemoryEndpoint::new("m-replacement");
    dynamic[2] = blank.clone();

    let (_, errors) = load_all_manifests(&dynamic).await;
    assert_eq!(
        reduce_format_errors(&errors, 4),
        Some(FormatError::SomeUnformatted)
    );

    heal_format(&dynamic, false).await.unwrap();

    let healed = manifest_on(&blank).await.xl.unwrap();
    assert_ne!(healed.jbod[2], old_identity);
    assert_eq!(healed.disk, healed.jbod[2]);

    // Surviving identities unchanged, ordering updated everywhere.
    for (endpoint, expected) in [&concrete[0], &concrete[1], &concrete[3]]
        .iter()
        .zip(&survivors)
    {
        let manifest = manifest_on(endpoint).await.xl.unwrap();
        assert_eq!(&manifest.disk, expected);
        assert_eq!(manifest.jbod, healed.jbod);
    }

    // The healed fleet mounts cleanly.
    assert!(mount_format(&dynamic).await.is_ok());
}

// ============================================================================
// Scenario: offline endpoint during heal
// ============================================================================

#[tokio::test]
async fn offline_endpoint_blocks_heal_until_forced() {
    let (concrete, mut dynamic) = formatted_fleet(4).await;
    let blank = MemoryEndpoint::new("m-replacement");
    dynamic[1] = blank;
    let offline_identity = identity_on(&concrete[3]).await;
    concrete[3].set_offline(true);

    let (_, errors) = load_all_manifests(&dynamic).await;
    assert_eq!(reduce_format_errors(&errors, 4), Some(FormatError::SomeOffline));

    let err = heal_format(&dynamic, false).await.unwrap_err();
    assert_eq!(err, FormatError::NeedsForce);

    heal_format(&dynamic, true).await.unwrap();

    // The dead slot carries a replacement identity; the old one is gone from
    // the deployment until the disk is re-formatted.
    let order = manifest_on(&concrete[0]).await.xl.unwrap().jbod;
    assert!(!order.contains(&offline_identity));

    // Mount still succeeds with the dead endpoint offline: its slot is empty.
    let ordered = mount_format(&dynamic).await.unwrap();
    assert_eq!(ordered.iter().filter(|slot| slot.is_some()).count(), 3);
    assert!(ordered[3].is_none());
}

// ============================================================================
// Scenario: split brain
// ============================================================================

#[tokio::test]
async fn split_brain_ordering_is_refused() {
    let (concrete, dynamic) = fresh_fleet(4);
    let order_a = vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()];
    let order_b = vec!["A".to_string(), "B".to_string(), "D".to_string(), "C".to_string()];
    let identities = ["A", "B", "C", "D"];
    for (index, endpoint) in concrete.iter().enumerate() {
        let order = if index < 2 { order_a.clone() } else { order_b.clone() };
        let manifest = FormatManifest::new_xl(identities[index].to_string(), order);
        endpoint
            .put_file(FORMAT_META_VOLUME, FORMAT_FILE, &manifest.encode().unwrap())
            .await;
    }

    let err = mount_format(&dynamic).await.unwrap_err();
    assert!(
        matches!(
            err,
            FormatError::InconsistentOrder | FormatError::OrderMismatch { .. }
        ),
        "split brain must be fatal, got {err:?}"
    );
}

// ============================================================================
// Scenario: user data without a manifest
// ============================================================================

#[tokio::test]
async fn user_data_without_manifest_is_fatal_despite_healthy_majority() {
    let (_concrete, mut dynamic) = formatted_fleet(4).await;
    // A disk that lost its manifest but still carries user volumes.
    let corrupt = MemoryEndpoint::new("m1-corrupt");
    corrupt.put_file("photos", "a.jpg", b"data").await;
    corrupt.put_file("backups", "b.bak", b"data").await;
    dynamic[1] = corrupt;

    let err = mount_format(&dynamic).await.unwrap_err();
    assert_eq!(err, FormatError::Corrupted);
}

// ============================================================================
// Quorum boundaries
// ============================================================================

#[tokio::test]
async fn unreachable_exactly_at_tolerance_mounts() {
    // N = 5, Q = 3: two unreachable endpoints are tolerated.
    let (concrete, dynamic) = formatted_fleet(5).await;
    concrete[0].set_offline(true);
    concrete[4].set_offline(true);

    let ordered = mount_format(&dynamic).await.unwrap();
    assert_eq!(ordered.iter().filter(|slot| slot.is_some()).count(), 3);
}

#[tokio::test]
async fn one_more_unreachable_loses_the_quorum() {
    let (concrete, dynamic) = formatted_fleet(5).await;
    concrete[0].set_offline(true);
    concrete[2].set_offline(true);
    concrete[4].set_offline(true);

    let err = mount_format(&dynamic).await.unwrap_err();
    assert_eq!(err, FormatError::NoReadQuorum);
}

#[tokio::test]
async fn fully_offline_fleet_is_unreachable() {
    let (concrete, dynamic) = formatted_fleet(3).await;
    for endpoint in &concrete {
        endpoint.set_offline(true);
    }
    let err = mount_format(&dynamic).await.unwrap_err();
    assert_eq!(err, FormatError::Unreachable);
}

#[tokio::test]
async fn single_endpoint_deployment_has_no_tolerance() {
    let (concrete, dynamic) = formatted_fleet(1).await;
    assert!(mount_format(&dynamic).await.is_ok());

    concrete[0].set_offline(true);
    let err = mount_format(&dynamic).await.unwrap_err();
    assert_eq!(err, FormatError::Unreachable);
}

// ============================================================================
// Healing convergence
// ============================================================================

#[tokio::test]
async fn heal_is_idempotent_once_converged() {
    let (concrete, mut dynamic) = formatted_fleet(4).await;
    dynamic[2] = MemoryEndpoint::new("m-replacement");

    heal_format(&dynamic, false).await.unwrap();
    let after_first: Vec<FormatManifest> = {
        let mut manifests = Vec::new();
        for index in [0usize, 1, 3] {
            manifests.push(manifest_on(&concrete[index]).await);
        }
        manifests
    };

    // A second heal and a mount must not disturb anything.
    heal_format(&dynamic, false).await.unwrap();
    mount_format(&dynamic).await.unwrap();
    for (slot, expected) in [0usize, 1, 3].iter().zip(&after_first) {
        assert_eq!(&manifest_on(&concrete[*slot]).await, expected);
    }
}

#[tokio::test]
async fn interrupted_initialize_converges_on_next_heal() {
    // One endpoint misses the first publish; the healer folds it back in.
    let (concrete, dynamic) = fresh_fleet(4);
    concrete[3].set_offline(true);
    let err = init_format(&dynamic).await.unwrap_err();
    assert_eq!(
        err,
        FormatError::Endpoint {
            source: EndpointError::Unreachable
        }
    );

    concrete[3].set_offline(false);
    heal_format(&dynamic, false).await.unwrap();

    let ordered = mount_format(&dynamic).await.unwrap();
    assert!(ordered.iter().all(|slot| slot.is_some()));
}

// ============================================================================
// Local filesystem endpoints
// ============================================================================

#[tokio::test]
async fn local_disk_fleet_initializes_and_remounts() {
    let dir = tempfile::TempDir::new().unwrap();
    let dynamic: Vec<Arc<dyn StorageEndpoint>> = (0..4)
        .map(|i| LocalEndpoint::new(dir.path().join(format!("disk{i}"))) as Arc<dyn StorageEndpoint>)
        .collect();

    let err = mount_format(&dynamic).await.unwrap_err();
    assert_eq!(err, FormatError::Unformatted);

    init_format(&dynamic).await.unwrap();

    let ordered = mount_format(&dynamic).await.unwrap();
    assert!(ordered.iter().all(|slot| slot.is_some()));

    // The manifest really is on disk where the layout says it is.
    let raw = std::fs::read(
        dir.path()
            .join("disk0")
            .join(FORMAT_META_VOLUME)
            .join(FORMAT_FILE),
    )
    .unwrap();
    let manifest = FormatManifest::decode(&raw).unwrap();
    assert_eq!(manifest.xl.unwrap().jbod.len(), 4);
}

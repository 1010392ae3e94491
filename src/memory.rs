//! In-memory storage endpoint for tests and deterministic simulation.
//!
//! Mirrors the behavior of a real endpoint without disk or network I/O:
//! volumes are created on first write, renames are atomic, deletes are
//! idempotent. Failure injection via [`MemoryEndpoint::set_offline`] turns
//! every operation into [`EndpointError::Unreachable`], which is how tests
//! model a dead disk or a partitioned node.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::endpoint::EndpointError;
use crate::endpoint::StorageEndpoint;
use crate::endpoint::VolumeInfo;

#[derive(Debug)]
struct Volume {
    created: SystemTime,
    files: BTreeMap<String, Vec<u8>>,
}

impl Volume {
    fn new() -> Self {
        Volume {
            created: SystemTime::now(),
            files: BTreeMap::new(),
        }
    }
}

/// Deterministic, non-persistent [`StorageEndpoint`].
#[derive(Debug)]
pub struct MemoryEndpoint {
    locator: String,
    volumes: Mutex<BTreeMap<String, Volume>>,
    offline: AtomicBool,
}

impl MemoryEndpoint {
    /// Create a fresh endpoint with no volumes.
    pub fn new(locator: impl Into<String>) -> Arc<Self> {
        Arc::new(MemoryEndpoint {
            locator: locator.into(),
            volumes: Mutex::new(BTreeMap::new()),
            offline: AtomicBool::new(false),
        })
    }

    /// Inject or clear unreachability.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Seed a file directly, bypassing the trait surface. Test setup only.
    pub async fn put_file(&self, volume: &str, path: &str, data: &[u8]) {
        let mut volumes = self.volumes.lock().await;
        volumes
            .entry(volume.to_string())
            .or_insert_with(Volume::new)
            .files
            .insert(path.to_string(), data.to_vec());
    }

    /// Read a file directly, bypassing the trait surface and the offline
    /// flag. Test inspection only.
    pub async fn file(&self, volume: &str, path: &str) -> Option<Vec<u8>> {
        let volumes = self.volumes.lock().await;
        volumes.get(volume).and_then(|v| v.files.get(path)).cloned()
    }

    fn check_online(&self) -> Result<(), EndpointError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(EndpointError::Unreachable);
        }
        Ok(())
    }
}

#[async_trait]
impl StorageEndpoint for MemoryEndpoint {
    fn locator(&self) -> String {
        self.locator.clone()
    }

    async fn read_all(&self, volume: &str, path: &str) -> Result<Vec<u8>, EndpointError> {
        self.check_online()?;
        let volumes = self.volumes.lock().await;
        let vol = volumes
            .get(volume)
            .ok_or_else(|| EndpointError::VolumeNotFound {
                volume: volume.to_string(),
            })?;
        vol.files
            .get(path)
            .cloned()
            .ok_or_else(|| EndpointError::FileNotFound {
                volume: volume.to_string(),
                path: path.to_string(),
            })
    }

    async fn list_volumes(&self) -> Result<Vec<VolumeInfo>, EndpointError> {
        self.check_online()?;
        let volumes = self.volumes.lock().await;
        Ok(volumes
            .iter()
            .map(|(name, volume)| VolumeInfo {
                name: name.clone(),
                created: Some(volume.created),
            })
            .collect())
    }

    async fn append(&self, volume: &str, path: &str, data: &[u8]) -> Result<(), EndpointError> {
        self.check_online()?;
        let mut volumes = self.volumes.lock().await;
        volumes
            .entry(volume.to_string())
            .or_insert_with(Volume::new)
            .files
            .entry(path.to_string())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    async fn rename(
        &self,
        src_volume: &str,
        src_path: &str,
        dst_volume: &str,
        dst_path: &str,
    ) -> Result<(), EndpointError> {
        self.check_online()?;
        let mut volumes = self.volumes.lock().await;
        let data = volumes
            .get_mut(src_volume)
            .ok_or_else(|| EndpointError::VolumeNotFound {
                volume: src_volume.to_string(),
            })?
            .files
            .remove(src_path)
            .ok_or_else(|| EndpointError::FileNotFound {
                volume: src_volume.to_string(),
                path: src_path.to_string(),
            })?;
        volumes
            .entry(dst_volume.to_string())
            .or_insert_with(Volume::new)
            .files
            .insert(dst_path.to_string(), data);
        Ok(())
    }

    async fn delete(&self, volume: &str, path: &str) -> Result<(), EndpointError> {
        self.check_online()?;
        let mut volumes = self.volumes.lock().await;
        if let Some(vol) = volumes.get_mut(volume) {
            vol.files.remove(path);
        }
        Ok(())
    }
}

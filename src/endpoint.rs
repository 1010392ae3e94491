//! Storage endpoint contract consumed by the format core.
//!
//! An endpoint is one addressable back-end of the deployment — a local disk
//! or a remote storage node. The format core only needs a narrow slice of
//! the full storage surface: read a whole file, list volumes, append,
//! rename, delete. Everything else (object I/O, erasure coding) lives in
//! higher layers and never touches this trait.
//!
//! Implementations must make [`StorageEndpoint::rename`] atomic on the
//! endpoint; it is the commit point of the manifest publish protocol.

use std::time::SystemTime;

use async_trait::async_trait;
use snafu::Snafu;

/// Metadata for one volume on an endpoint.
#[derive(Debug, Clone)]
pub struct VolumeInfo {
    /// Volume name, unique per endpoint.
    pub name: String,
    /// Creation time, when the endpoint tracks it.
    pub created: Option<SystemTime>,
}

/// Errors surfaced by a storage endpoint.
///
/// The per-endpoint loader relies on the distinction between the first three
/// variants to tell a fresh disk from a dead one; adapters must not collapse
/// them into [`EndpointError::Io`].
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum EndpointError {
    /// The requested file does not exist in the volume.
    #[snafu(display("file '{path}' not found in volume '{volume}'"))]
    FileNotFound {
        /// Volume that was searched.
        volume: String,
        /// Path of the missing file.
        path: String,
    },

    /// The requested volume does not exist on the endpoint.
    #[snafu(display("volume '{volume}' not found"))]
    VolumeNotFound {
        /// Name of the missing volume.
        volume: String,
    },

    /// The endpoint did not respond or failed at the transport level.
    #[snafu(display("endpoint is unreachable"))]
    Unreachable,

    /// Any other I/O failure on a reachable endpoint.
    #[snafu(display("endpoint i/o error: {message}"))]
    Io {
        /// Description of the underlying failure.
        message: String,
    },
}

/// Narrow storage contract over one deployment back-end.
///
/// All paths are relative to a volume; volumes are flat namespaces. Caller
/// supplied deadlines and cancellation are the adapter's responsibility.
#[async_trait]
pub trait StorageEndpoint: Send + Sync + std::fmt::Debug {
    /// Stable human-readable locator for logs and error context.
    fn locator(&self) -> String;

    /// Read the entire content of `path` inside `volume`.
    async fn read_all(&self, volume: &str, path: &str) -> Result<Vec<u8>, EndpointError>;

    /// List all volumes present on the endpoint, including reserved ones.
    async fn list_volumes(&self) -> Result<Vec<VolumeInfo>, EndpointError>;

    /// Append `data` to `path` inside `volume`, creating both on first write.
    async fn append(&self, volume: &str, path: &str, data: &[u8]) -> Result<(), EndpointError>;

    /// Atomically move `src_path` in `src_volume` to `dst_path` in `dst_volume`.
    async fn rename(
        &self,
        src_volume: &str,
        src_path: &str,
        dst_volume: &str,
        dst_path: &str,
    ) -> Result<(), EndpointError>;

    /// Delete `path` inside `volume`. Deleting a missing file is a success.
    async fn delete(&self, volume: &str, path: &str) -> Result<(), EndpointError>;
}

impl EndpointError {
    /// True when the error means "the file or its volume is absent",
    /// which the loader treats as a live disk with nothing on it yet.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EndpointError::FileNotFound { .. } | EndpointError::VolumeNotFound { .. }
        )
    }
}

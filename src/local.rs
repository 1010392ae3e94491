//! Local-filesystem storage endpoint.
//!
//! One directory per endpoint; volumes are immediate subdirectories and
//! files live flat inside them. Rename maps to `rename(2)`, which is atomic
//! on a single filesystem — the property the manifest publish protocol
//! relies on. Remote transports implement [`StorageEndpoint`] elsewhere;
//! this adapter covers the single-host JBOD layout.

use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::endpoint::EndpointError;
use crate::endpoint::StorageEndpoint;
use crate::endpoint::VolumeInfo;

/// [`StorageEndpoint`] over a local directory.
#[derive(Debug)]
pub struct LocalEndpoint {
    root: PathBuf,
}

impl LocalEndpoint {
    /// Create an endpoint rooted at `root`.
    ///
    /// The directory itself is created lazily on the first write, so a
    /// never-touched endpoint lists no volumes and reads as a fresh disk.
    pub fn new(root: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(LocalEndpoint { root: root.into() })
    }

    fn volume_dir(&self, volume: &str) -> PathBuf {
        self.root.join(volume)
    }

    fn file_path(&self, volume: &str, path: &str) -> PathBuf {
        self.root.join(volume).join(path)
    }
}

fn io_error(err: std::io::Error) -> EndpointError {
    EndpointError::Io {
        message: err.to_string(),
    }
}

async fn dir_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

#[async_trait]
impl StorageEndpoint for LocalEndpoint {
    fn locator(&self) -> String {
        self.root.display().to_string()
    }

    async fn read_all(&self, volume: &str, path: &str) -> Result<Vec<u8>, EndpointError> {
        match tokio::fs::read(self.file_path(volume, path)).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                if dir_exists(&self.volume_dir(volume)).await {
                    Err(EndpointError::FileNotFound {
                        volume: volume.to_string(),
                        path: path.to_string(),
                    })
                } else {
                    Err(EndpointError::VolumeNotFound {
                        volume: volume.to_string(),
                    })
                }
            }
            Err(err) => Err(io_error(err)),
        }
    }

    async fn list_volumes(&self) -> Result<Vec<VolumeInfo>, EndpointError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // A root that was never written to is a fresh endpoint.
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error(err)),
        };
        let mut volumes = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let meta = entry.metadata().await.map_err(io_error)?;
            if !meta.is_dir() {
                continue;
            }
            volumes.push(VolumeInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                created: meta.created().ok(),
            });
        }
        volumes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(volumes)
    }

    async fn append(&self, volume: &str, path: &str, data: &[u8]) -> Result<(), EndpointError> {
        tokio::fs::create_dir_all(self.volume_dir(volume))
            .await
            .map_err(io_error)?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_path(volume, path))
            .await
            .map_err(io_error)?;
        file.write_all(data).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;
        Ok(())
    }

    async fn rename(
        &self,
        src_volume: &str,
        src_path: &str,
        dst_volume: &str,
        dst_path: &str,
    ) -> Result<(), EndpointError> {
        tokio::fs::create_dir_all(self.volume_dir(dst_volume))
            .await
            .map_err(io_error)?;
        match tokio::fs::rename(
            self.file_path(src_volume, src_path),
            self.file_path(dst_volume, dst_path),
        )
        .await
        {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(EndpointError::FileNotFound {
                volume: src_volume.to_string(),
                path: src_path.to_string(),
            }),
            Err(err) => Err(io_error(err)),
        }
    }

    async fn delete(&self, volume: &str, path: &str) -> Result<(), EndpointError> {
        match tokio::fs::remove_file(self.file_path(volume, path)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(err)),
        }
    }
}

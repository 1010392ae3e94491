//! Deployment format discovery and healing for the Atoll object store.
//!
//! An Atoll deployment spans N storage endpoints (local disks or remote
//! back-ends). Before any object I/O can run, the fleet must agree on which
//! endpoints belong to the deployment, which stable identity each one
//! carries, and the canonical ordering the erasure code depends on. That
//! agreement lives in one small manifest per endpoint (`format.json` inside
//! the reserved `.atoll.sys` volume), and this crate owns its whole
//! lifecycle: first-time creation, mount-time verification across partial
//! failures, and quorum-based healing of missing manifests.
//!
//! # Architecture
//!
//! ```text
//! bootstrap endpoints
//!        |
//!        v
//!  loader (concurrent fan-out, one task per endpoint)
//!        |
//!        v
//!  error reduction ──► fleet verdict (fresh / heal / heal-with-force)
//!        |
//!        v
//!  generic gate ──► quorum + corruption refusals
//!        |
//!        v
//!  consistency check ──► versions, cardinality, ordering, identities
//!        |
//!        +──► reorder   (healthy mount: endpoints in canonical order)
//!        +──► initialize (fresh fleet: mint identities, publish)
//!        +──► heal       (partial absence: splice fresh identities)
//! ```
//!
//! Wrong classifications destroy data — treating a transient outage as a
//! fresh install would rewrite a live cluster's ordering — so every verdict
//! here is majority-backed and every refusal is explicit.
//!
//! # Usage
//!
//! ```ignore
//! use atoll_format::{heal_format, init_format, mount_format, FormatError};
//!
//! match mount_format(&endpoints).await {
//!     Ok(ordered) => serve(ordered),
//!     Err(FormatError::Unformatted) => init_format(&endpoints).await?,
//!     Err(FormatError::SomeUnformatted) => heal_format(&endpoints, false).await?,
//!     Err(err) => return Err(err.into()),
//! }
//! ```
//!
//! Concurrent initialize/heal invocations across the deployment must be
//! serialized by the caller (a deployment-wide lock); within one process
//! every operation here is safe to call from any task.

pub mod check;
pub mod constants;
pub mod endpoint;
pub mod error;
pub mod heal;
pub mod init;
pub mod loader;
pub mod local;
pub mod manifest;
pub mod memory;
pub mod mount;
pub mod publish;
pub mod reorder;

pub use check::check_manifests;
pub use check::generic_format_check;
pub use constants::read_quorum;
pub use constants::FORMAT_FILE;
pub use constants::FORMAT_FILE_TMP;
pub use constants::FORMAT_META_VOLUME;
pub use endpoint::EndpointError;
pub use endpoint::StorageEndpoint;
pub use endpoint::VolumeInfo;
pub use error::FormatError;
pub use heal::heal_format;
pub use init::init_format;
pub use loader::load_all_manifests;
pub use loader::load_manifest;
pub use loader::reduce_format_errors;
pub use loader::LoadError;
pub use local::LocalEndpoint;
pub use manifest::FormatManifest;
pub use manifest::FsFormat;
pub use manifest::XlFormat;
pub use memory::MemoryEndpoint;
pub use mount::mount_format;
pub use mount::mount_verdict;
pub use publish::save_all_manifests;
pub use reorder::reorder_endpoints;

//! Version-1 deployment manifest and its JSON codec.
//!
//! One manifest is published per endpoint at `format.json` inside the
//! reserved meta-volume. The wire shape is fixed:
//!
//! ```text
//! {
//!   "version": "1",
//!   "format": "xl",
//!   "xl": {
//!     "version": "1",
//!     "disk": "<identity uuid of this endpoint>",
//!     "jbod": ["<id 0>", "<id 1>", ...]
//!   }
//! }
//! ```
//!
//! `jbod` is the deployment-wide canonical ordering; every healthy endpoint
//! carries the same list. Unknown fields are captured on decode and written
//! back on encode, so a newer writer's additions survive a read-modify-write
//! by this version.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::constants::FORMAT_BACKEND_XL;
use crate::constants::FORMAT_VERSION_V1;
use crate::constants::XL_FORMAT_VERSION_V1;

/// Flat single-endpoint (`fs`) backend section.
///
/// Carried for detection only; this core never mounts or initializes the
/// flat backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsFormat {
    /// Version of the flat backend layout.
    pub version: String,
    /// Fields added by newer writers, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Erasure (`xl`) backend section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XlFormat {
    /// Version of the erasure backend layout.
    pub version: String,
    /// Stable identity assigned to this endpoint, immutable once written.
    pub disk: String,
    /// Canonical ordering of endpoint identities, identical on every
    /// endpoint of a healthy deployment.
    pub jbod: Vec<String>,
    /// Fields added by newer writers, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The version-1 manifest record persisted at `format.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatManifest {
    /// Version of the manifest record itself.
    pub version: String,
    /// Backend kind, `"xl"` or `"fs"`.
    pub format: String,
    /// Flat backend section, present only on `fs` manifests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsFormat>,
    /// Erasure backend section, present only on `xl` manifests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xl: Option<XlFormat>,
    /// Fields added by newer writers, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FormatManifest {
    /// Build a fresh erasure manifest for one endpoint.
    ///
    /// `identity` is the endpoint's minted identity; `order` is the
    /// deployment's canonical ordering and must contain `identity`.
    pub fn new_xl(identity: String, order: Vec<String>) -> Self {
        FormatManifest {
            version: FORMAT_VERSION_V1.to_string(),
            format: FORMAT_BACKEND_XL.to_string(),
            fs: None,
            xl: Some(XlFormat {
                version: XL_FORMAT_VERSION_V1.to_string(),
                disk: identity,
                jbod: order,
                extra: Map::new(),
            }),
            extra: Map::new(),
        }
    }

    /// Decode a manifest from its serialized form.
    pub fn decode(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Encode the manifest to its serialized form.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

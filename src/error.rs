//! Closed error taxonomy of the format core.
//!
//! Every outcome a caller can act on is a distinct variant; nothing is
//! stringly matched. Three severity bands:
//!
//! - recoverable locally: unreachable endpoints below the quorum threshold
//!   (never surfaced, the mount proceeds with empty slots);
//! - surfaced for a caller decision: [`FormatError::Unformatted`],
//!   [`FormatError::SomeUnformatted`], [`FormatError::SomeOffline`],
//!   [`FormatError::NeedsForce`];
//! - fatal: everything else. The core reports and refuses; it never
//!   attempts automatic recovery from a fatal classification.

use snafu::Snafu;

use crate::endpoint::EndpointError;

/// Fleet-level errors surfaced by mount, initialize, and heal.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FormatError {
    /// Every endpoint is fresh; the caller may initialize the deployment.
    #[snafu(display("all endpoints are unformatted"))]
    Unformatted,

    /// Some endpoints are fresh while the rest are healthy; the caller may
    /// heal without force.
    #[snafu(display("some endpoints are unformatted"))]
    SomeUnformatted,

    /// Every endpoint is unreachable.
    #[snafu(display("all endpoints are unreachable"))]
    Unreachable,

    /// Some endpoints are fresh and some are offline; healing requires the
    /// caller to grant force.
    #[snafu(display("some endpoints are offline"))]
    SomeOffline,

    /// Too few reachable endpoints remain to trust any classification.
    #[snafu(display("not enough reachable endpoints to establish a read quorum"))]
    NoReadQuorum,

    /// An endpoint holds user data without a readable manifest. Repairing
    /// this requires operator intervention, never silent reinitialization.
    #[snafu(display("endpoint holds user data without a valid manifest"))]
    Corrupted,

    /// A manifest carries a version this core does not understand.
    #[snafu(display("unsupported format version [{found}]"))]
    UnsupportedVersion {
        /// The version string found on disk.
        found: String,
    },

    /// A manifest describes a backend kind this core does not mount.
    #[snafu(display("unsupported backend format [{found}]"))]
    UnsupportedBackend {
        /// The backend kind found on disk.
        found: String,
    },

    /// A manifest's canonical ordering does not match the deployment size.
    #[snafu(display("manifest lists {found} endpoints, deployment has {expected}"))]
    JbodSizeMismatch {
        /// Number of bootstrap endpoints.
        expected: usize,
        /// Length of the ordering found in the manifest.
        found: usize,
    },

    /// Two endpoints disagree on the canonical ordering.
    #[snafu(display("canonical ordering differs across endpoints"))]
    InconsistentOrder,

    /// An identity sits at different positions in two orderings.
    #[snafu(display("identity {identity} found at position {found}, wanted {expected}"))]
    OrderMismatch {
        /// The displaced identity.
        identity: String,
        /// Position recorded by the first manifest inspected.
        expected: usize,
        /// Position recorded by the disagreeing manifest.
        found: usize,
    },

    /// An endpoint's identity does not occur in the canonical ordering.
    #[snafu(display("identity {identity} not present in the canonical ordering"))]
    UnknownIdentity {
        /// The unrecognized identity.
        identity: String,
    },

    /// Healing would mark offline endpoints dead; the caller must grant
    /// force explicitly.
    #[snafu(display("offline endpoints present, healing requires force"))]
    NeedsForce,

    /// A manifest failed to serialize.
    #[snafu(display("manifest encoding failed: {message}"))]
    Codec {
        /// Serializer error text.
        message: String,
    },

    /// Unclassified endpoint failure, passed through verbatim.
    #[snafu(display("{source}"))]
    Endpoint {
        /// The underlying endpoint error.
        source: EndpointError,
    },
}

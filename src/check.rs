//! Cross-endpoint manifest consistency checking.
//!
//! [`check_manifests`] validates whatever subset of the fleet produced a
//! manifest: schema versions, ordering cardinality, ordering equality, and
//! identity membership. [`generic_format_check`] is the gate in front of it,
//! folding the raw error vector into quorum and corruption verdicts first.
//!
//! Neither function mutates anything; both are pure over their inputs.

use tracing::warn;

use crate::constants::read_quorum;
use crate::constants::FORMAT_BACKEND_XL;
use crate::constants::FORMAT_VERSION_V1;
use crate::constants::XL_FORMAT_VERSION_V1;
use crate::error::FormatError;
use crate::loader::LoadError;
use crate::manifest::FormatManifest;
use crate::manifest::XlFormat;

/// Validate all present manifests against each other.
///
/// Checks, in order:
/// 1. every manifest carries supported record, backend, and `xl` versions;
/// 2. every ordering has exactly one entry per bootstrap endpoint;
/// 3. all orderings are element-wise identical;
/// 4. every identity occurs in the shared ordering, at the same position
///    from every endpoint's point of view.
///
/// Absent entries are skipped; the fleet gate and mount quorum rules decide
/// whether the absences themselves are tolerable.
pub fn check_manifests(manifests: &[Option<FormatManifest>]) -> Result<(), FormatError> {
    let endpoint_count = manifests.len();
    for manifest in manifests.iter().flatten() {
        if manifest.version != FORMAT_VERSION_V1 {
            return Err(FormatError::UnsupportedVersion {
                found: manifest.version.clone(),
            });
        }
        if manifest.format != FORMAT_BACKEND_XL {
            return Err(FormatError::UnsupportedBackend {
                found: manifest.format.clone(),
            });
        }
        let xl = xl_section(manifest)?;
        if xl.version != XL_FORMAT_VERSION_V1 {
            return Err(FormatError::UnsupportedVersion {
                found: xl.version.clone(),
            });
        }
        if xl.jbod.len() != endpoint_count {
            return Err(FormatError::JbodSizeMismatch {
                expected: endpoint_count,
                found: xl.jbod.len(),
            });
        }
    }
    check_order_agreement(manifests)?;
    check_identity_positions(manifests)
}

/// Pre-check in front of [`check_manifests`].
///
/// Counts hard failures (anything that is not "healthy" or "live but fresh")
/// against the read-quorum tolerance, then refuses outright on any corrupted
/// endpoint, and only then hands over to the consistency checker.
pub fn generic_format_check(
    manifests: &[Option<FormatManifest>],
    errors: &[Option<LoadError>],
) -> Result<(), FormatError> {
    let endpoint_count = manifests.len();
    let mut corrupt_count: usize = 0;
    let mut err_count: usize = 0;
    for err in errors.iter().flatten() {
        match err {
            // A fresh disk is a live disk; it does not count against quorum.
            LoadError::Unformatted => {}
            LoadError::Endpoint { source } if source.is_not_found() => {}
            LoadError::Corrupted => corrupt_count += 1,
            _ => err_count += 1,
        }
    }

    let tolerance = endpoint_count.saturating_sub(read_quorum(endpoint_count));
    if err_count > tolerance {
        warn!(err_count, endpoint_count, "too many failed endpoints for a read quorum");
        return Err(FormatError::NoReadQuorum);
    }
    if corrupt_count > 0 {
        warn!(corrupt_count, "corrupted endpoints require operator intervention");
        return Err(FormatError::Corrupted);
    }
    check_manifests(manifests)
}

fn xl_section(manifest: &FormatManifest) -> Result<&XlFormat, FormatError> {
    manifest.xl.as_ref().ok_or(FormatError::Corrupted)
}

/// All present manifests must carry the same ordering, position by position.
fn check_order_agreement(manifests: &[Option<FormatManifest>]) -> Result<(), FormatError> {
    let mut agreed: Option<&Vec<String>> = None;
    for manifest in manifests.iter().flatten() {
        let jbod = &xl_section(manifest)?.jbod;
        match agreed {
            None => agreed = Some(jbod),
            Some(expected) if expected == jbod => {}
            Some(_) => return Err(FormatError::InconsistentOrder),
        }
    }
    Ok(())
}

/// Every identity must occur in every ordering, always at the same position.
fn check_identity_positions(manifests: &[Option<FormatManifest>]) -> Result<(), FormatError> {
    for manifest in manifests.iter().flatten() {
        let identity = &xl_section(manifest)?.disk;
        let mut agreed_position: Option<usize> = None;
        for other in manifests.iter().flatten() {
            let jbod = &xl_section(other)?.jbod;
            let position = jbod.iter().position(|id| id == identity).ok_or_else(|| {
                FormatError::UnknownIdentity {
                    identity: identity.clone(),
                }
            })?;
            match agreed_position {
                None => agreed_position = Some(position),
                Some(expected) if expected == position => {}
                Some(expected) => {
                    return Err(FormatError::OrderMismatch {
                        identity: identity.clone(),
                        expected,
                        found: position,
                    });
                }
            }
        }
    }
    Ok(())
}

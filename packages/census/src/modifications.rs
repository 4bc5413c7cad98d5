//! Modification piece aggregation.
//!
//! Users edit an area of interest by drawing pieces that either apply a
//! BMP or reclassify land cover. The hydrology engine needs the total
//! treated area per kind and each piece paired with the census of the
//! ground it covers.

use std::collections::BTreeMap;

use watershed_census_models::{Census, ModificationPiece, ModificationRecord};

use crate::CensusError;

/// Sums piece areas grouped by kind name.
#[must_use]
pub fn aggregate_areas(pieces: &[ModificationPiece]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();

    for piece in pieces {
        *sums.entry(piece.kind.name().to_string()).or_insert(0.0) += piece.area;
    }

    sums
}

/// Returns the censuses that actually accompany `pieces`.
///
/// Pieces without censuses cannot be modeled and are an error. Censuses
/// without pieces are stale leftovers and are dropped.
///
/// # Errors
///
/// Returns [`CensusError::MissingCensuses`] when pieces are present but
/// censuses are not, and [`CensusError::ModificationCountMismatch`] when
/// both are present in different numbers.
pub fn resolve_modification_censuses<'a>(
    pieces: &[ModificationPiece],
    censuses: &'a [Census],
) -> Result<&'a [Census], CensusError> {
    match (pieces.is_empty(), censuses.is_empty()) {
        (false, true) => Err(CensusError::MissingCensuses),
        (true, _) => Ok(&[]),
        (false, false) if pieces.len() != censuses.len() => {
            Err(CensusError::ModificationCountMismatch {
                pieces: pieces.len(),
                censuses: censuses.len(),
            })
        }
        (false, false) => Ok(censuses),
    }
}

/// Pairs each piece, by position, with its census.
///
/// # Errors
///
/// See [`resolve_modification_censuses`].
pub fn apply_modifications(
    pieces: &[ModificationPiece],
    censuses: &[Census],
) -> Result<Vec<ModificationRecord>, CensusError> {
    let censuses = resolve_modification_censuses(pieces, censuses)?;

    Ok(pieces
        .iter()
        .zip(censuses)
        .map(|(piece, census)| ModificationRecord {
            change: piece.kind.change_key(),
            census: census.clone(),
        })
        .collect())
}

//! Land-cover × soil distribution reducer.
//!
//! The compute service answers with raw cross-tabulation counts keyed by
//! `"List(<landcover>,<soil>)"`. Entries whose codes have no label are
//! dropped; the rest are relabelled `"<soil>:<landcover>"` and summed.

use std::collections::BTreeMap;

use watershed_census_models::{CellCount, Census, HistogramPayload};

use crate::{CensusError, LookupTables};

/// A histogram entry whose codes both have labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetainedEntry {
    /// Raw land-cover code.
    pub land_cover: i64,
    /// Soil code after collapsing.
    pub soil: i64,
    /// Pixel count.
    pub count: u64,
}

/// Extracts the `(landcover, soil)` pair from a key like `"List(3,4)"`.
///
/// # Errors
///
/// Returns [`CensusError::MalformedKey`] if the key does not embed two
/// integer codes.
pub fn decode_key(key: &str) -> Result<(i64, i64), CensusError> {
    let malformed = || CensusError::MalformedKey {
        key: key.to_string(),
    };

    let inner = key
        .strip_prefix("List(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(malformed)?;
    let (land_cover, soil) = inner.split_once(',').ok_or_else(malformed)?;

    let land_cover = land_cover.trim().parse::<i64>().map_err(|_| malformed())?;
    let soil = soil.trim().parse::<i64>().map_err(|_| malformed())?;

    Ok((land_cover, soil))
}

/// Decodes every histogram entry and keeps the ones both tables can label.
pub(crate) fn retained_entries(
    payload: &HistogramPayload,
    tables: &LookupTables,
) -> Result<Vec<RetainedEntry>, CensusError> {
    let counts = match payload {
        HistogramPayload::Error { error } => {
            return Err(CensusError::Distribution {
                message: error.clone(),
            });
        }
        HistogramPayload::Counts(counts) => counts,
    };

    let mut entries = Vec::with_capacity(counts.len());

    for (key, &count) in counts {
        let (land_cover, soil) = decode_key(key)?;

        if tables.land_cover_label(land_cover).is_none() || tables.soil_label(soil).is_none() {
            log::trace!("Dropping unmapped histogram entry {key} ({count} cells)");
            continue;
        }

        entries.push(RetainedEntry {
            land_cover,
            soil: tables.collapse_soil(soil),
            count,
        });
    }

    Ok(entries)
}

/// Folds retained entries into a census.
fn reduce(entries: &[RetainedEntry], tables: &LookupTables) -> Census {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut total = 0;

    for entry in entries {
        let (Some(land_cover), Some(soil)) = (
            tables.land_cover_label(entry.land_cover),
            tables.soil_label(entry.soil),
        ) else {
            continue;
        };

        total += entry.count;
        *counts
            .entry(format!("{}:{}", soil.code, land_cover.code))
            .or_insert(0) += entry.count;
    }

    let distribution = counts
        .into_iter()
        .map(|(label, count)| (label, CellCount::new(count)))
        .collect();

    Census::new(total, distribution)
}

/// Reduces a histogram to a single-element list holding the grand total
/// and the label → count distribution.
///
/// # Errors
///
/// Fails with the payload's own message if it carries an error marker,
/// or with [`CensusError::MalformedKey`] for an undecodable key.
pub fn nlcd_soil_census(
    payload: &HistogramPayload,
    tables: &LookupTables,
) -> Result<Vec<Census>, CensusError> {
    Ok(vec![data_to_census(payload, tables)?])
}

/// Reduces a histogram to its census.
///
/// # Errors
///
/// See [`nlcd_soil_census`].
pub fn data_to_census(
    payload: &HistogramPayload,
    tables: &LookupTables,
) -> Result<Census, CensusError> {
    let entries = retained_entries(payload, tables)?;
    Ok(reduce(&entries, tables))
}

//! Histogram → survey conversion.
//!
//! A survey lists every configured land-cover category and every
//! canonical soil group with its pixel count and share of the retained
//! total. Areas stay in pixels until [`convert_result_areas`] scales them.

use std::collections::BTreeMap;

use watershed_census_models::{HistogramPayload, Survey, SurveyCategory, SurveyGroup};

use crate::reducer::retained_entries;
use crate::{CensusError, Label, LookupTables};

#[allow(clippy::cast_precision_loss)]
fn category(label: &Label, count: u64, total: u64) -> SurveyCategory {
    let coverage = if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    };

    SurveyCategory {
        code: label.code.clone(),
        label: label.name.clone(),
        area: count as f64,
        coverage,
    }
}

/// Builds the land and soil survey groups for a histogram.
///
/// # Errors
///
/// Fails like [`crate::nlcd_soil_census`] on an error marker or an
/// undecodable key.
pub fn data_to_survey(
    payload: &HistogramPayload,
    tables: &LookupTables,
) -> Result<Survey, CensusError> {
    let entries = retained_entries(payload, tables)?;

    let mut land_counts: BTreeMap<i64, u64> = BTreeMap::new();
    let mut soil_counts: BTreeMap<i64, u64> = BTreeMap::new();
    let mut total = 0;

    for entry in &entries {
        total += entry.count;
        *land_counts.entry(entry.land_cover).or_default() += entry.count;
        *soil_counts.entry(entry.soil).or_default() += entry.count;
    }

    let land = tables
        .land_cover()
        .map(|(code, label)| {
            category(label, land_counts.get(&code).copied().unwrap_or(0), total)
        })
        .collect();

    let soil = tables
        .canonical_soil()
        .map(|(code, label)| {
            category(label, soil_counts.get(&code).copied().unwrap_or(0), total)
        })
        .collect();

    Ok(vec![
        SurveyGroup {
            name: "land".to_string(),
            display_name: "Land".to_string(),
            categories: land,
        },
        SurveyGroup {
            name: "soil".to_string(),
            display_name: "Soil".to_string(),
            categories: soil,
        },
    ])
}

/// Converts survey areas from pixel counts to square meters.
pub fn convert_result_areas(pixel_width: f64, survey: &mut [SurveyGroup]) {
    let pixel_area = pixel_width * pixel_width;

    for category in survey.iter_mut().flat_map(|group| &mut group.categories) {
        category.area *= pixel_area;
    }
}

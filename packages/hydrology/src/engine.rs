//! Hydrology engine boundary.
//!
//! The daily simulation itself lives outside this workspace. Engines
//! receive an [`AugmentedCensus`]: a copy of the area census carrying the
//! paired modification records and the treated-area summary for one run.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use watershed_census_models::{Census, ModificationRecord};
use watershed_hydrology_models::SimulationOutput;

/// Errors reported by a hydrology engine.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The census lacks a field the engine needs.
    #[error("Missing census field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// The engine failed for any other reason.
    #[error("Simulation failed: {message}")]
    Engine {
        /// Engine error text.
        message: String,
    },
}

/// The census handed to an engine for one run.
///
/// Serializes as the census with its `BMPs` summary plus a
/// `modifications` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AugmentedCensus {
    #[serde(flatten)]
    census: Census,
    modifications: Vec<ModificationRecord>,
}

impl AugmentedCensus {
    /// Builds the augmented value from `census` without touching it.
    #[must_use]
    pub fn new(
        census: &Census,
        modifications: Vec<ModificationRecord>,
        bmps: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            census: census.with_bmps(bmps),
            modifications,
        }
    }

    /// The area census with its `BMPs` summary.
    #[must_use]
    pub const fn census(&self) -> &Census {
        &self.census
    }

    /// Modification pieces paired with their censuses.
    #[must_use]
    pub fn modifications(&self) -> &[ModificationRecord] {
        &self.modifications
    }

    /// Total cell count of the area.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::MissingField`] if the census has none.
    pub fn cell_count(&self) -> Result<u64, SimulationError> {
        self.census
            .cell_count
            .ok_or_else(|| SimulationError::MissingField {
                field: "cell_count".to_string(),
            })
    }

    /// Cell count per land-cover/soil label of the area.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::MissingField`] if the census has no
    /// distribution or a bucket has no cell count.
    pub fn distribution(&self) -> Result<BTreeMap<&str, u64>, SimulationError> {
        let distribution =
            self.census
                .distribution
                .as_ref()
                .ok_or_else(|| SimulationError::MissingField {
                    field: "distribution".to_string(),
                })?;

        distribution
            .iter()
            .map(|(label, bucket)| {
                bucket
                    .cell_count
                    .map(|count| (label.as_str(), count))
                    .ok_or_else(|| SimulationError::MissingField {
                        field: format!("distribution.{label}.cell_count"),
                    })
            })
            .collect()
    }

    /// Treated area per modification kind.
    #[must_use]
    pub fn bmps(&self) -> &BTreeMap<String, f64> {
        static EMPTY: BTreeMap<String, f64> = BTreeMap::new();
        self.census.bmps.as_ref().unwrap_or(&EMPTY)
    }
}

/// A single-storm hydrology model.
#[async_trait]
pub trait HydrologyEngine: Send + Sync {
    /// Simulates one storm of `precipitation` inches over the census.
    ///
    /// `cell_resolution` is the ground area of one raster cell. With
    /// `precolumbian` set, the engine models pre-settlement land cover.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::MissingField`] when the census is
    /// malformed and [`SimulationError::Engine`] for anything else.
    async fn simulate_day(
        &self,
        census: &AugmentedCensus,
        precipitation: f64,
        cell_resolution: f64,
        precolumbian: bool,
    ) -> Result<SimulationOutput, SimulationError>;
}

#[cfg(test)]
mod tests {
    use watershed_census_models::ModificationPiece;

    use super::*;

    #[test]
    fn augmenting_leaves_source_census_untouched() {
        let census: Census = serde_json::from_value(serde_json::json!({
            "cell_count": 4,
            "distribution": { "c:water": { "cell_count": 4 } }
        }))
        .unwrap();
        let before = census.clone();

        let record = watershed_census::apply_modifications(
            &[ModificationPiece::bmp("rain_garden", 3.0)],
            std::slice::from_ref(&census),
        )
        .unwrap();
        let augmented = AugmentedCensus::new(
            &census,
            record,
            BTreeMap::from([("rain_garden".to_string(), 3.0)]),
        );

        assert_eq!(census, before);
        assert!(census.bmps.is_none());

        let json = serde_json::to_value(&augmented).unwrap();
        assert_eq!(json["cell_count"], 4);
        assert_eq!(json["BMPs"]["rain_garden"], 3.0);
        assert_eq!(json["modifications"][0]["change"], "::rain_garden");
        assert_eq!(augmented.cell_count().unwrap(), 4);
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let census: Census = serde_json::from_value(serde_json::json!({ "n": 2 })).unwrap();
        let augmented = AugmentedCensus::new(&census, vec![], BTreeMap::new());

        let err = augmented.cell_count().unwrap_err();
        assert_eq!(err.to_string(), "Missing census field: cell_count");
        assert!(matches!(
            augmented.distribution(),
            Err(SimulationError::MissingField { field }) if field == "distribution"
        ));
        assert!(augmented.bmps().is_empty());
    }

    #[test]
    fn bucket_without_count_is_reported_by_path() {
        let census: Census = serde_json::from_value(serde_json::json!({
            "cell_count": 4,
            "distribution": { "a:water": {}, "c:forest": { "cell_count": 4 } }
        }))
        .unwrap();
        let augmented = AugmentedCensus::new(&census, vec![], BTreeMap::new());

        assert_eq!(augmented.cell_count().unwrap(), 4);
        assert_eq!(
            augmented.distribution().unwrap_err().to_string(),
            "Missing census field: distribution.a:water.cell_count"
        );
    }

    #[test]
    fn well_formed_distribution_is_flattened() {
        let census: Census = serde_json::from_value(serde_json::json!({
            "cell_count": 5,
            "distribution": { "a:water": { "cell_count": 2 }, "c:forest": { "cell_count": 3 } }
        }))
        .unwrap();
        let augmented = AugmentedCensus::new(&census, vec![], BTreeMap::new());

        assert_eq!(
            augmented.distribution().unwrap(),
            BTreeMap::from([("a:water", 2), ("c:forest", 3)])
        );
    }
}

//! Post-processing of merged engine output.

use watershed_hydrology_models::{ModelOutput, QualityMeasure, QualityOutput, ScenarioResult};

use crate::UnitConversion;

/// Pollutants reported in quality output, in display order.
pub const QUALITY_MEASURES: [(&str, Pollutant); 3] = [
    ("Total Suspended Solids", Pollutant::Tss),
    ("Total Nitrogen", Pollutant::Tn),
    ("Total Phosphorus", Pollutant::Tp),
];

/// A pollutant load field of [`ScenarioResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pollutant {
    /// Total suspended solids.
    Tss,
    /// Total nitrogen.
    Tn,
    /// Total phosphorus.
    Tp,
}

impl Pollutant {
    const fn load(self, result: &ScenarioResult) -> f64 {
        match self {
            Self::Tss => result.tss,
            Self::Tn => result.tn,
            Self::Tp => result.tp,
        }
    }
}

/// Converts runoff, infiltration and evapotranspiration from inches to
/// centimeters, including every distribution bucket.
#[must_use]
pub fn format_runoff(mut output: ModelOutput, units: &UnitConversion) -> ModelOutput {
    for result in output.values_mut() {
        result.runoff = units.inches_to_cm(result.runoff);
        result.inf = units.inches_to_cm(result.inf);
        result.et = units.inches_to_cm(result.et);

        for bucket in result.distribution.values_mut() {
            bucket.runoff = units.inches_to_cm(bucket.runoff);
            bucket.inf = units.inches_to_cm(bucket.inf);
            bucket.et = units.inches_to_cm(bucket.et);
        }
    }

    output
}

/// Builds the per-pollutant quality records for each scenario.
///
/// Expects `output` already passed through [`format_runoff`]: the paired
/// runoff is copied as is, while loads are converted from pounds.
#[must_use]
pub fn format_quality(output: &ModelOutput, units: &UnitConversion) -> QualityOutput {
    output
        .iter()
        .map(|(scenario, result)| {
            let measures = QUALITY_MEASURES
                .iter()
                .map(|(measure, pollutant)| QualityMeasure {
                    measure: (*measure).to_string(),
                    load: units.pounds_to_kg(pollutant.load(result)),
                    runoff: result.runoff,
                })
                .collect();
            (*scenario, measures)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use watershed_hydrology_models::{DistributionResult, Scenario};

    use super::*;

    fn output() -> ModelOutput {
        let mut distribution = BTreeMap::new();
        distribution.insert(
            "c:developed_low".to_string(),
            DistributionResult {
                runoff: 2.0,
                inf: 0.5,
                et: 0.25,
                extra: serde_json::Map::new(),
            },
        );

        BTreeMap::from([(
            Scenario::Modified,
            ScenarioResult {
                runoff: 1.0,
                inf: 2.0,
                et: 0.5,
                tss: 100.0,
                tn: 10.0,
                tp: 1.0,
                distribution,
                extra: serde_json::Map::new(),
            },
        )])
    }

    #[test]
    fn converts_depths_including_distribution() {
        let units = UnitConversion::default();
        let converted = format_runoff(output(), &units);
        let modified = &converted[&Scenario::Modified];

        assert!((modified.runoff - 2.54).abs() < 1e-12);
        assert!((modified.inf - 5.08).abs() < 1e-12);
        assert!((modified.et - 1.27).abs() < 1e-12);

        let bucket = &modified.distribution["c:developed_low"];
        assert!((bucket.runoff - 5.08).abs() < 1e-12);
        assert!((bucket.et - 0.635).abs() < 1e-12);

        // Loads are left for format_quality.
        assert!((modified.tss - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn quality_is_ordered_and_converted() {
        let units = UnitConversion::default();
        let runoff = format_runoff(output(), &units);
        let quality = format_quality(&runoff, &units);
        let measures = &quality[&Scenario::Modified];

        let names: Vec<&str> = measures.iter().map(|m| m.measure.as_str()).collect();
        assert_eq!(
            names,
            ["Total Suspended Solids", "Total Nitrogen", "Total Phosphorus"]
        );
        assert!((measures[0].load - 45.3592).abs() < 1e-9);
        assert!((measures[2].load - 0.453_592).abs() < 1e-12);
        assert!(measures.iter().all(|m| (m.runoff - 2.54).abs() < 1e-12));
    }
}

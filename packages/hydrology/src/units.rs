//! Unit conversion factors.

use serde::Deserialize;

/// Centimeters per inch.
pub const CM_PER_INCH: f64 = 2.54;

/// Kilograms per pound.
pub const KG_PER_POUND: f64 = 0.453_592;

/// Acres per square meter.
pub const ACRES_PER_SQM: f64 = 0.000_247_105;

/// Conversion factors applied to engine output.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct UnitConversion {
    /// Centimeters per inch.
    pub cm_per_inch: f64,
    /// Kilograms per pound.
    pub kg_per_pound: f64,
    /// Acres per square meter.
    pub acres_per_sqm: f64,
}

impl Default for UnitConversion {
    fn default() -> Self {
        Self {
            cm_per_inch: CM_PER_INCH,
            kg_per_pound: KG_PER_POUND,
            acres_per_sqm: ACRES_PER_SQM,
        }
    }
}

impl UnitConversion {
    /// Converts a depth in inches to centimeters.
    #[must_use]
    pub fn inches_to_cm(&self, inches: f64) -> f64 {
        inches * self.cm_per_inch
    }

    /// Converts a depth in centimeters to inches.
    #[must_use]
    pub fn cm_to_inches(&self, cm: f64) -> f64 {
        cm / self.cm_per_inch
    }

    /// Converts a load in pounds to kilograms.
    #[must_use]
    pub fn pounds_to_kg(&self, pounds: f64) -> f64 {
        pounds * self.kg_per_pound
    }

    /// Converts an area in square meters to acres.
    #[must_use]
    pub fn sqm_to_acres(&self, sqm: f64) -> f64 {
        sqm * self.acres_per_sqm
    }
}

//! Raster code to label tables.
//!
//! Both rasters store small integer codes. The land-cover and soil tables
//! map those to a short `code` (used in distribution keys) and a display
//! `name`. A handful of soil codes collapse onto a canonical group before
//! labelling; those rules live beside the tables so they can be swapped
//! together.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::CensusError;

/// The label pair for a raster code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Short code used in census distribution keys (e.g. `"developed_low"`).
    pub code: String,
    /// Display name.
    pub name: String,
}

impl Label {
    /// Creates a label.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    value: i64,
    code: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawSoilCollapse {
    from: Vec<i64>,
    to: i64,
}

#[derive(Debug, Deserialize)]
struct RawLookupTables {
    nodata: i64,
    land_cover: Vec<RawLabel>,
    soil: Vec<RawLabel>,
    #[serde(default)]
    soil_collapse: Vec<RawSoilCollapse>,
}

/// Land-cover and soil lookup tables plus the soil collapse rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawLookupTables")]
pub struct LookupTables {
    nodata: i64,
    land_cover: BTreeMap<i64, Label>,
    soil: BTreeMap<i64, Label>,
    soil_collapse: BTreeMap<i64, i64>,
}

const EMBEDDED_LOOKUP: &str = include_str!("../config/lookup.toml");

impl LookupTables {
    /// Builds lookup tables, checking that every collapse target has a
    /// soil label.
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::Lookup`] if a collapse rule points at a soil
    /// code with no label.
    pub fn new(
        nodata: i64,
        land_cover: impl IntoIterator<Item = (i64, Label)>,
        soil: impl IntoIterator<Item = (i64, Label)>,
        soil_collapse: impl IntoIterator<Item = (Vec<i64>, i64)>,
    ) -> Result<Self, CensusError> {
        let soil: BTreeMap<i64, Label> = soil.into_iter().collect();
        let mut collapse = BTreeMap::new();

        for (from, to) in soil_collapse {
            if !soil.contains_key(&to) {
                return Err(CensusError::Lookup {
                    message: format!("soil collapse target {to} has no soil label"),
                });
            }
            for code in from {
                collapse.insert(code, to);
            }
        }

        Ok(Self {
            nodata,
            land_cover: land_cover.into_iter().collect(),
            soil,
            soil_collapse: collapse,
        })
    }

    /// Parses lookup tables from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`CensusError`] if the TOML is malformed or the tables are
    /// inconsistent.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, CensusError> {
        let raw: RawLookupTables = toml::de::from_str(toml_str)?;
        Self::try_from(raw)
    }

    /// Returns the tables embedded from `config/lookup.toml`.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a compile-time guarantee
    /// since the file is embedded).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(EMBEDDED_LOOKUP)
            .unwrap_or_else(|e| panic!("Failed to parse embedded lookup.toml: {e}"))
    }

    /// The raster no-data sentinel.
    #[must_use]
    pub const fn nodata(&self) -> i64 {
        self.nodata
    }

    /// Label for a raw land-cover code.
    #[must_use]
    pub fn land_cover_label(&self, code: i64) -> Option<&Label> {
        self.land_cover.get(&code)
    }

    /// Label for a raw soil code (before collapsing).
    #[must_use]
    pub fn soil_label(&self, code: i64) -> Option<&Label> {
        self.soil.get(&code)
    }

    /// Maps a raw soil code onto its canonical group.
    #[must_use]
    pub fn collapse_soil(&self, code: i64) -> i64 {
        self.soil_collapse.get(&code).copied().unwrap_or(code)
    }

    /// All land-cover codes with their labels, in code order.
    pub fn land_cover(&self) -> impl Iterator<Item = (i64, &Label)> {
        self.land_cover.iter().map(|(code, label)| (*code, label))
    }

    /// Soil codes that survive collapsing, in code order.
    pub fn canonical_soil(&self) -> impl Iterator<Item = (i64, &Label)> {
        self.soil
            .iter()
            .filter(|(code, _)| !self.soil_collapse.contains_key(*code))
            .map(|(code, label)| (*code, label))
    }
}

impl Default for LookupTables {
    fn default() -> Self {
        Self::embedded()
    }
}

impl TryFrom<RawLookupTables> for LookupTables {
    type Error = CensusError;

    fn try_from(raw: RawLookupTables) -> Result<Self, Self::Error> {
        let to_entry = |l: RawLabel| (l.value, Label::new(l.code, l.name));

        Self::new(
            raw.nodata,
            raw.land_cover.into_iter().map(to_entry),
            raw.soil.into_iter().map(to_entry),
            raw.soil_collapse.into_iter().map(|c| (c.from, c.to)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_embedded_tables() {
        let tables = LookupTables::embedded();
        assert_eq!(tables.nodata(), -2_147_483_648);
        assert_eq!(tables.land_cover_label(22).unwrap().code, "developed_low");
        assert_eq!(tables.soil_label(2).unwrap().code, "b");
    }

    #[test]
    fn collapses_nodata_and_dual_groups() {
        let tables = LookupTables::embedded();
        assert_eq!(tables.collapse_soil(tables.nodata()), 3);
        assert_eq!(tables.collapse_soil(5), 3);
        assert_eq!(tables.collapse_soil(6), 3);
        assert_eq!(tables.collapse_soil(7), 4);
        assert_eq!(tables.collapse_soil(1), 1);
    }

    #[test]
    fn canonical_soil_excludes_collapsed_codes() {
        let tables = LookupTables::embedded();
        let codes: Vec<&str> = tables
            .canonical_soil()
            .map(|(_, label)| label.code.as_str())
            .collect();
        assert_eq!(codes, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn land_cover_codes_are_unique() {
        let tables = LookupTables::embedded();
        let mut codes: Vec<&str> = tables
            .land_cover()
            .map(|(_, label)| label.code.as_str())
            .collect();
        let count = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), count);
    }

    #[test]
    fn rejects_collapse_to_unlabelled_soil() {
        let result = LookupTables::new(
            -1,
            [(11, Label::new("water", "Water"))],
            [(1, Label::new("a", "Sand"))],
            [(vec![-1], 9)],
        );
        assert!(matches!(result, Err(CensusError::Lookup { .. })));
    }
}

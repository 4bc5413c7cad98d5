#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Census, survey, histogram and modification types.
//!
//! These types travel between pipeline stages as JSON, so every one of
//! them round-trips through `serde` in the same shape the web client and
//! the hydrology engines expect.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key of the transient modification list attached to a census while a
/// simulation runs.
pub const MODIFICATIONS_KEY: &str = "modifications";

/// A pixel tally for a single distribution bucket.
///
/// The count is optional for the same reason the census fields are: a
/// cached census with a malformed bucket must still reach the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCount {
    /// Number of raster cells in the bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_count: Option<u64>,
}

impl CellCount {
    /// A bucket holding `cell_count` cells.
    #[must_use]
    pub const fn new(cell_count: u64) -> Self {
        Self {
            cell_count: Some(cell_count),
        }
    }
}

/// Land-cover/soil composition of a geometry.
///
/// `cell_count` and `distribution` are optional because censuses arrive
/// from upstream stages (or client caches) that may be malformed. The
/// hydrology engine is the component that insists on their presence.
/// Any other keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Census {
    /// Total number of cells counted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_count: Option<u64>,
    /// `"<soil>:<landcover>"` label to its cell tally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<BTreeMap<String, CellCount>>,
    /// Treated area per BMP/reclassification kind.
    #[serde(rename = "BMPs", default, skip_serializing_if = "Option::is_none")]
    pub bmps: Option<BTreeMap<String, f64>>,
    /// Keys this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Census {
    /// Creates a well-formed census from a total and its distribution.
    #[must_use]
    pub fn new(cell_count: u64, distribution: BTreeMap<String, CellCount>) -> Self {
        Self {
            cell_count: Some(cell_count),
            distribution: Some(distribution),
            bmps: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Returns a copy carrying `bmps` and no transient modification list.
    ///
    /// This is the shape a census leaves the hydrology stage in, whatever
    /// shape it was handed over in.
    #[must_use]
    pub fn with_bmps(&self, bmps: BTreeMap<String, f64>) -> Self {
        let mut census = self.clone();
        census.extra.remove(MODIFICATIONS_KEY);
        census.bmps = Some(bmps);
        census
    }

    /// Whether this census carries a transient modification list.
    #[must_use]
    pub fn has_modifications(&self) -> bool {
        self.extra.contains_key(MODIFICATIONS_KEY)
    }
}

/// One histogram produced by the compute service for one polygon.
///
/// Keys look like `"List(<landcover>,<soil>)"`. The service reports a
/// failed computation with an object carrying an `error` key instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistogramPayload {
    /// The computation failed; no counts are available.
    Error {
        /// Message reported by the service.
        error: String,
    },
    /// Encoded category key to pixel count.
    Counts(BTreeMap<String, u64>),
}

/// A single land or soil category row in a survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyCategory {
    /// Short category code (e.g. `"developed_low"`, `"b"`).
    pub code: String,
    /// Human-readable category name.
    #[serde(rename = "type")]
    pub label: String,
    /// Pixel count, or square meters once areas have been converted.
    pub area: f64,
    /// Fraction of the counted cells falling in this category.
    pub coverage: f64,
}

/// A named group of survey categories (land or soil).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyGroup {
    /// Machine name of the group.
    pub name: String,
    /// Name shown in the analyze sidebar.
    pub display_name: String,
    /// Categories in raw-code order.
    pub categories: Vec<SurveyCategory>,
}

/// Area-denominated, human-facing view of a census.
pub type Survey = Vec<SurveyGroup>;

/// What a modification piece changes.
///
/// Resolved once when a piece is ingested: when the wire value names both
/// a BMP and a reclassification, the BMP takes priority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModificationKind {
    /// A best management practice applied to the area.
    Bmp(String),
    /// A land-cover reclassification of the area.
    Reclass(String),
}

impl ModificationKind {
    /// The kind name used to group treated areas.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Bmp(name) | Self::Reclass(name) => name,
        }
    }

    /// The `"<soil>:<landcover>:<bmp>"` change pattern understood by the
    /// TR-55 engine, with the soil slot left open.
    #[must_use]
    pub fn change_key(&self) -> String {
        match self {
            Self::Reclass(name) => format!(":{name}:"),
            Self::Bmp(name) => format!("::{name}"),
        }
    }
}

/// Wire form of a modification piece value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationValue {
    /// BMP applied by the piece.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmp: Option<String>,
    /// Land-cover class the piece reclassifies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reclass: Option<String>,
}

/// Wire form of a modification piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawModificationPiece {
    /// What the piece changes.
    pub value: ModificationValue,
    /// Polygon area of the piece.
    pub area: f64,
}

/// Error returned when a modification piece names neither a BMP nor a
/// reclassification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownModificationKind;

impl std::fmt::Display for UnknownModificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("modification piece has neither a bmp nor a reclass value")
    }
}

impl std::error::Error for UnknownModificationKind {}

/// One discrete land-use edit with its polygon area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawModificationPiece", into = "RawModificationPiece")]
pub struct ModificationPiece {
    /// What the piece changes.
    pub kind: ModificationKind,
    /// Polygon area of the piece.
    pub area: f64,
}

impl ModificationPiece {
    /// Creates a BMP piece.
    #[must_use]
    pub fn bmp(name: impl Into<String>, area: f64) -> Self {
        Self {
            kind: ModificationKind::Bmp(name.into()),
            area,
        }
    }

    /// Creates a reclassification piece.
    #[must_use]
    pub fn reclass(name: impl Into<String>, area: f64) -> Self {
        Self {
            kind: ModificationKind::Reclass(name.into()),
            area,
        }
    }
}

impl TryFrom<RawModificationPiece> for ModificationPiece {
    type Error = UnknownModificationKind;

    fn try_from(raw: RawModificationPiece) -> Result<Self, Self::Error> {
        let kind = match raw.value {
            ModificationValue { bmp: Some(bmp), .. } => ModificationKind::Bmp(bmp),
            ModificationValue {
                reclass: Some(reclass),
                ..
            } => ModificationKind::Reclass(reclass),
            ModificationValue { .. } => return Err(UnknownModificationKind),
        };

        Ok(Self {
            kind,
            area: raw.area,
        })
    }
}

impl From<ModificationPiece> for RawModificationPiece {
    fn from(piece: ModificationPiece) -> Self {
        let value = match piece.kind {
            ModificationKind::Bmp(bmp) => ModificationValue {
                bmp: Some(bmp),
                reclass: None,
            },
            ModificationKind::Reclass(reclass) => ModificationValue {
                bmp: None,
                reclass: Some(reclass),
            },
        };

        Self {
            value,
            area: piece.area,
        }
    }
}

/// A modification piece paired with the census of the area it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationRecord {
    /// Change pattern applied to the census (see
    /// [`ModificationKind::change_key`]).
    pub change: String,
    /// Census of the piece's area.
    #[serde(flatten)]
    pub census: Census,
}

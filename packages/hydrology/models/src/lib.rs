#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hydrology model input and output types.
//!
//! A TR-55 run takes a [`ModelInput`] plus censuses and produces a
//! [`Tr55Result`]. Engine output arrives as a [`SimulationOutput`] per
//! run; the current and pre-Columbian runs are merged into one
//! [`ModelOutput`] keyed by [`Scenario`].

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};
use watershed_census_models::{Census, ModificationPiece};

/// Name of the model input carrying the storm depth.
pub const PRECIPITATION_INPUT: &str = "precipitation";

/// Land-cover scenario a set of results belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Scenario {
    /// Current land cover without user modifications.
    Unmodified,
    /// Current land cover with user modifications.
    Modified,
    /// Pre-Columbian land cover without user modifications.
    PcUnmodified,
    /// Pre-Columbian land cover with user modifications.
    PcModified,
}

/// Water balance of one land-cover/soil bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionResult {
    /// Runoff depth.
    pub runoff: f64,
    /// Infiltration depth.
    pub inf: f64,
    /// Evapotranspiration depth.
    pub et: f64,
    /// Any other per-bucket outputs.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Water balance and pollutant loads for one scenario.
///
/// Depths are inches and loads are pounds as produced by the engine,
/// centimeters and kilograms once converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Runoff depth.
    pub runoff: f64,
    /// Infiltration depth.
    pub inf: f64,
    /// Evapotranspiration depth.
    pub et: f64,
    /// Total suspended solids load.
    pub tss: f64,
    /// Total nitrogen load.
    pub tn: f64,
    /// Total phosphorus load.
    pub tp: f64,
    /// Per land-cover/soil breakdown.
    #[serde(default)]
    pub distribution: BTreeMap<String, DistributionResult>,
    /// Any other engine outputs.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Output of a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    /// Results without user modifications.
    pub unmodified: ScenarioResult,
    /// Results with user modifications.
    pub modified: ScenarioResult,
}

/// Merged results of the current and pre-Columbian runs.
pub type ModelOutput = BTreeMap<Scenario, ScenarioResult>;

/// Merges a current-conditions run and a pre-Columbian run.
#[must_use]
pub fn merge_outputs(current: SimulationOutput, precolumbian: SimulationOutput) -> ModelOutput {
    BTreeMap::from([
        (Scenario::Unmodified, current.unmodified),
        (Scenario::Modified, current.modified),
        (Scenario::PcUnmodified, precolumbian.unmodified),
        (Scenario::PcModified, precolumbian.modified),
    ])
}

/// One pollutant's load paired with the scenario runoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMeasure {
    /// Pollutant name.
    pub measure: String,
    /// Load in kilograms.
    pub load: f64,
    /// Runoff depth in centimeters.
    pub runoff: f64,
}

/// Pollutant loads per scenario.
pub type QualityOutput = BTreeMap<Scenario, Vec<QualityMeasure>>;

/// A named scalar model input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputParam {
    /// Input name (e.g. `"precipitation"`).
    pub name: String,
    /// Input value.
    pub value: f64,
}

/// Parameters of a TR-55 run as posted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInput {
    /// Named scalar inputs.
    #[serde(default)]
    pub inputs: Vec<InputParam>,
    /// The area being modeled.
    pub area_of_interest: geojson::Geometry,
    /// Altered modification pieces, one per modification census.
    #[serde(default)]
    pub modification_pieces: Vec<ModificationPiece>,
    /// Caller-computed hash of the inputs and modifications.
    pub inputmod_hash: String,
    /// Caller-computed hash of the modifications.
    pub modification_hash: String,
}

impl ModelInput {
    /// The storm depth, if one was supplied.
    #[must_use]
    pub fn precipitation(&self) -> Option<f64> {
        self.inputs
            .iter()
            .find(|input| input.name == PRECIPITATION_INPUT)
            .map(|input| input.value)
    }
}

/// Result of a TR-55 run.
///
/// When the simulation could not run on the supplied census, `runoff` and
/// `quality` are empty and serialize as `{}` and `[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tr55Result {
    /// Passed through from [`ModelInput::inputmod_hash`].
    pub inputmod_hash: String,
    /// Passed through from [`ModelInput::modification_hash`].
    pub modification_hash: String,
    /// The area census with the `BMPs` summary attached.
    pub aoi_census: Census,
    /// Censuses paired with the modification pieces.
    pub modification_censuses: Vec<Census>,
    /// Converted water balance per scenario.
    pub runoff: ModelOutput,
    /// Converted pollutant loads per scenario.
    #[serde(
        serialize_with = "serialize_quality",
        deserialize_with = "deserialize_quality"
    )]
    pub quality: QualityOutput,
}

impl Tr55Result {
    /// Whether the simulation produced no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runoff.is_empty() && self.quality.is_empty()
    }
}

fn serialize_quality<S: Serializer>(
    quality: &QualityOutput,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if quality.is_empty() {
        serializer.collect_seq(std::iter::empty::<QualityMeasure>())
    } else {
        quality.serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QualityWire {
    ByScenario(QualityOutput),
    Empty(Vec<serde_json::Value>),
}

fn deserialize_quality<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<QualityOutput, D::Error> {
    match QualityWire::deserialize(deserializer)? {
        QualityWire::ByScenario(quality) => Ok(quality),
        QualityWire::Empty(list) if list.is_empty() => Ok(BTreeMap::new()),
        QualityWire::Empty(_) => Err(serde::de::Error::custom(
            "quality must be a scenario mapping or an empty list",
        )),
    }
}

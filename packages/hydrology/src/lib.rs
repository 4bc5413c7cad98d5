#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hydrology runs over land-cover/soil censuses.
//!
//! [`tr55`] feeds an area census and its modifications through a
//! [`HydrologyEngine`] under current and pre-Columbian conditions and
//! converts the merged result to metric units. [`mapshed`] wraps a
//! [`mapshed::GwlfeEngine`] run. The engines themselves are external.

pub mod engine;
pub mod format;
pub mod mapshed;
pub mod tr55;
pub mod units;

use watershed_census::CensusError;
use watershed_geoprocessing::GeoprocessingError;

pub use engine::{AugmentedCensus, HydrologyEngine, SimulationError};
pub use format::{format_quality, format_runoff};
pub use tr55::{Tr55Outcome, Tr55Run, run_tr55, simulate};
pub use units::UnitConversion;

/// Errors from a TR-55 run.
#[derive(Debug, thiserror::Error)]
pub enum Tr55Error {
    /// The model input has no precipitation value.
    #[error("No precipitation value defined")]
    NoPrecipitation,

    /// The area of interest could not be normalized.
    #[error(transparent)]
    Geometry(#[from] GeoprocessingError),

    /// Modification pieces and censuses could not be paired.
    #[error(transparent)]
    Census(#[from] CensusError),

    /// The engine failed on a well-formed census.
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

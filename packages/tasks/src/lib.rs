#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Independently schedulable stages of the watershed analysis pipeline.
//!
//! Every stage takes and returns plain serializable values, so a stage
//! can run in a different worker from the one before it. Nothing is
//! shared between stages except what is passed in, including the
//! [`WatershedConfig`].

pub mod config;
pub mod delineation;
pub mod histogram;
pub mod modeling;
pub mod point;

use watershed_census::CensusError;
use watershed_geoprocessing::GeoprocessingError;
use watershed_hydrology::{SimulationError, Tr55Error};

pub use config::{ConfigError, WatershedConfig};
pub use delineation::start_rwd_job;
pub use histogram::{
    SurveyCensus, get_histogram_job_results, histogram_to_survey_census, nlcd_soil_census,
    run_analyze, start_histogram_job,
};
pub use modeling::{run_gwlfe, run_tr55, split_censuses};
pub use point::{
    PointAnalyses, PointAnalysis, PointSurvey, analyze_animals, analyze_catchment_water_quality,
    analyze_pointsource,
};

/// Errors from pipeline stages.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Geometry, compute service or delineation failure.
    #[error(transparent)]
    Geoprocessing(#[from] GeoprocessingError),

    /// Histogram reduction or modification pairing failed.
    #[error(transparent)]
    Census(#[from] CensusError),

    /// The TR-55 run failed.
    #[error(transparent)]
    Tr55(#[from] Tr55Error),

    /// A hydrology engine failed.
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// A stage payload could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A finished histogram job returned no histograms.
    #[error("Histogram job returned no results")]
    EmptyHistogram,

    /// No area census was supplied to the TR-55 stage.
    #[error("No area of interest census supplied")]
    MissingAoiCensus,

    /// A point analysis failed.
    #[error("Analysis failed: {message}")]
    Analysis {
        /// Failure description.
        message: String,
    },
}

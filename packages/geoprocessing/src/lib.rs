#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geoprocessing boundary for the watershed pipeline.
//!
//! The raster histograms behind every analysis are computed by an
//! external job server. Work is submitted with [`ComputeService::submit`]
//! and collected with [`ComputeService::poll`], which answers
//! [`PollStatus::NotReady`] until the job finishes. The
//! [`poller::JobPoller`] drives that exchange as an explicit state
//! machine with a bounded number of polls and a fixed delay between them.
//!
//! Also provides area-of-interest normalization ([`aoi`]) and the rapid
//! watershed delineation client ([`rwd`]).

pub mod aoi;
pub mod job;
pub mod poller;
pub mod rwd;
pub mod sjs;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use watershed_census_models::HistogramPayload;

pub use aoi::NormalizedAoi;
pub use job::{HistogramJobResult, JobHandle, submit_histogram_job};
pub use poller::{JobPoller, JobState, RetryPolicy};

/// Errors from the geoprocessing boundary.
///
/// Only [`PollStatus::NotReady`] is retryable; every variant here is
/// terminal for the job it concerns.
#[derive(Debug, thiserror::Error)]
pub enum GeoprocessingError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The area of interest could not be normalized.
    #[error("Invalid area of interest: {message}")]
    InvalidGeometry {
        /// Why the geometry was rejected.
        message: String,
    },

    /// The compute service reported a failure.
    #[error("{message}")]
    Service {
        /// Service error text.
        message: String,
    },

    /// The delineation service rejected the location.
    #[error("{message}")]
    OutsideWatershed {
        /// Message returned by the delineation service.
        message: String,
    },

    /// The job never finished within the poll ceiling.
    #[error("Job {job_id} timed out after {attempts} polls, {cleanup}")]
    Timeout {
        /// The job that was abandoned.
        job_id: JobId,
        /// Number of polls issued.
        attempts: u32,
        /// Whether the job was removed from the server afterwards.
        cleanup: JobCleanup,
    },
}

/// What happened to an abandoned job on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum JobCleanup {
    /// The job was deleted.
    #[strum(serialize = "deleted")]
    Deleted,
    /// The delete request failed; the job may still be running.
    #[strum(serialize = "could not delete")]
    NotDeleted,
}

/// Identifier assigned to a submitted job by the compute service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// The job is still running.
    NotReady,
    /// The job finished; one histogram per submitted polygon.
    Ready(Vec<HistogramPayload>),
}

/// An external asynchronous compute service.
///
/// Every call issues exactly one outbound request. `poll` is idempotent:
/// a finished job keeps returning the same result and a failed job keeps
/// returning an error.
#[async_trait]
pub trait ComputeService: Send + Sync {
    /// Starts a histogram job over `polygons` (`GeoJSON` strings) without
    /// waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`GeoprocessingError`] if the request fails or the service
    /// refuses the job.
    async fn submit(&self, polygons: &[String]) -> Result<JobId, GeoprocessingError>;

    /// Checks on a previously submitted job.
    ///
    /// # Errors
    ///
    /// Returns [`GeoprocessingError`] if the request fails or the job
    /// failed on the server.
    async fn poll(&self, job_id: &JobId) -> Result<PollStatus, GeoprocessingError>;

    /// Removes an abandoned job from the server.
    ///
    /// # Errors
    ///
    /// Returns [`GeoprocessingError`] if the job could not be deleted.
    async fn cancel(&self, job_id: &JobId) -> Result<(), GeoprocessingError>;
}

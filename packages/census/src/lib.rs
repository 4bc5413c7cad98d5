#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Land-cover/soil census logic.
//!
//! Turns raw histograms from the compute service into the canonical
//! [`Census`](watershed_census_models::Census) and
//! [`Survey`](watershed_census_models::Survey) structures, and merges
//! user-drawn modification pieces with their pre-computed censuses.
//!
//! Raster codes are resolved through [`LookupTables`], which default to
//! the tables embedded from `config/lookup.toml` but can be substituted
//! wholesale.

pub mod lookup;
pub mod modifications;
pub mod reducer;
pub mod survey;

pub use lookup::{Label, LookupTables};
pub use modifications::{aggregate_areas, apply_modifications, resolve_modification_censuses};
pub use reducer::{data_to_census, decode_key, nlcd_soil_census};
pub use survey::{convert_result_areas, data_to_survey};

/// Errors from census reduction and modification merging.
#[derive(Debug, thiserror::Error)]
pub enum CensusError {
    /// The histogram payload carried an error marker.
    #[error("[nlcd_soil_census] {message}")]
    Distribution {
        /// Message found in the payload.
        message: String,
    },

    /// A histogram key did not embed a `(landcover, soil)` pair.
    #[error("Malformed histogram key: {key}")]
    MalformedKey {
        /// The offending key.
        key: String,
    },

    /// Modification pieces were supplied without any censuses.
    #[error("Missing censuses for modifications")]
    MissingCensuses,

    /// Pieces and censuses could not be paired one to one.
    #[error("Got {censuses} censuses for {pieces} modification pieces")]
    ModificationCountMismatch {
        /// Number of modification pieces.
        pieces: usize,
        /// Number of modification censuses.
        censuses: usize,
    },

    /// Lookup tables are inconsistent.
    #[error("Invalid lookup tables: {message}")]
    Lookup {
        /// Description of the inconsistency.
        message: String,
    },

    /// Lookup TOML could not be parsed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

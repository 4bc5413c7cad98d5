//! TR-55 census pipeline.
//!
//! Runs the hydrology engine twice over one area census, once under
//! current conditions and once under pre-Columbian conditions, and
//! converts the merged output. The caller's census is never modified: the
//! engine gets an [`AugmentedCensus`] and the result carries a fresh copy
//! with only the `BMPs` summary added.

use std::collections::BTreeMap;

use watershed_census::{aggregate_areas, apply_modifications, resolve_modification_censuses};
use watershed_census_models::{Census, ModificationPiece};
use watershed_geoprocessing::NormalizedAoi;
use watershed_hydrology_models::{ModelInput, ModelOutput, QualityOutput, Tr55Result, merge_outputs};

use crate::{
    AugmentedCensus, HydrologyEngine, SimulationError, Tr55Error, UnitConversion, format_quality,
    format_runoff,
};

/// Inputs of one simulation pair.
#[derive(Debug, Clone, Copy)]
pub struct Tr55Run<'a> {
    /// Census of the whole area.
    pub aoi_census: &'a Census,
    /// Storm depth in inches.
    pub precipitation: f64,
    /// Ground area of one raster cell.
    pub cell_resolution: f64,
    /// User edits to the area.
    pub modification_pieces: &'a [ModificationPiece],
    /// Censuses of the edited ground, one per piece.
    pub modification_censuses: &'a [Census],
}

/// Outputs of one simulation pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Tr55Outcome {
    /// The area census with the `BMPs` summary attached.
    pub aoi_census: Census,
    /// The censuses actually paired with pieces.
    pub modification_censuses: Vec<Census>,
    /// Converted water balance, empty if the census was malformed.
    pub runoff: ModelOutput,
    /// Converted pollutant loads, empty if the census was malformed.
    pub quality: QualityOutput,
}

/// Runs the current and pre-Columbian simulations over `run`.
///
/// A census missing fields the engine needs yields an empty outcome
/// rather than an error.
///
/// # Errors
///
/// Returns [`Tr55Error::Census`] if pieces and censuses cannot be paired
/// and [`Tr55Error::Simulation`] if the engine fails for another reason.
pub async fn simulate<E: HydrologyEngine + ?Sized>(
    engine: &E,
    run: Tr55Run<'_>,
    units: &UnitConversion,
) -> Result<Tr55Outcome, Tr55Error> {
    let bmps = aggregate_areas(run.modification_pieces);
    let modification_censuses =
        resolve_modification_censuses(run.modification_pieces, run.modification_censuses)?;
    let modifications = apply_modifications(run.modification_pieces, modification_censuses)?;

    let augmented = AugmentedCensus::new(run.aoi_census, modifications, bmps.clone());

    let simulated = tokio::try_join!(
        engine.simulate_day(&augmented, run.precipitation, run.cell_resolution, false),
        engine.simulate_day(&augmented, run.precipitation, run.cell_resolution, true),
    );

    let (runoff, quality) = match simulated {
        Ok((current, precolumbian)) => {
            let runoff = format_runoff(merge_outputs(current, precolumbian), units);
            let quality = format_quality(&runoff, units);
            (runoff, quality)
        }
        Err(e @ SimulationError::MissingField { .. }) => {
            log::error!("Bad input data to TR-55: {e}");
            (BTreeMap::new(), BTreeMap::new())
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Tr55Outcome {
        aoi_census: run.aoi_census.with_bmps(bmps),
        modification_censuses: modification_censuses.to_vec(),
        runoff,
        quality,
    })
}

/// Runs TR-55 for a posted model input.
///
/// `cell_size` is the raster cell size used to derive the ground
/// resolution over the area of interest.
///
/// # Errors
///
/// Returns [`Tr55Error::NoPrecipitation`] before anything else runs if the
/// input has no precipitation value, [`Tr55Error::Geometry`] if the area
/// of interest cannot be normalized, and otherwise fails like
/// [`simulate`].
pub async fn run_tr55<E: HydrologyEngine + ?Sized>(
    engine: &E,
    model_input: &ModelInput,
    aoi_census: &Census,
    modification_censuses: &[Census],
    cell_size: f64,
    units: &UnitConversion,
) -> Result<Tr55Result, Tr55Error> {
    let precipitation = model_input
        .precipitation()
        .ok_or(Tr55Error::NoPrecipitation)?;

    let aoi = NormalizedAoi::from_geojson(&model_input.area_of_interest)?;
    let cell_resolution = aoi.cell_resolution(cell_size);

    let outcome = simulate(
        engine,
        Tr55Run {
            aoi_census,
            precipitation,
            cell_resolution,
            modification_pieces: &model_input.modification_pieces,
            modification_censuses,
        },
        units,
    )
    .await?;

    Ok(Tr55Result {
        inputmod_hash: model_input.inputmod_hash.clone(),
        modification_hash: model_input.modification_hash.clone(),
        aoi_census: outcome.aoi_census,
        modification_censuses: outcome.modification_censuses,
        runoff: outcome.runoff,
        quality: outcome.quality,
    })
}

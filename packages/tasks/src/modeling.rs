//! Modeling stages.

use watershed_census_models::Census;
use watershed_hydrology::mapshed::{self, GwlfeEngine, MapshedData};
use watershed_hydrology::{HydrologyEngine, run_tr55 as run_tr55_model};
use watershed_hydrology_models::{ModelInput, Tr55Result};

use crate::{TaskError, WatershedConfig};

/// Splits a census list into the area census and the modification
/// censuses.
///
/// Without a cached area census the first census of the list is the area
/// census; with one, the whole list is modification censuses.
///
/// # Errors
///
/// Returns [`TaskError::MissingAoiCensus`] if there is no cached census
/// and the list is empty.
pub fn split_censuses(
    censuses: Vec<Census>,
    cached_aoi_census: Option<Census>,
) -> Result<(Census, Vec<Census>), TaskError> {
    if let Some(aoi_census) = cached_aoi_census {
        return Ok((aoi_census, censuses));
    }

    let mut censuses = censuses.into_iter();
    let aoi_census = censuses.next().ok_or(TaskError::MissingAoiCensus)?;
    Ok((aoi_census, censuses.collect()))
}

/// Runs TR-55 on censuses produced by earlier stages or cached by the
/// caller.
///
/// # Errors
///
/// Returns [`TaskError::MissingAoiCensus`] if no area census is available
/// and [`TaskError::Tr55`] if the run fails.
pub async fn run_tr55<E: HydrologyEngine + ?Sized>(
    engine: &E,
    censuses: Vec<Census>,
    model_input: &ModelInput,
    cached_aoi_census: Option<Census>,
    config: &WatershedConfig,
) -> Result<Tr55Result, TaskError> {
    let (aoi_census, modification_censuses) = split_censuses(censuses, cached_aoi_census)?;

    Ok(run_tr55_model(
        engine,
        model_input,
        &aoi_census,
        &modification_censuses,
        config.raster.cell_size,
        &config.units,
    )
    .await?)
}

/// Runs GWLF-E over MapShed output.
///
/// # Errors
///
/// Returns [`TaskError::Simulation`] if the engine fails.
pub async fn run_gwlfe<E: GwlfeEngine + ?Sized>(
    engine: &E,
    model_input: MapshedData,
    inputmod_hash: &str,
) -> Result<MapshedData, TaskError> {
    Ok(mapshed::run_gwlfe(engine, model_input, inputmod_hash).await?)
}

//! Watershed delineation stage.

use watershed_geoprocessing::rwd::{DataSource, DelineationRequest, RwdClient};

use crate::TaskError;

/// Delineates the watershed draining to `(lat, lng)`.
///
/// Locations outside the supported area fail immediately with the
/// service's message.
///
/// # Errors
///
/// Returns [`TaskError::Geoprocessing`] if the request fails or the
/// service rejects the location.
pub async fn start_rwd_job(
    client: &RwdClient,
    location: (f64, f64),
    snapping: bool,
    data_source: DataSource,
) -> Result<serde_json::Value, TaskError> {
    let (lat, lng) = location;
    let request = DelineationRequest {
        lat,
        lng,
        snapping,
        data_source,
    };

    Ok(client.delineate(&request).await?)
}

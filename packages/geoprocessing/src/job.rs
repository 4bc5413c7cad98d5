//! Histogram job submission.
//!
//! Submitting and collecting a job run as separate scheduled stages with
//! nothing shared between them, so everything the collecting stage needs
//! travels inside the serializable [`JobHandle`].

use serde::{Deserialize, Serialize};
use watershed_census_models::HistogramPayload;

use crate::{ComputeService, GeoprocessingError, JobId, NormalizedAoi};

/// A submitted histogram job plus the metadata known before it ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobHandle {
    /// Ground width of a raster cell over the submitted area.
    pub pixel_width: f64,
    /// Identifier assigned by the compute service.
    #[serde(rename = "sjs_job_id")]
    pub job_id: JobId,
}

/// A finished histogram job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramJobResult {
    /// Carried over from the [`JobHandle`].
    pub pixel_width: f64,
    /// One histogram per submitted polygon.
    pub histogram: Vec<HistogramPayload>,
}

/// Submits a histogram job for `aoi` and returns without waiting.
///
/// # Errors
///
/// Returns [`GeoprocessingError`] if serialization or submission fails.
pub async fn submit_histogram_job<S: ComputeService + ?Sized>(
    service: &S,
    aoi: &NormalizedAoi,
    cell_size: f64,
) -> Result<JobHandle, GeoprocessingError> {
    let polygon = aoi.to_json_string()?;
    let job_id = service.submit(&[polygon]).await?;

    log::debug!("Submitted histogram job {job_id}");

    Ok(JobHandle {
        pixel_width: aoi.pixel_width(cell_size),
        job_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_uses_wire_field_names() {
        let handle = JobHandle {
            pixel_width: 27.5,
            job_id: JobId("job-7".to_string()),
        };
        let json = serde_json::to_value(&handle).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "pixel_width": 27.5, "sjs_job_id": "job-7" })
        );
        let back: JobHandle = serde_json::from_value(json).unwrap();
        assert_eq!(back, handle);
    }
}

//! Histogram stages of the analyze chain.
//!
//! `start_histogram_job → get_histogram_job_results →
//! histogram_to_survey_census` each take and return plain serializable
//! values so they can be scheduled independently. [`run_analyze`] chains
//! them in-process.

use serde::{Deserialize, Serialize};
use watershed_census::{LookupTables, convert_result_areas, data_to_census, data_to_survey};
use watershed_census_models::{Census, HistogramPayload, Survey};
use watershed_geoprocessing::{
    ComputeService, HistogramJobResult, JobHandle, JobPoller, NormalizedAoi, RetryPolicy,
    submit_histogram_job,
};

use crate::{TaskError, WatershedConfig};

/// Survey and census of an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyCensus {
    /// Areas in square meters.
    pub survey: Survey,
    /// Cell counts per land-cover/soil bucket.
    pub census: Census,
}

/// Normalizes `area_of_interest` and submits its histogram job.
///
/// # Errors
///
/// Returns [`TaskError::Geoprocessing`] if the geometry is not a polygon
/// or the job cannot be submitted.
pub async fn start_histogram_job<S: ComputeService + ?Sized>(
    service: &S,
    area_of_interest: &geojson::Geometry,
    cell_size: f64,
) -> Result<JobHandle, TaskError> {
    let aoi = NormalizedAoi::from_geojson(area_of_interest)?;
    Ok(submit_histogram_job(service, &aoi, cell_size).await?)
}

/// Waits for a submitted histogram job.
///
/// # Errors
///
/// Returns [`TaskError::Geoprocessing`] if the job fails or never
/// finishes within `policy`.
pub async fn get_histogram_job_results<S: ComputeService + ?Sized>(
    service: &S,
    handle: JobHandle,
    policy: RetryPolicy,
) -> Result<HistogramJobResult, TaskError> {
    Ok(JobPoller::new(service, policy).wait(handle).await?)
}

fn first_histogram(result: &HistogramJobResult) -> Result<&HistogramPayload, TaskError> {
    result.histogram.first().ok_or(TaskError::EmptyHistogram)
}

/// Converts the first histogram of a finished job to a survey in square
/// meters and a census.
///
/// # Errors
///
/// Returns [`TaskError::EmptyHistogram`] if the job returned nothing and
/// [`TaskError::Census`] if the histogram cannot be reduced.
pub fn histogram_to_survey_census(
    result: &HistogramJobResult,
    tables: &LookupTables,
) -> Result<SurveyCensus, TaskError> {
    let data = first_histogram(result)?;

    let census = data_to_census(data, tables)?;
    let mut survey = data_to_survey(data, tables)?;
    convert_result_areas(result.pixel_width, &mut survey);

    Ok(SurveyCensus { survey, census })
}

/// Reduces the first histogram of a finished job to a one-element census
/// list, the shape the TR-55 stage takes.
///
/// # Errors
///
/// See [`histogram_to_survey_census`].
pub fn nlcd_soil_census(
    result: &HistogramJobResult,
    tables: &LookupTables,
) -> Result<Vec<Census>, TaskError> {
    Ok(watershed_census::nlcd_soil_census(first_histogram(result)?, tables)?)
}

/// Runs the whole analyze chain for one area.
///
/// # Errors
///
/// Fails like the individual stages.
pub async fn run_analyze<S: ComputeService + ?Sized>(
    service: &S,
    area_of_interest: &geojson::Geometry,
    config: &WatershedConfig,
) -> Result<SurveyCensus, TaskError> {
    let handle = start_histogram_job(service, area_of_interest, config.raster.cell_size).await?;
    log::info!("Analyzing area with job {}", handle.job_id);

    let result = get_histogram_job_results(service, handle, config.poll).await?;
    histogram_to_survey_census(&result, &config.lookup)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use watershed_geoprocessing::{GeoprocessingError, JobId, PollStatus};

    use super::*;

    /// Accepts one job and finishes it on the second poll.
    #[derive(Default)]
    struct FakeJobServer {
        submitted: Mutex<Vec<String>>,
        polls: AtomicU32,
    }

    #[async_trait]
    impl ComputeService for FakeJobServer {
        async fn submit(&self, polygons: &[String]) -> Result<JobId, GeoprocessingError> {
            self.submitted.lock().unwrap().extend_from_slice(polygons);
            Ok(JobId("job-42".to_string()))
        }

        async fn poll(&self, job_id: &JobId) -> Result<PollStatus, GeoprocessingError> {
            assert_eq!(job_id.0, "job-42");
            if self.polls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Ok(PollStatus::NotReady);
            }
            Ok(PollStatus::Ready(vec![HistogramPayload::Counts(
                [
                    ("List(11,1)".to_string(), 3),
                    ("List(21,2)".to_string(), 1),
                ]
                .into_iter()
                .collect(),
            )]))
        }

        async fn cancel(&self, _job_id: &JobId) -> Result<(), GeoprocessingError> {
            Ok(())
        }
    }

    fn aoi() -> geojson::Geometry {
        serde_json::from_value(serde_json::json!({
            "type": "MultiPolygon",
            "coordinates": [[
                [[0.0, 0.0], [0.01, 0.0], [0.01, 0.01], [0.0, 0.01], [0.0, 0.0]],
                [[0.002, 0.002], [0.003, 0.002], [0.003, 0.003], [0.002, 0.002]]
            ]]
        }))
        .unwrap()
    }

    fn config() -> WatershedConfig {
        let mut config = WatershedConfig::embedded();
        config.poll.delay_ms = 0;
        config
    }

    #[tokio::test]
    async fn analyze_chain_produces_survey_and_census() {
        let service = FakeJobServer::default();
        let result = run_analyze(&service, &aoi(), &config()).await.unwrap();

        assert_eq!(service.polls.load(Ordering::SeqCst), 2);
        assert_eq!(result.census.cell_count, Some(4));
        let distribution = result.census.distribution.unwrap();
        assert_eq!(distribution["a:water"].cell_count, Some(3));
        assert_eq!(distribution["b:developed_open"].cell_count, Some(1));

        let water = result.survey[0]
            .categories
            .iter()
            .find(|c| c.code == "water")
            .unwrap();
        assert!(water.area > 2699.0 && water.area <= 2700.0);
        assert!((water.coverage - 0.75).abs() < f64::EPSILON);

        // Only the exterior ring is sent to the server.
        let submitted = service.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        let sent: geojson::Geometry = serde_json::from_str(&submitted[0]).unwrap();
        let sent = NormalizedAoi::from_geojson(&sent).unwrap();
        assert!(sent.polygon().interiors().is_empty());
    }

    #[tokio::test]
    async fn job_handle_survives_serialization_between_stages() {
        let service = FakeJobServer::default();
        let handle = start_histogram_job(&service, &aoi(), 30.0).await.unwrap();

        let wire = serde_json::to_string(&handle).unwrap();
        let handle: JobHandle = serde_json::from_str(&wire).unwrap();

        let result = get_histogram_job_results(
            &service,
            handle.clone(),
            RetryPolicy {
                max_attempts: 5,
                delay_ms: 0,
            },
        )
        .await
        .unwrap();
        assert!((result.pixel_width - handle.pixel_width).abs() < f64::EPSILON);

        let censuses = nlcd_soil_census(&result, &LookupTables::embedded()).unwrap();
        assert_eq!(censuses.len(), 1);
        assert_eq!(censuses[0].cell_count, Some(4));
    }

    #[test]
    fn empty_job_result_is_an_error() {
        let result = HistogramJobResult {
            pixel_width: 30.0,
            histogram: vec![],
        };
        assert!(matches!(
            histogram_to_survey_census(&result, &LookupTables::embedded()),
            Err(TaskError::EmptyHistogram)
        ));
    }

    #[test]
    fn error_marker_fails_the_census() {
        let result = HistogramJobResult {
            pixel_width: 30.0,
            histogram: vec![HistogramPayload::Error {
                error: "raster read failed".to_string(),
            }],
        };
        let err = nlcd_soil_census(&result, &LookupTables::embedded()).unwrap_err();
        assert_eq!(err.to_string(), "[nlcd_soil_census] raster read failed");
    }
}

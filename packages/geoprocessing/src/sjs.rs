//! Spark JobServer client.
//!
//! - Submit: `POST /jobs?<args>` with the geometry under `input.geometry`
//! - Poll: `GET /jobs/<id>`
//! - Cancel: `DELETE /jobs/<id>`
//!
//! Response handling lives in plain functions so it can be tested
//! without a server.

use async_trait::async_trait;
use watershed_census_models::HistogramPayload;

use crate::{ComputeService, GeoprocessingError, JobId, PollStatus};

/// Status reported once a job has been accepted.
const STATUS_STARTED: &str = "STARTED";
/// Status reported for a finished job.
const STATUS_FINISHED: &str = "FINISHED";
/// Status reported for a job still running.
const STATUS_RUNNING: &str = "RUNNING";
/// Status reported for a failed job.
const STATUS_ERROR: &str = "ERROR";
/// Status reported when every worker is busy.
const STATUS_NO_SLOTS: &str = "NO SLOTS AVAILABLE";

/// Client for a Spark JobServer instance.
#[derive(Debug, Clone)]
pub struct SparkJobServer {
    client: reqwest::Client,
    base_url: String,
    job_args: Vec<(String, String)>,
    request_body: serde_json::Value,
}

impl SparkJobServer {
    /// Creates a client for the server at `host:port`.
    ///
    /// `job_args` become the query string of every submission and
    /// `request_body` is the body template the geometry is inserted into.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        host: &str,
        port: u16,
        job_args: Vec<(String, String)>,
        request_body: serde_json::Value,
    ) -> Self {
        Self {
            client,
            base_url: format!("http://{host}:{port}"),
            job_args,
            request_body,
        }
    }

    fn job_url(&self, job_id: &JobId) -> String {
        format!("{}/jobs/{job_id}", self.base_url)
    }
}

#[async_trait]
impl ComputeService for SparkJobServer {
    async fn submit(&self, polygons: &[String]) -> Result<JobId, GeoprocessingError> {
        let url = format!("{}/jobs", self.base_url);
        log::debug!("POST {url} {:?}", self.job_args);

        let body = build_submit_body(&self.request_body, polygons);
        let resp = self
            .client
            .post(&url)
            .query(&self.job_args)
            .json(&body)
            .send()
            .await?;
        let text = resp.text().await?;

        parse_submit_response(&text)
    }

    async fn poll(&self, job_id: &JobId) -> Result<PollStatus, GeoprocessingError> {
        let url = self.job_url(job_id);
        log::debug!("GET {url}");

        let resp = self.client.get(&url).send().await?;
        let text = resp.text().await?;

        parse_poll_response(job_id, &text)
    }

    async fn cancel(&self, job_id: &JobId) -> Result<(), GeoprocessingError> {
        let url = self.job_url(job_id);
        log::debug!("DELETE {url}");

        let resp = self.client.delete(&url).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(GeoprocessingError::Service {
                message: format!("Could not delete job {job_id}: HTTP {}", resp.status()),
            })
        }
    }
}

/// Inserts `polygons` into the body template under `input.geometry`.
#[must_use]
pub fn build_submit_body(template: &serde_json::Value, polygons: &[String]) -> serde_json::Value {
    let mut body = if template.is_object() {
        template.clone()
    } else {
        serde_json::json!({})
    };

    if !body["input"].is_object() {
        body["input"] = serde_json::json!({});
    }
    body["input"]["geometry"] = serde_json::json!(polygons);

    body
}

/// Extracts the job id from a submission response.
///
/// # Errors
///
/// Returns [`GeoprocessingError::Service`] with the raw response text
/// unless the job was started.
pub fn parse_submit_response(text: &str) -> Result<JobId, GeoprocessingError> {
    let body: serde_json::Value = serde_json::from_str(text)?;

    if body["status"].as_str() != Some(STATUS_STARTED) {
        return Err(GeoprocessingError::Service {
            message: text.to_string(),
        });
    }

    body["result"]["jobId"]
        .as_str()
        .map(|id| JobId(id.to_string()))
        .ok_or_else(|| GeoprocessingError::Service {
            message: format!("Missing jobId in response: {text}"),
        })
}

/// Interprets a poll response.
///
/// # Errors
///
/// Returns [`GeoprocessingError::Service`] for a failed job or an
/// unrecognized status.
pub fn parse_poll_response(job_id: &JobId, text: &str) -> Result<PollStatus, GeoprocessingError> {
    let body: serde_json::Value = serde_json::from_str(text)?;

    match body["status"].as_str() {
        Some(STATUS_FINISHED) => {
            let histogram: Vec<HistogramPayload> =
                serde_json::from_value(body["result"].clone())?;
            Ok(PollStatus::Ready(histogram))
        }
        Some(STATUS_RUNNING | STATUS_NO_SLOTS) => Ok(PollStatus::NotReady),
        Some(STATUS_ERROR) => {
            let class = body["result"]["errorClass"].as_str().unwrap_or("Unknown");
            let message = body["result"]["message"].as_str().unwrap_or("");
            Err(GeoprocessingError::Service {
                message: format!("{STATUS_ERROR} ({class}: {message})"),
            })
        }
        _ => Err(GeoprocessingError::Service {
            message: format!("Unexpected response for job {job_id}: {text}"),
        }),
    }
}

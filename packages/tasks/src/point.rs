//! Point-based analyses.
//!
//! Animal population, point-source pollution and catchment water quality
//! are looked up by an external [`PointAnalyses`] implementation. Each
//! stage normalizes the area first and wraps the single result in a
//! survey list.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use watershed_geoprocessing::NormalizedAoi;

use crate::TaskError;

/// Which point analysis to run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PointAnalysis {
    /// Livestock and poultry population estimate.
    Animals,
    /// Permitted point-source discharges.
    Pointsource,
    /// Catchment-level water quality (Delaware River Basin only).
    CatchmentWaterQuality,
}

/// Result list of a point analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSurvey {
    /// Exactly one entry.
    pub survey: Vec<serde_json::Value>,
}

/// Source of point-analysis results.
#[async_trait]
pub trait PointAnalyses: Send + Sync {
    /// Runs `analysis` over `aoi`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError`] if the analysis fails.
    async fn analyze(
        &self,
        analysis: PointAnalysis,
        aoi: &NormalizedAoi,
    ) -> Result<serde_json::Value, TaskError>;
}

async fn run_point<A: PointAnalyses + ?Sized>(
    analyses: &A,
    analysis: PointAnalysis,
    area_of_interest: &geojson::Geometry,
) -> Result<PointSurvey, TaskError> {
    let aoi = NormalizedAoi::from_geojson(area_of_interest)?;
    log::debug!("Running {analysis} analysis");

    Ok(PointSurvey {
        survey: vec![analyses.analyze(analysis, &aoi).await?],
    })
}

/// Estimates the animal population within the area.
///
/// # Errors
///
/// Returns [`TaskError`] if the area is not a polygon or the analysis
/// fails.
pub async fn analyze_animals<A: PointAnalyses + ?Sized>(
    analyses: &A,
    area_of_interest: &geojson::Geometry,
) -> Result<PointSurvey, TaskError> {
    run_point(analyses, PointAnalysis::Animals, area_of_interest).await
}

/// Lists point sources of pollution within the area.
///
/// # Errors
///
/// See [`analyze_animals`].
pub async fn analyze_pointsource<A: PointAnalyses + ?Sized>(
    analyses: &A,
    area_of_interest: &geojson::Geometry,
) -> Result<PointSurvey, TaskError> {
    run_point(analyses, PointAnalysis::Pointsource, area_of_interest).await
}

/// Returns catchment water quality data within the area.
///
/// # Errors
///
/// See [`analyze_animals`].
pub async fn analyze_catchment_water_quality<A: PointAnalyses + ?Sized>(
    analyses: &A,
    area_of_interest: &geojson::Geometry,
) -> Result<PointSurvey, TaskError> {
    run_point(analyses, PointAnalysis::CatchmentWaterQuality, area_of_interest).await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl PointAnalyses for Echo {
        async fn analyze(
            &self,
            analysis: PointAnalysis,
            aoi: &NormalizedAoi,
        ) -> Result<serde_json::Value, TaskError> {
            Ok(serde_json::json!({
                "name": analysis.as_ref(),
                "rings": aoi.polygon().interiors().len() + 1
            }))
        }
    }

    fn donut() -> geojson::Geometry {
        serde_json::from_value(serde_json::json!({
            "type": "Polygon",
            "coordinates": [
                [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]],
                [[0.2, 0.2], [0.4, 0.2], [0.4, 0.4], [0.2, 0.2]]
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn wraps_single_result_after_normalizing() {
        let result = analyze_animals(&Echo, &donut()).await.unwrap();
        assert_eq!(
            result.survey,
            vec![serde_json::json!({ "name": "animals", "rings": 1 })]
        );

        let result = analyze_catchment_water_quality(&Echo, &donut()).await.unwrap();
        assert_eq!(result.survey[0]["name"], "catchment_water_quality");

        let result = analyze_pointsource(&Echo, &donut()).await.unwrap();
        assert_eq!(result.survey.len(), 1);
    }

    #[tokio::test]
    async fn rejects_non_polygons() {
        let point: geojson::Geometry = serde_json::from_value(serde_json::json!({
            "type": "Point",
            "coordinates": [0.0, 0.0]
        }))
        .unwrap();
        assert!(matches!(
            analyze_pointsource(&Echo, &point).await,
            Err(TaskError::Geoprocessing(_))
        ));
    }
}

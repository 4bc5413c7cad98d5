//! GWLF-E runs over MapShed data.

use async_trait::async_trait;

use crate::SimulationError;

/// MapShed output keyed by GWLF-E input name.
pub type MapshedData = serde_json::Map<String, serde_json::Value>;

/// Key of the per-land-use area list.
pub const AREA_KEY: &str = "Area";

/// A GWLF-E model.
#[async_trait]
pub trait GwlfeEngine: Send + Sync {
    /// Runs the model over prepared MapShed data.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError`] if the data model is invalid or the run
    /// fails.
    async fn run(&self, data: &MapshedData) -> Result<MapshedData, SimulationError>;
}

/// Rounds every land-use area to one decimal place.
///
/// Rounding follows the exact stored value, so `0.35` (stored just
/// below) becomes `0.3`. Exact ties such as `2.25` round away from zero.
/// Non-numeric entries are left as they are.
pub fn round_areas(data: &mut MapshedData) {
    let Some(serde_json::Value::Array(areas)) = data.get_mut(AREA_KEY) else {
        return;
    };

    for area in areas.iter_mut() {
        if let Some(value) = area.as_f64() {
            *area = serde_json::json!(round_tenths(value));
        }
    }
}

fn round_tenths(value: f64) -> f64 {
    // A binary float sits exactly halfway between tenths only at odd quarters.
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return (value * 10.0).round() / 10.0;
    }

    format!("{value:.1}").parse().unwrap_or(value)
}

/// Runs GWLF-E and stamps the result with `inputmod_hash`.
///
/// # Errors
///
/// Returns whatever the engine reports.
pub async fn run_gwlfe<E: GwlfeEngine + ?Sized>(
    engine: &E,
    mut data: MapshedData,
    inputmod_hash: &str,
) -> Result<MapshedData, SimulationError> {
    round_areas(&mut data);

    let mut result = engine.run(&data).await?;
    result.insert(
        "inputmod_hash".to_string(),
        serde_json::Value::String(inputmod_hash.to_string()),
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoEngine;

    #[async_trait]
    impl GwlfeEngine for EchoEngine {
        async fn run(&self, data: &MapshedData) -> Result<MapshedData, SimulationError> {
            let mut out = MapshedData::new();
            out.insert("seen_area".to_string(), data[AREA_KEY].clone());
            Ok(out)
        }
    }

    fn data(value: serde_json::Value) -> MapshedData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn rounds_areas_to_one_decimal() {
        let mut mapshed = data(serde_json::json!({
            "Area": [1.04, 2.25, 10.0, 0.96],
            "NRur": 10
        }));
        round_areas(&mut mapshed);

        let areas: Vec<f64> = mapshed["Area"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a.as_f64().unwrap())
            .collect();
        let expected = [1.0, 2.3, 10.0, 1.0];
        for (got, want) in areas.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }
        assert_eq!(mapshed["NRur"], 10);
    }

    #[test]
    fn rounds_on_stored_decimal_value() {
        let mut mapshed = data(serde_json::json!({ "Area": [0.35, 1.15, 2.675, 0.45, 2.25, -1.25] }));
        round_areas(&mut mapshed);
        assert_eq!(
            mapshed["Area"],
            serde_json::json!([0.3, 1.1, 2.7, 0.5, 2.3, -1.3])
        );
    }

    #[test]
    fn missing_area_is_ignored() {
        let mut mapshed = data(serde_json::json!({ "NRur": 10 }));
        round_areas(&mut mapshed);
        assert_eq!(mapshed.len(), 1);
    }

    #[tokio::test]
    async fn stamps_input_hash() {
        let result = run_gwlfe(
            &EchoEngine,
            data(serde_json::json!({ "Area": [3.14159] })),
            "abc123",
        )
        .await
        .unwrap();

        assert_eq!(result["inputmod_hash"], "abc123");
        assert_eq!(result["seen_area"], serde_json::json!([3.1]));
    }
}

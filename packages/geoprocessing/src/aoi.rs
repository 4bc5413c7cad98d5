//! Area-of-interest normalization.
//!
//! Shapes reach the pipeline as user-drawn polygons or as single-ring
//! multipolygons returned by watershed delineation. Everything downstream
//! assumes one polygon with one ring, so normalization keeps the exterior
//! ring of the first polygon and drops every other ring.

use geo::{CoordsIter, Geometry, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::GeoprocessingError;

/// A single-ring multipolygon area of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAoi(MultiPolygon<f64>);

impl NormalizedAoi {
    /// Normalizes a `GeoJSON` geometry.
    ///
    /// # Errors
    ///
    /// Returns [`GeoprocessingError::InvalidGeometry`] for anything other
    /// than a non-empty `Polygon` or `MultiPolygon`.
    pub fn from_geojson(geometry: &geojson::Geometry) -> Result<Self, GeoprocessingError> {
        let geometry = Geometry::<f64>::try_from(geometry.value.clone()).map_err(|e| {
            GeoprocessingError::InvalidGeometry {
                message: e.to_string(),
            }
        })?;

        let ring = match geometry {
            Geometry::Polygon(polygon) => polygon.exterior().clone(),
            Geometry::MultiPolygon(multi) => multi
                .0
                .first()
                .map(|polygon| polygon.exterior().clone())
                .ok_or_else(|| GeoprocessingError::InvalidGeometry {
                    message: "MultiPolygon has no polygons".to_string(),
                })?,
            other => {
                return Err(GeoprocessingError::InvalidGeometry {
                    message: format!("expected a Polygon or MultiPolygon, got {other:?}"),
                });
            }
        };

        Self::from_ring(ring)
    }

    /// Parses and normalizes a `GeoJSON` geometry string.
    ///
    /// # Errors
    ///
    /// Returns [`GeoprocessingError`] if the string is not a `GeoJSON`
    /// geometry or fails [`Self::from_geojson`].
    pub fn from_json_str(json: &str) -> Result<Self, GeoprocessingError> {
        let geometry: geojson::Geometry = serde_json::from_str(json)?;
        Self::from_geojson(&geometry)
    }

    fn from_ring(ring: LineString<f64>) -> Result<Self, GeoprocessingError> {
        if ring.0.is_empty() {
            return Err(GeoprocessingError::InvalidGeometry {
                message: "polygon ring has no coordinates".to_string(),
            });
        }

        Ok(Self(MultiPolygon::new(vec![Polygon::new(ring, vec![])])))
    }

    /// The single polygon of the area.
    #[must_use]
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.0.0[0]
    }

    /// The area as a `geo` multipolygon.
    #[must_use]
    pub const fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.0
    }

    /// The area as a `GeoJSON` geometry.
    #[must_use]
    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::from(&self.0))
    }

    /// The area serialized as a `GeoJSON` string.
    ///
    /// # Errors
    ///
    /// Returns [`GeoprocessingError::Json`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, GeoprocessingError> {
        Ok(serde_json::to_string(&self.to_geojson())?)
    }

    /// Mean latitude of the ring's vertices, closing vertex included.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_latitude(&self) -> f64 {
        let ring = self.polygon().exterior();
        let sum: f64 = ring.coords_iter().map(|coord| coord.y).sum();
        sum / ring.coords_count() as f64
    }

    /// Ground width of one raster cell over this area.
    ///
    /// `cell_size` is the raster's cell size in projected meters; the
    /// projection stretches distances by `1 / cos(latitude)`.
    #[must_use]
    pub fn pixel_width(&self, cell_size: f64) -> f64 {
        cell_size * self.average_latitude().to_radians().cos()
    }

    /// Ground area of one raster cell over this area.
    #[must_use]
    pub fn cell_resolution(&self, cell_size: f64) -> f64 {
        let width = self.pixel_width(cell_size);
        width * width
    }
}

impl Serialize for NormalizedAoi {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_geojson().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NormalizedAoi {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let geometry = geojson::Geometry::deserialize(deserializer)?;
        Self::from_geojson(&geometry).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(value: serde_json::Value) -> geojson::Geometry {
        serde_json::from_value(value).unwrap()
    }

    fn square(x: f64, y: f64, size: f64) -> serde_json::Value {
        serde_json::json!([
            [x, y],
            [x + size, y],
            [x + size, y + size],
            [x, y + size],
            [x, y]
        ])
    }

    #[test]
    fn drops_holes_from_polygon() {
        let aoi = NormalizedAoi::from_geojson(&geometry(serde_json::json!({
            "type": "Polygon",
            "coordinates": [square(-75.2, 39.9, 0.1), square(-75.18, 39.92, 0.01)]
        })))
        .unwrap();

        assert_eq!(aoi.as_multi_polygon().0.len(), 1);
        assert!(aoi.polygon().interiors().is_empty());
        assert_eq!(aoi.polygon().exterior().0.len(), 5);
    }

    #[test]
    fn keeps_first_polygon_of_multipolygon() {
        let aoi = NormalizedAoi::from_geojson(&geometry(serde_json::json!({
            "type": "MultiPolygon",
            "coordinates": [
                [square(-75.2, 39.9, 0.1), square(-75.18, 39.92, 0.01)],
                [square(-76.0, 40.0, 0.1)]
            ]
        })))
        .unwrap();

        assert_eq!(aoi.as_multi_polygon().0.len(), 1);
        assert!(aoi.polygon().interiors().is_empty());
        assert!((aoi.polygon().exterior().0[0].x - -75.2).abs() < 1e-12);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = NormalizedAoi::from_geojson(&geometry(serde_json::json!({
            "type": "Polygon",
            "coordinates": [square(-75.2, 39.9, 0.1), square(-75.18, 39.92, 0.01)]
        })))
        .unwrap();
        let twice = NormalizedAoi::from_geojson(&once.to_geojson()).unwrap();
        assert_eq!(once, twice);

        let json = once.to_json_string().unwrap();
        assert_eq!(NormalizedAoi::from_json_str(&json).unwrap(), once);
    }

    #[test]
    fn rejects_points() {
        let result = NormalizedAoi::from_geojson(&geometry(serde_json::json!({
            "type": "Point",
            "coordinates": [-75.2, 39.9]
        })));
        assert!(matches!(
            result,
            Err(GeoprocessingError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn pixel_width_shrinks_with_latitude() {
        let equator = NormalizedAoi::from_geojson(&geometry(serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 0.0], [0.0, 0.0]]]
        })))
        .unwrap();
        assert!((equator.pixel_width(30.0) - 30.0).abs() < 1e-9);

        let sixty = NormalizedAoi::from_geojson(&geometry(serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 60.0], [1.0, 60.0], [1.0, 60.0], [0.0, 60.0]]]
        })))
        .unwrap();
        assert!((sixty.average_latitude() - 60.0).abs() < 1e-9);
        assert!((sixty.pixel_width(30.0) - 15.0).abs() < 1e-9);
        assert!((sixty.cell_resolution(30.0) - 225.0).abs() < 1e-9);
    }

    #[test]
    fn serde_round_trips_as_geojson() {
        let aoi: NormalizedAoi = serde_json::from_value(serde_json::json!({
            "type": "Polygon",
            "coordinates": [square(-75.2, 39.9, 0.1)]
        }))
        .unwrap();
        let json = serde_json::to_value(&aoi).unwrap();
        assert_eq!(json["type"], "MultiPolygon");
        assert_eq!(json["coordinates"].as_array().unwrap().len(), 1);
    }
}

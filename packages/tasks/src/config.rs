//! Pipeline configuration.
//!
//! Defaults are embedded from `config/default.toml`. A user TOML file can
//! replace any section, and a few environment variables override service
//! locations and the poll policy at startup.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use watershed_census::LookupTables;
use watershed_geoprocessing::RetryPolicy;
use watershed_geoprocessing::rwd::RwdClient;
use watershed_geoprocessing::sjs::SparkJobServer;
use watershed_hydrology::UnitConversion;

const EMBEDDED_CONFIG: &str = include_str!("../config/default.toml");

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for this schema.
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv {
        /// Variable name.
        name: String,
        /// Raw value.
        value: String,
    },
}

/// Spark JobServer location and job template.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoprocessingConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Query arguments of every job submission.
    #[serde(default)]
    pub job_args: BTreeMap<String, String>,
    /// Body template; the geometry is inserted under `input.geometry`.
    #[serde(default)]
    pub request_body: serde_json::Value,
}

/// Watershed delineation service location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RwdConfig {
    /// Service host.
    pub host: String,
    /// Service port.
    pub port: u16,
}

/// Raster properties shared by every histogram job.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RasterConfig {
    /// Raster cell size in projected meters.
    pub cell_size: f64,
}

/// Everything the pipeline stages need to know about their environment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WatershedConfig {
    pub geoprocessing: GeoprocessingConfig,
    pub rwd: RwdConfig,
    #[serde(default)]
    pub poll: RetryPolicy,
    #[serde(default)]
    pub units: UnitConversion,
    pub raster: RasterConfig,
    /// Land-cover/soil tables; the embedded tables unless replaced.
    #[serde(default)]
    pub lookup: LookupTables,
}

impl WatershedConfig {
    /// Returns the embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (this is a compile-time
    /// guarantee since the config is embedded).
    #[must_use]
    pub fn embedded() -> Self {
        toml::de::from_str(EMBEDDED_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded config: {e}"))
    }

    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document does not match the
    /// schema.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Loads configuration from a file, or the embedded defaults when no
    /// path is given, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or an
    /// override is malformed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                log::debug!("Loading config from {}", path.display());
                Self::from_toml_str(&std::fs::read_to_string(path)?)?
            }
            None => Self::embedded(),
        };

        config.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up by variable name:
    /// `GEOP_HOST`, `GEOP_PORT`, `RWD_HOST`, `RWD_PORT`,
    /// `GEOP_POLL_MAX_ATTEMPTS` and `GEOP_POLL_DELAY_MS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a numeric override does not
    /// parse.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup("GEOP_HOST") {
            self.geoprocessing.host = host;
        }
        if let Some(port) = parse_override(&lookup, "GEOP_PORT")? {
            self.geoprocessing.port = port;
        }
        if let Some(host) = lookup("RWD_HOST") {
            self.rwd.host = host;
        }
        if let Some(port) = parse_override(&lookup, "RWD_PORT")? {
            self.rwd.port = port;
        }
        if let Some(max_attempts) = parse_override(&lookup, "GEOP_POLL_MAX_ATTEMPTS")? {
            self.poll.max_attempts = max_attempts;
        }
        if let Some(delay_ms) = parse_override(&lookup, "GEOP_POLL_DELAY_MS")? {
            self.poll.delay_ms = delay_ms;
        }

        Ok(self)
    }

    /// Creates a compute client for the configured job server.
    #[must_use]
    pub fn sjs_client(&self, client: reqwest::Client) -> SparkJobServer {
        SparkJobServer::new(
            client,
            &self.geoprocessing.host,
            self.geoprocessing.port,
            self.geoprocessing
                .job_args
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            self.geoprocessing.request_body.clone(),
        )
    }

    /// Creates a client for the configured delineation service.
    #[must_use]
    pub fn rwd_client(&self, client: reqwest::Client) -> RwdClient {
        RwdClient::new(client, &self.rwd.host, self.rwd.port)
    }
}

impl Default for WatershedConfig {
    fn default() -> Self {
        Self::embedded()
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    lookup(name)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: name.to_string(),
                value,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_parses() {
        let config = WatershedConfig::embedded();
        assert_eq!(config.geoprocessing.port, 8090);
        assert_eq!(config.geoprocessing.job_args["context"], "geoprocessing");
        assert_eq!(
            config.geoprocessing.request_body["input"]["tileCRS"],
            "ConusAlbers"
        );
        assert_eq!(config.rwd.port, 5000);
        assert_eq!(config.poll, RetryPolicy::default());
        assert_eq!(config.units, UnitConversion::default());
        assert!((config.raster.cell_size - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.lookup, LookupTables::embedded());
    }

    #[test]
    fn env_overrides_replace_services_and_policy() {
        let config = WatershedConfig::embedded()
            .with_overrides(|name| match name {
                "RWD_HOST" => Some("rwd.internal".to_string()),
                "RWD_PORT" => Some("5050".to_string()),
                "GEOP_POLL_MAX_ATTEMPTS" => Some("3".to_string()),
                "GEOP_POLL_DELAY_MS" => Some("0".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.rwd.host, "rwd.internal");
        assert_eq!(config.rwd.port, 5050);
        assert_eq!(config.geoprocessing.host, "localhost");
        assert_eq!(config.poll.max_attempts, 3);
        assert_eq!(config.poll.delay_ms, 0);
    }

    #[test]
    fn bad_override_is_an_error() {
        let err = WatershedConfig::embedded()
            .with_overrides(|name| (name == "GEOP_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for GEOP_PORT: \"eighty\"");
    }

    #[test]
    fn user_config_keeps_section_defaults() {
        let config = WatershedConfig::from_toml_str(
            r#"
            [geoprocessing]
            host = "sjs"
            port = 9000

            [rwd]
            host = "rwd"
            port = 5001

            [poll]
            max_attempts = 5

            [raster]
            cell_size = 10.0
            "#,
        )
        .unwrap();

        assert_eq!(config.geoprocessing.host, "sjs");
        assert!(config.geoprocessing.job_args.is_empty());
        assert_eq!(config.poll.max_attempts, 5);
        assert_eq!(config.poll.delay_ms, 1000);
        assert_eq!(config.units, UnitConversion::default());
    }

    #[test]
    fn substituted_lookup_tables_are_validated() {
        let result = WatershedConfig::from_toml_str(
            r#"
            [geoprocessing]
            host = "sjs"
            port = 9000

            [rwd]
            host = "rwd"
            port = 5001

            [raster]
            cell_size = 30.0

            [lookup]
            nodata = -1
            land_cover = [{ value = 3, code = "forest", name = "Forest" }]
            soil = [{ value = 4, code = "c", name = "C" }]
            soil_collapse = [{ from = [-1], to = 9 }]
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }
}

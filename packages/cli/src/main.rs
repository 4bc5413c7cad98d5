#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the watershed analysis pipeline.
//!
//! Runs pipeline stages against live services and prints their JSON
//! results to stdout.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use watershed_census_models::HistogramPayload;
use watershed_geoprocessing::rwd::DataSource;
use watershed_tasks::{WatershedConfig, run_analyze, start_rwd_job};

#[derive(Parser)]
#[command(name = "watershed", about = "Watershed analysis pipeline")]
struct Cli {
    /// Configuration file replacing the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an area of interest and print its land/soil survey and census
    Analyze {
        /// `GeoJSON` Polygon or `MultiPolygon` file
        #[arg(long)]
        aoi: PathBuf,
    },
    /// Reduce a histogram JSON file to a land-cover/soil census
    Census {
        /// Histogram file (`{"List(11,1)": 4, ...}`)
        #[arg(long)]
        histogram: PathBuf,
    },
    /// Delineate the watershed draining to a point
    Delineate {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Use the point as given instead of snapping it to a stream
        #[arg(long)]
        no_snapping: bool,
        /// Stream network (`drb` or `nhd`)
        #[arg(long, default_value = "nhd")]
        data_source: DataSource,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<T, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();
    let config = WatershedConfig::load(cli.config.as_deref())?;
    let client = reqwest::Client::new();

    let output = match cli.command {
        Commands::Analyze { aoi } => {
            let geometry: geojson::Geometry = read_json(&aoi)?;
            let service = config.sjs_client(client);
            serde_json::to_value(run_analyze(&service, &geometry, &config).await?)?
        }
        Commands::Census { histogram } => {
            let payload: HistogramPayload = read_json(&histogram)?;
            let censuses = watershed_census::nlcd_soil_census(&payload, &config.lookup)?;
            serde_json::to_value(censuses)?
        }
        Commands::Delineate {
            lat,
            lng,
            no_snapping,
            data_source,
        } => {
            let rwd = config.rwd_client(client);
            log::info!("Delineating from ({lat}, {lng}) on {data_source}");
            start_rwd_job(&rwd, (lat, lng), !no_snapping, data_source).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

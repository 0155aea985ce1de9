//! Subcommand implementations

pub mod account;
pub mod checkins;
pub mod osm;
pub mod places;

use anyhow::{Context as _, Result};
use fourmore_api_client::{ClientConfig, FourmoreClient};
use fourmore_cli::OutputFormat;
use fourmore_core::config::{Config, ConfigSchema};
use fourmore_geo::Coordinate;
use fourmore_map::{FixedLocationSource, GeolocationProvider, PositionOptions};
use fourmore_telemetry::{TelemetryConfig, TelemetryGuard};
use serde::Serialize;
use tracing::debug;

/// Everything a subcommand needs
pub struct Context {
    pub client: FourmoreClient,
    pub config: ConfigSchema,
    pub format: OutputFormat,
    _telemetry: TelemetryGuard,
}

impl Context {
    pub fn load(config_path: Option<&str>, verbose: bool, format: OutputFormat) -> Result<Self> {
        let config = Config::load(config_path)?;

        let telemetry = if verbose {
            TelemetryConfig::verbose()
        } else {
            TelemetryConfig::default().with_log_level(config.schema.telemetry.log_level.clone())
        };
        let telemetry = fourmore_telemetry::init_with_config(
            telemetry.with_log_dir(config.schema.telemetry.resolved_log_dir()),
        )?;

        let client = FourmoreClient::with_config(ClientConfig::from_settings(&config.schema.api)?)
            .context("could not create the API client")?;
        debug!(base_url = client.base_url(), config = ?config.path, "client ready");

        Ok(Self {
            client,
            config: config.schema,
            format,
            _telemetry: telemetry,
        })
    }

    pub fn is_json(&self) -> bool {
        self.format.is_json()
    }

    /// Print `value` as JSON when that format was asked for; true if printed
    pub fn emit_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool> {
        if self.is_json() {
            fourmore_cli::output::print_json(value)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Resolve a `--lat/--lon` pair through the geolocation provider
    ///
    /// Out-of-range values surface as an unavailable position.
    pub async fn locate(&self, (lat, lon): (f64, f64)) -> Result<Coordinate> {
        let provider = GeolocationProvider::new(
            FixedLocationSource::new(Coordinate::new(lat, lon)),
            PositionOptions::from_settings(&self.config.geolocation),
        );
        let location = provider
            .locate()
            .await
            .map_err(fourmore_core::Error::from)
            .with_context(|| format!("invalid location {lat},{lon}"))?;
        Ok(location)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        debug!(metrics = %fourmore_telemetry::metrics().export_json(), "session metrics");
    }
}

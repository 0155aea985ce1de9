//! Configuration schema definitions
//!
//! Every field carries a serde default so a partial (or empty) TOML file is
//! always valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub map: MapSettings,

    #[serde(default)]
    pub geolocation: GeolocationSettings,

    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the FourMore backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_api_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

/// Search tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Minimum characters before a place suggestion fetch is issued
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,

    /// Quiet period after the last keystroke before fetching suggestions
    #[serde(default = "default_suggestion_debounce")]
    pub suggestion_debounce_ms: u64,

    /// Maximum place suggestions requested from the backend
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// Result cap for each progressive category query
    #[serde(default = "default_result_limit")]
    pub category_result_limit: usize,

    /// Result cap for viewport refetches
    #[serde(default = "default_result_limit")]
    pub viewport_result_limit: usize,

    /// Floor zoom for progressive search
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,

    /// Street-level starting zoom for progressive search
    #[serde(default = "default_street_zoom")]
    pub street_zoom: f64,

    /// Start category searches at the current zoom when it is closer in
    #[serde(default)]
    pub prefer_viewport_zoom: bool,

    /// Maximum category suggestions shown while typing
    #[serde(default = "default_category_cap")]
    pub category_suggestion_cap: usize,

    /// Radius in meters used to bias place suggestions around the user
    #[serde(default = "default_suggestion_radius")]
    pub suggestion_radius_m: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_query_length: default_min_query_length(),
            suggestion_debounce_ms: default_suggestion_debounce(),
            suggestion_limit: default_suggestion_limit(),
            category_result_limit: default_result_limit(),
            viewport_result_limit: default_result_limit(),
            min_zoom: default_min_zoom(),
            street_zoom: default_street_zoom(),
            prefer_viewport_zoom: false,
            category_suggestion_cap: default_category_cap(),
            suggestion_radius_m: default_suggestion_radius(),
        }
    }
}

fn default_min_query_length() -> usize {
    3
}

fn default_suggestion_debounce() -> u64 {
    300
}

fn default_suggestion_limit() -> usize {
    10
}

fn default_result_limit() -> usize {
    100
}

fn default_min_zoom() -> f64 {
    12.0
}

fn default_street_zoom() -> f64 {
    17.0
}

fn default_category_cap() -> usize {
    6
}

fn default_suggestion_radius() -> u32 {
    5000
}

/// Fit-to-bounds padding in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddingSettings {
    #[serde(default = "default_padding_top")]
    pub top: f64,
    #[serde(default = "default_padding_bottom")]
    pub bottom: f64,
    #[serde(default = "default_padding_side")]
    pub left: f64,
    #[serde(default = "default_padding_side")]
    pub right: f64,
}

impl Default for PaddingSettings {
    fn default() -> Self {
        Self {
            top: default_padding_top(),
            bottom: default_padding_bottom(),
            left: default_padding_side(),
            right: default_padding_side(),
        }
    }
}

fn default_padding_top() -> f64 {
    96.0
}

fn default_padding_bottom() -> f64 {
    200.0
}

fn default_padding_side() -> f64 {
    48.0
}

/// Map view behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSettings {
    /// Quiet period after a pan before refetching the viewport
    #[serde(default = "default_refetch_debounce")]
    pub refetch_debounce_ms: u64,

    /// Displacement in degrees that counts as "the map moved"
    #[serde(default = "default_move_threshold")]
    pub move_threshold_deg: f64,

    /// Safety-net timeout for a programmatic move that never settles
    #[serde(default = "default_settle_timeout")]
    pub settle_timeout_ms: u64,

    /// Below this many visible results the "search here" affordance shows
    #[serde(default = "default_sparse_threshold")]
    pub sparse_result_threshold: usize,

    #[serde(default = "default_viewport_width")]
    pub viewport_width_px: f64,

    #[serde(default = "default_viewport_height")]
    pub viewport_height_px: f64,

    /// Height of the results drawer covering the bottom of the map
    #[serde(default = "default_drawer_height")]
    pub drawer_height_px: f64,

    #[serde(default)]
    pub padding: PaddingSettings,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            refetch_debounce_ms: default_refetch_debounce(),
            move_threshold_deg: default_move_threshold(),
            settle_timeout_ms: default_settle_timeout(),
            sparse_result_threshold: default_sparse_threshold(),
            viewport_width_px: default_viewport_width(),
            viewport_height_px: default_viewport_height(),
            drawer_height_px: default_drawer_height(),
            padding: PaddingSettings::default(),
        }
    }
}

fn default_refetch_debounce() -> u64 {
    400
}

fn default_move_threshold() -> f64 {
    0.002
}

fn default_settle_timeout() -> u64 {
    700
}

fn default_sparse_threshold() -> usize {
    10
}

fn default_viewport_width() -> f64 {
    390.0
}

fn default_viewport_height() -> f64 {
    844.0
}

fn default_drawer_height() -> f64 {
    320.0
}

/// One-shot position request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationSettings {
    #[serde(default = "default_geo_timeout")]
    pub timeout_secs: u64,

    /// Oldest cached fix accepted on the first request
    #[serde(default = "default_maximum_age")]
    pub maximum_age_secs: u64,

    #[serde(default = "default_true")]
    pub high_accuracy: bool,
}

impl Default for GeolocationSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_geo_timeout(),
            maximum_age_secs: default_maximum_age(),
            high_accuracy: true,
        }
    }
}

fn default_geo_timeout() -> u64 {
    10
}

fn default_maximum_age() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySettings {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory for daily-rolling log files; `~` and `$VARS` are expanded
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TelemetrySettings {
    /// The log directory with `~` and environment variables expanded.
    pub fn resolved_log_dir(&self) -> Option<PathBuf> {
        let dir = self.log_dir.as_deref()?;
        let expanded = shellexpand::full(dir).map_or_else(|_| dir.to_string(), |s| s.into_owned());
        Some(PathBuf::from(expanded))
    }
}

//! Logging, metrics, and timers for the FourMore client
//!
//! - Structured logging with tracing, optionally mirrored to daily log files
//! - In-process counters, gauges and histograms
//! - Duration timers feeding the histograms
//! - A JSON snapshot of everything recorded, logged when a command ends

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global metrics registry
static METRICS: Lazy<MetricsRegistry> = Lazy::new(MetricsRegistry::new);

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Well-known metric names recorded by the search and map layers
pub mod names {
    pub const CATEGORY_SEARCH_QUERIES: &str = "search.category.queries";
    pub const CATEGORY_SEARCH_ZOOM_STEPS: &str = "search.category.zoom_steps";
    pub const CATEGORY_SEARCH_DURATION: &str = "search.category.duration_ms";
    pub const SUGGESTION_FETCHES: &str = "search.suggestions.fetches";
    pub const STALE_RESPONSES_DISCARDED: &str = "responses.stale_discarded";
    pub const VIEWPORT_REFETCHES: &str = "map.viewport.refetches";
    pub const PROGRAMMATIC_MOVES: &str = "map.programmatic_moves";
    pub const SETTLE_TIMEOUTS: &str = "map.settle_timeouts";
    pub const VISIBLE_POIS: &str = "map.visible_pois";
}

/// Telemetry setup failure
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to set tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Failed to create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Keeps the background log writer alive; dropping it flushes pending lines.
#[must_use = "dropping the guard stops file logging"]
pub struct TelemetryGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Install the global subscriber: stderr output plus an optional daily log file
///
/// `RUST_LOG` overrides `config.log_level` when set.
pub fn init_with_config(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let console = fmt::layer()
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number)
        .with_writer(std::io::stderr)
        .compact();

    let (file_layer, file_writer) = match config.log_dir {
        Some(ref dir) => {
            std::fs::create_dir_all(dir).map_err(|source| TelemetryError::LogDir {
                path: dir.clone(),
                source,
            })?;
            let appender = tracing_appender::rolling::daily(dir, "fourmore.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        log_dir = ?config.log_dir,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        _file_writer: file_writer,
    })
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub show_target: bool,
    pub show_thread_ids: bool,
    pub show_file: bool,
    pub show_line_number: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

impl TelemetryConfig {
    /// Verbose console output with targets, for `--verbose`
    pub fn verbose() -> Self {
        Self {
            log_level: "debug".to_string(),
            show_target: true,
            ..Self::default()
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.log_dir = dir;
        self
    }
}

/// In-process metrics, keyed by the constants in [`names`]
///
/// One lock guards everything; recording is a map lookup and an add, and
/// snapshots come out sorted by name.
pub struct MetricsRegistry {
    state: Mutex<MetricState>,
    start_time: Instant,
}

#[derive(Default)]
struct MetricState {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, u64>,
    histograms: BTreeMap<String, Vec<f64>>,
}

impl MetricsRegistry {
    fn new() -> Self {
        Self {
            state: Mutex::new(MetricState::default()),
            start_time: Instant::now(),
        }
    }

    fn state(&self) -> MutexGuard<'_, MetricState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add one to a counter
    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    pub fn increment_by(&self, name: &str, value: u64) {
        let mut state = self.state();
        let counter = state.counters.entry(name.to_string()).or_default();
        *counter = counter.saturating_add(value);
    }

    /// Current value of a counter (zero if never incremented)
    pub fn counter(&self, name: &str) -> u64 {
        self.state().counters.get(name).copied().unwrap_or(0)
    }

    /// Overwrite a gauge
    pub fn gauge(&self, name: &str, value: u64) {
        self.state().gauges.insert(name.to_string(), value);
    }

    /// Last value written to a gauge
    pub fn gauge_value(&self, name: &str) -> Option<u64> {
        self.state().gauges.get(name).copied()
    }

    /// Record one histogram sample
    pub fn histogram(&self, name: &str, value: f64) {
        self.state().histograms.entry(name.to_string()).or_default().push(value);
    }

    /// Summary of a histogram's samples so far
    pub fn histogram_stats(&self, name: &str) -> Option<HistogramStats> {
        self.state().histograms.get(name).map(|values| HistogramStats::from_values(values))
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Snapshot of every counter, gauge and histogram
    pub fn export_json(&self) -> serde_json::Value {
        let state = self.state();
        let histograms: BTreeMap<&str, HistogramStats> = state
            .histograms
            .iter()
            .map(|(name, values)| (name.as_str(), HistogramStats::from_values(values)))
            .collect();

        serde_json::json!({
            "session_id": session_id(),
            "uptime_secs": self.uptime_secs(),
            "counters": state.counters,
            "gauges": state.gauges,
            "histograms": histograms,
        })
    }
}

/// Count, range, mean and median of a histogram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl HistogramStats {
    fn from_values(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
            return Self { count: 0, min: 0.0, max: 0.0, mean: 0.0, median: 0.0 };
        };
        let count = sorted.len();
        Self {
            count,
            min,
            max,
            mean: sorted.iter().sum::<f64>() / count as f64,
            median: sorted[count / 2],
        }
    }
}

/// Get the global metrics registry
pub fn metrics() -> &'static MetricsRegistry {
    &METRICS
}

/// Timer for measuring operation duration
///
/// Records into the named histogram exactly once, on `stop` or on drop.
pub struct Timer {
    name: String,
    start: Instant,
    recorded: bool,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let duration = self.start.elapsed();
        if !self.recorded {
            self.recorded = true;
            metrics().histogram(&self.name, duration.as_secs_f64() * 1000.0);
            tracing::debug!(
                metric = %self.name,
                duration_ms = duration.as_millis(),
                "Timer completed"
            );
        }
        duration
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.record();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let registry = MetricsRegistry::new();
        registry.increment(names::SUGGESTION_FETCHES);
        registry.increment(names::SUGGESTION_FETCHES);
        registry.increment_by(names::SUGGESTION_FETCHES, 3);

        assert_eq!(registry.counter(names::SUGGESTION_FETCHES), 5);
        assert_eq!(registry.counter(names::VIEWPORT_REFETCHES), 0);
    }

    #[test]
    fn test_gauge_keeps_last_value() {
        let registry = MetricsRegistry::new();
        registry.gauge(names::VISIBLE_POIS, 42);
        registry.gauge(names::VISIBLE_POIS, 7);

        assert_eq!(registry.gauge_value(names::VISIBLE_POIS), Some(7));
        assert_eq!(registry.gauge_value(names::PROGRAMMATIC_MOVES), None);
    }

    #[test]
    fn test_histogram_stats() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let stats = HistogramStats::from_values(&values);

        assert_eq!(stats.count, 10);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert_eq!(stats.mean, 5.5);
        assert_eq!(stats.median, 6.0);
        assert_eq!(HistogramStats::from_values(&[]).count, 0);
    }

    #[test]
    fn test_timer_records_once() {
        let name = "test.timer_records_once";
        let timer = Timer::start(name);
        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.stop();
        assert!(duration.as_millis() >= 10);

        let stats = metrics().histogram_stats(name).unwrap();
        assert_eq!(stats.count, 1);
        assert!(stats.min >= 10.0);
    }

    #[test]
    fn test_export_json() {
        let registry = MetricsRegistry::new();
        registry.increment(names::PROGRAMMATIC_MOVES);
        registry.histogram(names::CATEGORY_SEARCH_DURATION, 12.5);

        let json = registry.export_json();
        assert_eq!(json["counters"][names::PROGRAMMATIC_MOVES], 1);
        assert_eq!(json["histograms"][names::CATEGORY_SEARCH_DURATION]["count"], 1);
        assert_eq!(json["session_id"], session_id());
    }

    #[test]
    fn test_unusable_log_dir_reported() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let dir = file.path().join("logs");

        let result = init_with_config(TelemetryConfig::default().with_log_dir(Some(dir.clone())));
        assert!(matches!(result, Err(TelemetryError::LogDir { ref path, .. }) if *path == dir));
    }

    #[test]
    fn test_log_dir_created_on_init() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("logs");

        let guard = init_with_config(TelemetryConfig::default().with_log_dir(Some(dir.clone())));
        assert!(guard.is_ok());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_session_id_is_a_uuid() {
        assert!(Uuid::parse_str(session_id()).is_ok());
    }
}

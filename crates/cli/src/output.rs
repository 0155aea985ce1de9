//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use clap::ValueEnum;
use fourmore_api_client::Poi;
use fourmore_geo::format_distance;
use owo_colors::OwoColorize;
use serde::Serialize;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable lines
    #[default]
    Text,
    /// One pretty-printed JSON document on stdout
    Json,
}

impl OutputFormat {
    /// True for JSON output, where decorations must stay off stdout
    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print a subheader
    pub fn subheader(message: &str) {
        println!();
        println!("{}", message.bold().dimmed());
    }

    /// Print a dimmed `label: value` line
    pub fn field(label: &str, value: &str) {
        println!("  {} {}", format!("{label}:").dimmed(), value);
    }
}

/// Print `value` as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line summary of a place: name, class, distance and key
pub fn poi_line(poi: &Poi) -> String {
    let mut line = format!("{} {}", poi.display_name().bold(), format!("({})", poi.class).dimmed());
    if let Some(distance) = poi.distance {
        line.push_str(&format!(" · {}", format_distance(distance)));
    }
    if poi.is_checked_in() {
        line.push_str(&format!(" {}", "checked in".green()));
    }
    line.push_str(&format!("  {}", poi.key().to_string().dimmed()));
    line
}

/// Print a numbered list of places, or an empty-state line
pub fn print_pois(pois: &[Poi], empty_message: &str) {
    if pois.is_empty() {
        Status::info(empty_message);
        return;
    }
    for (index, poi) in pois.iter().enumerate() {
        println!("{:>3}. {}", index + 1, poi_line(poi));
    }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fourmore_api_client::OsmType;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn cafe() -> Poi {
        Poi {
            osm_type: OsmType::Node,
            osm_id: 42,
            name: Some("Joe's Coffee".to_string()),
            class: "cafe".to_string(),
            lat: 40.0,
            lon: -74.0,
            address: None,
            phone: None,
            website: None,
            opening_hours: None,
            tags: BTreeMap::new(),
            version: None,
            timestamp: None,
            distance: Some(1250.0),
            is_checked_in: None,
        }
    }

    #[test]
    fn test_format_duration_ms() {
        let d = Duration::from_millis(500);
        assert_eq!(format_duration(d), "500ms");
    }

    #[test]
    fn test_format_duration_secs() {
        let d = Duration::from_secs_f32(5.5);
        assert_eq!(format_duration(d), "5.5s");
    }

    #[test]
    fn test_format_count_singular() {
        assert_eq!(format_count(1, "place", "places"), "1 place");
    }

    #[test]
    fn test_format_count_plural() {
        assert_eq!(format_count(5, "place", "places"), "5 places");
    }

    #[test]
    fn test_poi_line_mentions_name_distance_and_key() {
        let line = poi_line(&cafe());
        assert!(line.contains("Joe's Coffee"));
        assert!(line.contains("1.2km") || line.contains("1.3km"));
        assert!(line.contains("node:42"));
    }

    #[test]
    fn test_output_format_parses_from_flag() {
        assert_eq!(OutputFormat::from_str("json", true), Ok(OutputFormat::Json));
        assert!(OutputFormat::Json.is_json());
        assert!(!OutputFormat::default().is_json());
    }
}

//! Distance formatting for result lists.

/// Format a distance in meters for display.
///
/// Distances that round to under 1000 m are shown in whole meters, otherwise
/// in kilometers with one decimal.
///
/// ```
/// use fourmore_geo::format_distance;
///
/// assert_eq!(format_distance(412.6), "413m");
/// assert_eq!(format_distance(1530.0), "1.5km");
/// ```
pub fn format_distance(meters: f64) -> String {
    let whole = meters.round();
    if whole < 1000.0 {
        format!("{}m", whole as i64)
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}

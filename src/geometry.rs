//! Point geometry read from PostGIS text output

use geo_types::Point;
use thiserror::Error;
use wkt::TryFromWkt;

/// Reasons a geometry string is not a usable point
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryParseError {
    #[error("invalid point '{text}': {message}")]
    Invalid { text: String, message: String },

    #[error("unexpected text after point in '{0}'")]
    TrailingText(String),

    #[error("point has non-finite coordinates ({x}, {y})")]
    NonFinite { x: f64, y: f64 },
}

/// Parse a WKT point such as `POINT(-105.2 39.7)` or `POINT Z (1 2 3)`.
/// Z and M ordinates are dropped; empty points and other geometry types
/// are rejected.
pub fn parse_point(text: &str) -> Result<Point<f64>, GeometryParseError> {
    let text = text.trim();
    let point =
        Point::<f64>::try_from_wkt_str(text).map_err(|e| GeometryParseError::Invalid {
            text: text.to_string(),
            message: e.to_string(),
        })?;

    if !text.ends_with(')') || text.matches(')').count() != 1 {
        return Err(GeometryParseError::TrailingText(text.to_string()));
    }
    if !point.x().is_finite() || !point.y().is_finite() {
        return Err(GeometryParseError::NonFinite {
            x: point.x(),
            y: point.y(),
        });
    }
    Ok(point)
}

/// WKT for a 2D point in the `POINT (x y)` form used by the lookup file
pub fn format_point(point: &Point<f64>) -> String {
    format!("POINT ({} {})", point.x(), point.y())
}

//! Simulator position line parsing.
//!
//! The simulator's main server streams newline-terminated `Qxxx=value` lines.
//! Only the aircraft state line is of interest:
//!
//! ```text
//! Qs121=pitch;bank;heading;altitude;tas;latitude;longitude
//! ```
//!
//! Angles are radians. Trailing fields beyond longitude are ignored.

use std::f64::consts::PI;

use tracing::trace;

use super::CurrentPose;
use crate::coord::MAX_LATITUDE;

/// Variable tag of the aircraft state line.
pub const POSITION_TAG: &str = "Qs121=";

const HEADING_FIELD: usize = 2;
const LATITUDE_FIELD: usize = 5;
const LONGITUDE_FIELD: usize = 6;

/// Parses a telemetry line into a pose.
///
/// Returns `None` for lines that are not position lines, that carry fewer
/// than seven numeric fields, or whose position lies off the Mercator grid.
pub fn parse_position_line(line: &str) -> Option<CurrentPose> {
    let start = line.find(POSITION_TAG)? + POSITION_TAG.len();
    let fields: Vec<&str> = line[start..].trim_end().split(';').collect();

    if fields.len() <= LONGITUDE_FIELD {
        trace!("Position line too short: {} fields", fields.len());
        return None;
    }

    let field = |index: usize| fields[index].trim().parse::<f64>().ok();

    let pose = CurrentPose {
        latitude: field(LATITUDE_FIELD)?,
        longitude: field(LONGITUDE_FIELD)?,
        heading: field(HEADING_FIELD)?,
    };

    if !pose.heading.is_finite()
        || !pose.latitude.is_finite()
        || !pose.longitude.is_finite()
        || pose.latitude.abs() > MAX_LATITUDE
        || pose.longitude.abs() > PI
    {
        trace!(?pose, "Position out of range");
        return None;
    }
    Some(pose)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_line() {
        let line = "Qs121=0.0123;-0.0045;1.5708;35000;450;0.93462;0.17436";
        let pose = parse_position_line(line).expect("valid line");

        assert_eq!(pose.heading, 1.5708);
        assert_eq!(pose.latitude, 0.93462);
        assert_eq!(pose.longitude, 0.17436);
    }

    #[test]
    fn test_parse_ignores_trailing_fields_and_whitespace() {
        let line = "Qs121=0;0;3.0;1000;120;-0.5;2.0;extra;fields\r";
        let pose = parse_position_line(line).expect("valid line");

        assert_eq!(pose.heading, 3.0);
        assert_eq!(pose.latitude, -0.5);
        assert_eq!(pose.longitude, 2.0);
    }

    #[test]
    fn test_parse_other_variables_returns_none() {
        assert!(parse_position_line("Qs122=1;2;3;4;5;6;7").is_none());
        assert!(parse_position_line("").is_none());
    }

    #[test]
    fn test_parse_short_line_returns_none() {
        assert!(parse_position_line("Qs121=0;0;1.0;1000;120;0.5").is_none());
    }

    #[test]
    fn test_parse_non_numeric_returns_none() {
        assert!(parse_position_line("Qs121=0;0;north;1000;120;0.5;0.1").is_none());
        assert!(parse_position_line("Qs121=0;0;1.0;1000;120;;0.1").is_none());
    }

    #[test]
    fn test_parse_rejects_non_finite_values() {
        assert!(parse_position_line("Qs121=0;0;0;0;0;NaN;0.1").is_none());
        assert!(parse_position_line("Qs121=0;0;0;0;0;0.5;inf").is_none());
        assert!(parse_position_line("Qs121=0;0;-inf;0;0;0.5;0.1").is_none());
    }

    #[test]
    fn test_parse_rejects_positions_off_the_grid() {
        assert!(parse_position_line("Qs121=0;0;0;0;0;0.5;1e300").is_none());
        assert!(parse_position_line("Qs121=0;0;0;0;0;0.5;3.2").is_none());
        assert!(parse_position_line("Qs121=0;0;0;0;0;1.5;0.1").is_none());
        assert!(parse_position_line("Qs121=0;0;0;0;0;-1.5;0.1").is_none());

        let edge = parse_position_line("Qs121=0;0;0;0;0;1.48;-3.14").expect("inside the grid");
        assert_eq!(edge.latitude, 1.48);
        assert_eq!(edge.longitude, -3.14);
    }
}

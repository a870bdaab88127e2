use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `48 deg 51' 29.50" N` as printed by exiftool.
static COORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^\s*(?P<deg>\d+(?:\.\d+)?)\s*deg\s*(?P<min>\d+(?:\.\d+)?)\s*'\s*(?P<sec>\d+(?:\.\d+)?)\s*"\s*(?P<dir>[NESW])\s*$"#,
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn hemisphere(self, negative: bool) -> char {
        match (self, negative) {
            (Axis::Latitude, false) => 'N',
            (Axis::Latitude, true) => 'S',
            (Axis::Longitude, false) => 'E',
            (Axis::Longitude, true) => 'W',
        }
    }
}

/// Signed decimal latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for GpsPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

impl FromStr for GpsPosition {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s.split_once(',').unwrap_or((s, ""));
        Ok(Self {
            latitude: lat.trim().parse()?,
            longitude: lon.trim().parse()?,
        })
    }
}

fn parse_signed(raw: &str) -> Option<(f64, Axis)> {
    let caps = COORD_RE.captures(raw)?;
    let deg: f64 = caps["deg"].parse().ok()?;
    let min: f64 = caps["min"].parse().ok()?;
    let sec: f64 = caps["sec"].parse().ok()?;

    let (axis, negative) = match caps["dir"].to_ascii_uppercase().as_str() {
        "N" => (Axis::Latitude, false),
        "S" => (Axis::Latitude, true),
        "E" => (Axis::Longitude, false),
        "W" => (Axis::Longitude, true),
        _ => return None,
    };

    let magnitude = deg + min / 60.0 + sec / 3600.0;
    let sign = if negative { -1.0 } else { 1.0 };
    Some((sign * magnitude, axis))
}

/// Convert one sexagesimal coordinate to signed decimal degrees.
/// South and west are negative. `None` if the string doesn't match.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    parse_signed(raw).map(|(value, _)| value)
}

/// Convert a combined `<lat>, <lon>` position string.
pub fn parse_position(raw: &str) -> Option<GpsPosition> {
    let (lat, lon) = raw.split_once(',')?;
    match (parse_signed(lat)?, parse_signed(lon)?) {
        ((latitude, Axis::Latitude), (longitude, Axis::Longitude)) => {
            Some(GpsPosition { latitude, longitude })
        }
        _ => None,
    }
}

/// Render decimal degrees the way exiftool prints them, to 1/100 arc-second.
pub fn to_sexagesimal(decimal: f64, axis: Axis) -> String {
    let hundredths = (decimal.abs() * 360_000.0).round() as u64;
    let deg = hundredths / 360_000;
    let min = (hundredths % 360_000) / 6_000;
    let sec = (hundredths % 6_000) as f64 / 100.0;
    format!(
        "{} deg {}' {:.2}\" {}",
        deg,
        min,
        sec,
        axis.hemisphere(decimal < 0.0)
    )
}

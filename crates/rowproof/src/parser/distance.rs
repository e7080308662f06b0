use std::sync::LazyLock;

use regex::Regex;

use super::duration::max_candidate;
use super::number::parse_number;

pub const KM_PER_MILE: f64 = 1.60934;

/// Bare meter readings below this are splits or intervals, not workout distances.
pub const MIN_METERS: f64 = 400.0;

static RE_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bdistance\s*[:\-]?\s*([0-9][0-9.,]*)\s*(km|kilometers?|kilometres?|mi|miles?|m|k)\b",
    )
    .unwrap()
});
static RE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(km|kilometers?|kilometres?|mi|miles?|k)\b").unwrap()
});
static RE_METERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{3,6})\s*m\b").unwrap());

/// Extracts the workout distance in kilometres, taking the largest candidate.
pub fn parse_distance_km(text: &str) -> Option<f64> {
    let mut candidates: Vec<f64> = Vec::new();

    if let Some(caps) = RE_LABELED.captures(text) {
        let value = caps.get(1).and_then(|m| parse_number(m.as_str()));
        let unit = caps.get(2).map(|m| m.as_str());
        if let (Some(value), Some(unit)) = (value, unit) {
            candidates.push(to_km(value, unit));
        }
    }

    for caps in RE_UNIT.captures_iter(text) {
        let value = caps.get(1).and_then(|m| parse_number(m.as_str()));
        let unit = caps.get(2).map(|m| m.as_str());
        if let (Some(value), Some(unit)) = (value, unit) {
            candidates.push(to_km(value, unit));
        }
    }

    for caps in RE_METERS.captures_iter(text) {
        if let Some(meters) = caps.get(1).and_then(|m| parse_number(m.as_str())) {
            if meters >= MIN_METERS {
                candidates.push(meters / 1000.0);
            }
        }
    }

    candidates.into_iter().fold(None, max_candidate)
}

fn to_km(value: f64, unit: &str) -> f64 {
    let unit = unit.to_ascii_lowercase();
    if unit == "m" {
        value / 1000.0
    } else if unit.starts_with("mi") {
        value * KM_PER_MILE
    } else {
        value
    }
}

//! Ergometer console ("Concept2"-style PM summary screen) extraction.
//!
//! Console summaries print a `total time` token and a table headed by
//! `meters`. The generic parsers tend to pick up split rows from that table,
//! so this mode reads the layout directly.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::date::parse_date;
use super::duration::{parse_duration_minutes, round_minutes};
use super::heart_rate::parse_avg_hr;
use super::distance::MIN_METERS;

/// Lines after the `meters` header that may hold the table values.
const TABLE_SCAN_LINES: usize = 7;

static RE_DETECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)concept\s*2|pm5|view detail|total time").unwrap());
static RE_TOTAL_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)total\s*time[^0-9]{0,6}(\d{1,2}:\d{2}(?::\d{2})?(?:[.,]\d)?)").unwrap()
});
static RE_METER_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)meter").unwrap());
static RE_TABLE_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4,6}\b").unwrap());

/// Fields read from an equipment summary screen. Each is independently optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquipmentFields {
    pub date: Option<NaiveDate>,
    pub minutes: Option<u32>,
    pub distance_km: Option<f64>,
    pub avg_hr: Option<u32>,
}

pub fn detect_equipment_screen(raw: &str) -> bool {
    RE_DETECT.is_match(raw)
}

/// Runs equipment-mode extraction, or returns `None` when the text is not a console screen.
pub fn extract_equipment_fields(raw: &str, today: NaiveDate) -> Option<EquipmentFields> {
    if !detect_equipment_screen(raw) {
        return None;
    }

    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let joined = lines.join(" ");

    Some(EquipmentFields {
        date: parse_date(&joined, today),
        minutes: parse_total_time_minutes(&joined),
        distance_km: parse_table_meters(&lines).map(|meters| meters as f64 / 1000.0),
        avg_hr: parse_avg_hr(&joined),
    })
}

/// Reads the `total time` token: `MM:SS[.f]` or `H:MM:SS[.f]`.
pub fn parse_total_time_minutes(text: &str) -> Option<u32> {
    let caps = RE_TOTAL_TIME.captures(text)?;
    round_minutes(parse_duration_minutes(caps.get(1)?.as_str()))
}

/// Largest 4–6 digit value within the lines following the `meters` header.
pub fn parse_table_meters(lines: &[&str]) -> Option<u64> {
    let header = lines.iter().position(|line| RE_METER_HEADER.is_match(line))?;

    lines
        .iter()
        .skip(header + 1)
        .take(TABLE_SCAN_LINES)
        .flat_map(|line| RE_TABLE_VALUE.find_iter(line))
        .filter_map(|m| m.as_str().parse::<u64>().ok())
        .filter(|meters| *meters as f64 >= MIN_METERS)
        .max()
}

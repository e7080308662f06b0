//! Heuristic extraction of workout fields from recognized screen text.
//!
//! Every sub-parser is a pure function over the text. The generic parsers run
//! on whitespace-normalized text; when the text looks like an ergometer console
//! summary, the equipment parser runs on the original lines and its non-empty
//! fields take precedence one by one.

pub mod date;
pub mod distance;
pub mod duration;
pub mod equipment;
pub mod heart_rate;
pub mod number;

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use date::{parse_date, parse_date_value, to_utc_midnight};
pub use distance::parse_distance_km;
pub use duration::{parse_duration_minutes, parse_minutes};
pub use equipment::{detect_equipment_screen, extract_equipment_fields, EquipmentFields};
pub use heart_rate::{is_plausible_heart_rate, parse_avg_hr};
pub use number::parse_number;

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Structured fields pulled from a proof image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    /// Calendar date as a UTC midnight instant.
    pub date: Option<DateTime<Utc>>,
    pub minutes: Option<u32>,
    pub distance_km: Option<f64>,
    pub avg_hr: Option<u32>,
    /// Never parsed from text; reserved for recognizers that classify the activity.
    pub activity_type: Option<String>,
}

impl ExtractedFields {
    /// At least one field was extracted.
    pub fn has_any(&self) -> bool {
        self.date.is_some()
            || self.minutes.is_some()
            || self.distance_km.is_some()
            || self.avg_hr.is_some()
    }

    /// Date, duration and distance are all present.
    pub fn has_required(&self) -> bool {
        self.date.is_some() && self.minutes.is_some() && self.distance_km.is_some()
    }
}

/// Result of parsing one block of recognized text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofTextExtraction {
    pub fields: ExtractedFields,
    pub has_any: bool,
    pub has_required: bool,
    /// Whether the equipment console layout was detected.
    pub equipment_mode: bool,
}

impl From<ExtractedFields> for ProofTextExtraction {
    fn from(fields: ExtractedFields) -> Self {
        Self {
            has_any: fields.has_any(),
            has_required: fields.has_required(),
            fields,
            equipment_mode: false,
        }
    }
}

/// Parses raw recognized text into [`ExtractedFields`].
///
/// `today` anchors relative and yearless dates. Never fails: unparseable
/// input yields an extraction with every field empty.
pub fn extract_proof_fields(raw: &str, today: NaiveDate) -> ProofTextExtraction {
    let normalized = RE_WHITESPACE.replace_all(raw, " ");
    let normalized = normalized.trim();

    let mut date = parse_date(normalized, today);
    let mut minutes = parse_minutes(normalized);
    let mut distance_km = parse_distance_km(normalized);
    let mut avg_hr = parse_avg_hr(normalized);

    let equipment = extract_equipment_fields(raw, today);
    if let Some(eq) = &equipment {
        date = eq.date.or(date);
        minutes = eq.minutes.or(minutes);
        distance_km = eq.distance_km.or(distance_km);
        avg_hr = eq.avg_hr.or(avg_hr);
    }

    let fields = ExtractedFields {
        date: date.map(to_utc_midnight),
        minutes,
        distance_km,
        avg_hr,
        activity_type: None,
    };

    ProofTextExtraction {
        equipment_mode: equipment.is_some(),
        ..ProofTextExtraction::from(fields)
    }
}

/// [`extract_proof_fields`] anchored on the current UTC date.
pub fn extract_proof_fields_now(raw: &str) -> ProofTextExtraction {
    extract_proof_fields(raw, Utc::now().date_naive())
}

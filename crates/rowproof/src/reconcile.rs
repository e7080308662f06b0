//! Comparison of extracted proof fields against the athlete's manual entry.
//!
//! Auto-verification is a strict conjunction: date, minutes and distance must
//! be extracted, minutes must match exactly, distance must match after
//! truncation to one decimal, the calendar day (UTC) must agree, and heart
//! rate must match whenever the athlete recorded one.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::parser::ExtractedFields;
use crate::status::ValidationStatus;

/// Outcome of comparing one optional extracted value with the manual one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldComparison {
    pub matches: bool,
    /// The extracted value was absent, so the field cannot block on its own.
    pub extraction_incomplete: bool,
    pub normalized_proof_value: Option<f64>,
}

/// The athlete-entered values a proof is checked against.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualEntry {
    pub date: DateTime<Utc>,
    pub minutes: u32,
    pub distance_km: f64,
    pub avg_hr: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationVerdict {
    pub has_any: bool,
    pub has_required: bool,
    pub auto_verified: bool,
}

impl ReconciliationVerdict {
    /// Withdraws auto-verification when the recognizer's confidence is below `min`.
    ///
    /// A missing confidence (raw OCR text) is not gated.
    pub fn with_confidence_floor(mut self, confidence: Option<f64>, min: Option<f64>) -> Self {
        if let (Some(confidence), Some(min)) = (confidence, min) {
            if confidence < min {
                self.auto_verified = false;
            }
        }
        self
    }

    pub fn validation_status(&self) -> ValidationStatus {
        resolve_validation_status(self.has_required, self.auto_verified)
    }
}

/// Compares a manual value with an optional extracted one, normalizing the extracted side first.
pub fn compare_optional_number<F>(
    manual: Option<f64>,
    proof: Option<f64>,
    normalizer: Option<F>,
) -> FieldComparison
where
    F: Fn(f64) -> f64,
{
    let Some(proof) = proof else {
        return FieldComparison {
            matches: true,
            extraction_incomplete: true,
            normalized_proof_value: None,
        };
    };

    let normalized = match normalizer {
        Some(normalize) => normalize(proof),
        None => proof,
    };

    FieldComparison {
        matches: manual == Some(normalized),
        extraction_incomplete: false,
        normalized_proof_value: Some(normalized),
    }
}

/// Truncates (never rounds) a distance to one decimal place.
pub fn truncate_distance_km(km: f64) -> f64 {
    (km * 10.0).floor() / 10.0
}

pub fn compare_distance_km(manual_km: f64, proof_km: Option<f64>) -> FieldComparison {
    compare_optional_number(Some(manual_km), proof_km, Some(truncate_distance_km))
}

pub fn compare_average_hr(manual_hr: Option<u32>, proof_hr: Option<u32>) -> FieldComparison {
    compare_optional_number::<fn(f64) -> f64>(
        manual_hr.map(f64::from),
        proof_hr.map(f64::from),
        None,
    )
}

/// Decides whether the extraction agrees with the manual entry closely enough to skip review.
pub fn should_auto_verify_proof(entry: Option<&ManualEntry>, extracted: &ExtractedFields) -> bool {
    let Some(entry) = entry else {
        return false;
    };
    let (Some(date), Some(minutes), Some(distance_km)) =
        (extracted.date, extracted.minutes, extracted.distance_km)
    else {
        return false;
    };

    let minutes_match = minutes == entry.minutes;
    let distance_match = compare_distance_km(entry.distance_km, Some(distance_km)).matches;
    let date_match = date.date_naive() == entry.date.date_naive();
    let hr_match = match entry.avg_hr {
        None => true,
        Some(_) => {
            extracted.avg_hr.is_some() && compare_average_hr(entry.avg_hr, extracted.avg_hr).matches
        }
    };

    minutes_match && distance_match && date_match && hr_match
}

pub fn resolve_validation_status(has_required: bool, auto_verified: bool) -> ValidationStatus {
    if auto_verified {
        ValidationStatus::Verified
    } else if has_required {
        ValidationStatus::Pending
    } else {
        ValidationStatus::ExtractionIncomplete
    }
}

pub fn reconcile(extracted: &ExtractedFields, entry: Option<&ManualEntry>) -> ReconciliationVerdict {
    ReconciliationVerdict {
        has_any: extracted.has_any(),
        has_required: extracted.has_required(),
        auto_verified: should_auto_verify_proof(entry, extracted),
    }
}

//! Recognizers turn proof image bytes into either raw OCR text or a
//! structured guess from a vision model.

pub mod http;
pub mod json;
pub mod tesseract;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::error::RecognizerError;
pub use http::HttpRecognizer;
pub use json::extract_json;
pub use tesseract::TesseractRecognizer;

use crate::parser::{is_plausible_heart_rate, parse_date_value, to_utc_midnight, ExtractedFields};

/// What a recognizer produced for one image.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerOutput {
    /// Field values read directly by the recognizer.
    Structured(StructuredGuess),
    /// Unstructured text that still has to go through the text parser.
    RawText(String),
}

/// Field guess as returned by a vision model. Values are unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredGuess {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub minutes: Option<f64>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub avg_hr: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl StructuredGuess {
    /// Normalizes the guess into [`ExtractedFields`], dropping implausible values.
    pub fn to_fields(&self, today: NaiveDate) -> ExtractedFields {
        let date = self
            .date
            .as_deref()
            .and_then(|raw| parse_date_value(raw, today))
            .map(to_utc_midnight);

        let minutes = self
            .minutes
            .filter(|m| m.is_finite())
            .map(f64::round)
            .filter(|m| *m >= 1.0 && *m <= u32::MAX as f64)
            .map(|m| m as u32);

        let distance_km = self.distance.filter(|d| d.is_finite() && *d >= 0.0);

        let avg_hr = self
            .avg_hr
            .filter(|hr| hr.is_finite())
            .map(f64::round)
            .filter(|hr| *hr >= 0.0 && *hr <= u32::MAX as f64)
            .map(|hr| hr as u32)
            .filter(|hr| is_plausible_heart_rate(*hr));

        ExtractedFields {
            date,
            minutes,
            distance_km,
            avg_hr,
            activity_type: None,
        }
    }
}

/// Produces text or structured fields for a proof image.
///
/// Implementations may block on I/O; callers bound them with a timeout.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<RecognizerOutput, RecognizerError>;
}

const STRUCTURED_KEYS: [&str; 4] = ["date", "minutes", "distance", "avgHr"];

/// Interprets a recognizer response body.
///
/// The body may contain prose around the JSON object. An object carrying a
/// `text` string and none of the field keys is raw text; anything else is
/// read as a [`StructuredGuess`].
pub fn parse_response(body: &str) -> Result<RecognizerOutput, RecognizerError> {
    let object = extract_json(body).ok_or_else(|| {
        RecognizerError::MalformedResponse(format!(
            "no JSON object in response: {}",
            preview(body)
        ))
    })?;

    let value: Value = serde_json::from_str(object)
        .map_err(|e| RecognizerError::MalformedResponse(e.to_string()))?;
    let map = value.as_object().ok_or_else(|| {
        RecognizerError::MalformedResponse("response is not a JSON object".to_string())
    })?;

    let has_fields = STRUCTURED_KEYS.iter().any(|key| map.contains_key(*key));
    if let (false, Some(text)) = (has_fields, map.get("text").and_then(Value::as_str)) {
        return Ok(RecognizerOutput::RawText(text.to_string()));
    }

    if !has_fields {
        return Err(RecognizerError::MalformedResponse(
            "response has neither fields nor text".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map(RecognizerOutput::Structured)
        .map_err(|e| RecognizerError::MalformedResponse(e.to_string()))
}

fn preview(body: &str) -> String {
    let mut head: String = body.chars().take(80).collect();
    if body.chars().nth(80).is_some() {
        head.push_str("...");
    }
    head
}

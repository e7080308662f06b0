//! Builders for test rows and recognizer output.

#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};

use rowproof::db::entry_repo::NewTrainingEntry;
use rowproof::StructuredGuess;

/// Builder for manually entered training sessions.
pub struct EntryBuilder {
    entry: NewTrainingEntry,
}

impl EntryBuilder {
    /// 45 minutes, 10.0 km on 2024-03-05, no heart rate.
    pub fn new() -> Self {
        Self {
            entry: NewTrainingEntry {
                proof_image_id: None,
                date: Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
                minutes: 45,
                distance_km: 10.0,
                avg_hr: None,
            },
        }
    }

    pub fn proof(mut self, proof_image_id: &str) -> Self {
        self.entry.proof_image_id = Some(proof_image_id.to_string());
        self
    }

    pub fn date(mut self, year: i32, month: u32, day: u32) -> Self {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        self.entry.date = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
        self
    }

    pub fn minutes(mut self, minutes: u32) -> Self {
        self.entry.minutes = minutes;
        self
    }

    pub fn distance_km(mut self, km: f64) -> Self {
        self.entry.distance_km = km;
        self
    }

    pub fn avg_hr(mut self, hr: u32) -> Self {
        self.entry.avg_hr = Some(hr);
        self
    }

    pub fn build(self) -> NewTrainingEntry {
        self.entry
    }
}

/// Builder for vision model guesses.
pub struct GuessBuilder {
    guess: StructuredGuess,
}

impl GuessBuilder {
    /// A confident guess matching `EntryBuilder::new()`.
    pub fn matching() -> Self {
        Self {
            guess: StructuredGuess {
                date: Some("2024-03-05".to_string()),
                minutes: Some(45.0),
                distance: Some(10.0),
                avg_hr: Some(150.0),
                confidence: Some(0.95),
                rejection_reason: None,
            },
        }
    }

    pub fn empty() -> Self {
        Self {
            guess: StructuredGuess::default(),
        }
    }

    pub fn minutes(mut self, minutes: f64) -> Self {
        self.guess.minutes = Some(minutes);
        self
    }

    pub fn no_distance(mut self) -> Self {
        self.guess.distance = None;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.guess.confidence = Some(confidence);
        self
    }

    pub fn rejection_reason(mut self, reason: &str) -> Self {
        self.guess.rejection_reason = Some(reason.to_string());
        self
    }

    pub fn build(self) -> StructuredGuess {
        self.guess
    }
}

use serde::Serialize;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::{RecognizerError, StorageError};

/// Result tag reported for one job in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    Completed,
    Failed,
    Skipped,
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Proof image not found")]
    NotFound,

    #[error("Proof image already reviewed")]
    AlreadyReviewed,

    #[error("Proof image was reviewed while extraction was running")]
    ConcurrentReviewRace,

    #[error("Proof image upload incomplete")]
    UploadIncomplete,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),

    #[error("No extractable data found")]
    NoExtractableData,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ExtractionError {
    /// Short machine-readable tag for batch results.
    pub fn reason(&self) -> &'static str {
        match self {
            ExtractionError::NotFound => "missing",
            ExtractionError::AlreadyReviewed | ExtractionError::ConcurrentReviewRace => "reviewed",
            ExtractionError::UploadIncomplete => "upload",
            ExtractionError::Storage(_) => "storage",
            ExtractionError::Recognizer(_) => "extraction_error",
            ExtractionError::NoExtractableData => "empty",
            ExtractionError::Database(_) | ExtractionError::Unexpected(_) => "error",
        }
    }

    /// True when the pipeline backed off because a human already decided.
    pub fn is_review_backoff(&self) -> bool {
        matches!(
            self,
            ExtractionError::AlreadyReviewed | ExtractionError::ConcurrentReviewRace
        )
    }

    pub fn outcome_status(&self) -> OutcomeStatus {
        if self.is_review_backoff() {
            OutcomeStatus::Skipped
        } else {
            OutcomeStatus::Failed
        }
    }

    /// Failures that point at infrastructure rather than at the proof itself.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ExtractionError::Database(_) | ExtractionError::Unexpected(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons() {
        assert_eq!(ExtractionError::NotFound.reason(), "missing");
        assert_eq!(ExtractionError::AlreadyReviewed.reason(), "reviewed");
        assert_eq!(ExtractionError::ConcurrentReviewRace.reason(), "reviewed");
        assert_eq!(ExtractionError::UploadIncomplete.reason(), "upload");
        assert_eq!(
            ExtractionError::Storage(StorageError::Timeout(30)).reason(),
            "storage"
        );
        assert_eq!(
            ExtractionError::Recognizer(RecognizerError::Timeout(60)).reason(),
            "extraction_error"
        );
        assert_eq!(ExtractionError::NoExtractableData.reason(), "empty");
        assert_eq!(
            ExtractionError::Unexpected("boom".to_string()).reason(),
            "error"
        );
    }

    #[test]
    fn test_review_backoffs_are_skipped() {
        assert_eq!(
            ExtractionError::AlreadyReviewed.outcome_status(),
            OutcomeStatus::Skipped
        );
        assert_eq!(
            ExtractionError::ConcurrentReviewRace.outcome_status(),
            OutcomeStatus::Skipped
        );
        assert_eq!(
            ExtractionError::NoExtractableData.outcome_status(),
            OutcomeStatus::Failed
        );
        assert!(!ExtractionError::UploadIncomplete.is_review_backoff());
    }

    #[test]
    fn test_outcome_status_serializes_screaming_case() {
        let json = serde_json::to_string(&OutcomeStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
    }
}

use serde::Serialize;

use super::error::{ExtractionError, OutcomeStatus};
use crate::status::ValidationStatus;

/// Options for one batch invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Overrides the configured batch size.
    pub max_jobs: Option<usize>,
}

/// Result of processing one leased job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub proof_image_id: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<ValidationStatus>,
}

impl JobOutcome {
    pub fn completed(proof_image_id: &str, validation_status: ValidationStatus) -> Self {
        Self {
            proof_image_id: proof_image_id.to_string(),
            status: OutcomeStatus::Completed,
            reason: None,
            validation_status: Some(validation_status),
        }
    }

    pub fn from_error(proof_image_id: &str, error: &ExtractionError) -> Self {
        Self {
            proof_image_id: proof_image_id.to_string(),
            status: error.outcome_status(),
            reason: Some(error.reason().to_string()),
            validation_status: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub processed: usize,
    pub results: Vec<JobOutcome>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_report_serializes_camel_case() {
        let report = BatchReport {
            processed: 2,
            results: vec![
                JobOutcome::completed("img-1", ValidationStatus::Verified),
                JobOutcome::from_error("img-2", &ExtractionError::AlreadyReviewed),
            ],
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "processed": 2,
                "results": [
                    { "proofImageId": "img-1", "status": "COMPLETED", "validationStatus": "VERIFIED" },
                    { "proofImageId": "img-2", "status": "SKIPPED", "reason": "reviewed" }
                ]
            })
        );
    }
}

//! Status vocabularies shared by the stores and the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Validation state of a proof image or training entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    NotChecked,
    Pending,
    Verified,
    Rejected,
    ExtractionIncomplete,
}

impl ValidationStatus {
    /// Statuses automated extraction is still allowed to overwrite.
    pub const PENDING_STATUSES: [ValidationStatus; 3] = [
        ValidationStatus::NotChecked,
        ValidationStatus::Pending,
        ValidationStatus::ExtractionIncomplete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::NotChecked => "NOT_CHECKED",
            ValidationStatus::Pending => "PENDING",
            ValidationStatus::Verified => "VERIFIED",
            ValidationStatus::Rejected => "REJECTED",
            ValidationStatus::ExtractionIncomplete => "EXTRACTION_INCOMPLETE",
        }
    }

    /// True when a human has already adjudicated the proof.
    pub fn is_reviewed(&self) -> bool {
        matches!(self, ValidationStatus::Verified | ValidationStatus::Rejected)
    }

    pub fn is_pending(&self) -> bool {
        Self::PENDING_STATUSES.contains(self)
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_CHECKED" => Ok(ValidationStatus::NotChecked),
            "PENDING" => Ok(ValidationStatus::Pending),
            "VERIFIED" => Ok(ValidationStatus::Verified),
            "REJECTED" => Ok(ValidationStatus::Rejected),
            "EXTRACTION_INCOMPLETE" => Ok(ValidationStatus::ExtractionIncomplete),
            other => Err(format!("Unknown validation status: {}", other)),
        }
    }
}

/// Lifecycle of an extraction job row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionStatus {
    NotChecked,
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ExtractionStatus {
    pub const ALL: [ExtractionStatus; 5] = [
        ExtractionStatus::NotChecked,
        ExtractionStatus::Pending,
        ExtractionStatus::Processing,
        ExtractionStatus::Completed,
        ExtractionStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::NotChecked => "NOT_CHECKED",
            ExtractionStatus::Pending => "PENDING",
            ExtractionStatus::Processing => "PROCESSING",
            ExtractionStatus::Completed => "COMPLETED",
            ExtractionStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_CHECKED" => Ok(ExtractionStatus::NotChecked),
            "PENDING" => Ok(ExtractionStatus::Pending),
            "PROCESSING" => Ok(ExtractionStatus::Processing),
            "COMPLETED" => Ok(ExtractionStatus::Completed),
            "FAILED" => Ok(ExtractionStatus::Failed),
            other => Err(format!("Unknown extraction status: {}", other)),
        }
    }
}

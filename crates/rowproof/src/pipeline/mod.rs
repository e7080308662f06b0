//! The extraction pipeline: turns one leased job into a validation status.
//!
//! Each job loads its proof image, backs off if a reviewer already decided,
//! downloads and recognizes the image, reconciles the fields against the
//! manual entry and persists the result under a still-pending guard.

pub mod config;
pub mod error;
pub mod report;
pub mod runner;
mod timeout;

pub use config::PipelineConfig;
pub use error::{ExtractionError, OutcomeStatus};
pub use report::{BatchOptions, BatchReport, JobOutcome};
pub use runner::ExtractionPipeline;

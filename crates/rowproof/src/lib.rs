pub mod config;
pub mod db;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod recognizer;
pub mod reconcile;
pub mod sanitize;
pub mod secrets;
pub mod status;
pub mod storage;

pub use config::{build_blob_store, build_recognizer, load_config, Config};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, RecognizerError, Result, RowproofError, StorageError};
pub use parser::{extract_proof_fields, ExtractedFields, ProofTextExtraction};
pub use pipeline::{
    BatchOptions, BatchReport, ExtractionError, ExtractionPipeline, JobOutcome, OutcomeStatus,
    PipelineConfig,
};
pub use recognizer::{Recognizer, RecognizerOutput, StructuredGuess};
pub use reconcile::{reconcile, ManualEntry, ReconciliationVerdict};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
pub use status::{ExtractionStatus, ValidationStatus};
pub use storage::BlobStore;

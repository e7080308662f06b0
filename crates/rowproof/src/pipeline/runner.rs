use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use crate::db::entry_repo::{self, TrainingEntry};
use crate::db::job_repo::{self, LeasedJob};
use crate::db::proof_repo::{self, ProofImage};
use crate::db::{Database, DatabaseError};
use crate::error::{RecognizerError, StorageError};
use crate::parser::{extract_proof_fields, ExtractedFields};
use crate::recognizer::{Recognizer, RecognizerOutput};
use crate::reconcile::reconcile;
use crate::sanitize;
use crate::status::ValidationStatus;
use crate::storage::BlobStore;

use super::config::PipelineConfig;
use super::error::ExtractionError;
use super::report::{BatchOptions, BatchReport, JobOutcome};
use super::timeout::{run_with_timeout, CallError};

/// What was read off a proof image, before reconciliation.
struct Recognized {
    fields: ExtractedFields,
    confidence: Option<f64>,
    rejection_reason: Option<String>,
    source: &'static str,
}

/// Extraction result as stored on the proof image.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredExtraction<'a> {
    #[serde(flatten)]
    fields: &'a ExtractedFields,
    rejection_reason: Option<&'a str>,
    source: &'a str,
}

/// Runs leased extraction jobs one at a time.
pub struct ExtractionPipeline {
    db: Database,
    blob_store: Arc<dyn BlobStore>,
    recognizer: Arc<dyn Recognizer>,
    config: PipelineConfig,
}

impl ExtractionPipeline {
    pub fn new(
        db: Database,
        blob_store: Arc<dyn BlobStore>,
        recognizer: Arc<dyn Recognizer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            db,
            blob_store,
            recognizer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Leases and processes up to `max_jobs` jobs sequentially.
    ///
    /// Stops early once nothing is leasable. Job failures are recorded per job;
    /// only a failure to lease aborts the batch.
    pub fn run_batch(&self, options: BatchOptions) -> Result<BatchReport, DatabaseError> {
        let max_jobs = options.max_jobs.unwrap_or(self.config.max_jobs);
        let _batch_span = info_span!("extraction_batch", max_jobs).entered();

        let mut results = Vec::new();
        while results.len() < max_jobs {
            let now = Utc::now();
            let stale_before = self.config.stale_after.map(|after| now - after);
            let Some(job) = job_repo::lease_next(&self.db, now, stale_before)? else {
                debug!("No leasable extraction job left");
                break;
            };
            results.push(self.process_job(&job));
        }

        info!(processed = results.len(), "Extraction batch finished");
        Ok(BatchReport {
            processed: results.len(),
            results,
        })
    }

    /// Processes one leased job and records its terminal state.
    ///
    /// Never panics: a panic inside the job is caught and recorded as a failure.
    pub fn process_job(&self, job: &LeasedJob) -> JobOutcome {
        let _job_span = info_span!("extraction_job",
            job_id = %job.id,
            proof_image_id = %job.proof_image_id,
            attempt = job.attempts,
        )
        .entered();

        let today = Utc::now().date_naive();
        let mut storage_path = String::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.extract(job, today, &mut storage_path)
        }))
        .unwrap_or_else(|payload| Err(ExtractionError::Unexpected(panic_message(&*payload))));

        match result {
            Ok(status) => {
                info!(validation_status = %status, "Extraction job completed");
                JobOutcome::completed(&job.proof_image_id, status)
            }
            Err(e) => {
                let message = e.to_string();
                let logged = sanitize::redact_path_in_message(&message, &storage_path);
                if e.is_review_backoff() {
                    info!(reason = e.reason(), "Backing off: {}", logged);
                } else if e.is_internal() {
                    error!(reason = e.reason(), "Extraction job failed: {}", logged);
                } else {
                    warn!(reason = e.reason(), "Extraction job failed: {}", logged);
                }

                match job_repo::mark_failed(&self.db, job, &message) {
                    Ok(true) => {}
                    Ok(false) => warn!("Lease lost before the failure could be recorded"),
                    Err(db_err) => error!("Failed to record job failure: {}", db_err),
                }
                JobOutcome::from_error(&job.proof_image_id, &e)
            }
        }
    }

    fn extract(
        &self,
        job: &LeasedJob,
        today: NaiveDate,
        storage_path: &mut String,
    ) -> Result<ValidationStatus, ExtractionError> {
        // Step 1-3: Load proof image and check it is still ours to extract
        let proof = {
            let _step = info_span!("load_proof").entered();
            self.step_load_proof(&job.proof_image_id)?
        };
        storage_path.clone_from(&proof.storage_path);

        // Step 4: Download and recognize
        let output = {
            let _step = info_span!("recognize",
                object = %sanitize::redact_storage_path(&proof.storage_path),
            )
            .entered();
            let image = self.step_download(&proof.storage_path)?;
            debug!(bytes = image.len(), "Downloaded proof image");
            self.step_recognize(image)?
        };

        // Step 5-6: Normalize into fields
        let recognized = {
            let _step = info_span!("parse_fields").entered();
            self.step_parse_fields(output, today)?
        };

        // Step 7-10: Reconcile against the manual entry
        let entry = entry_repo::find_by_proof_image_id(&self.db, &proof.id)?;
        let status = {
            let _step = info_span!("reconcile").entered();
            self.step_reconcile(&recognized, entry.as_ref())
        };

        // Step 11-12: Persist conditionally, then propagate to the entry
        {
            let _step = info_span!("persist", validation_status = %status).entered();
            self.step_persist(&proof, entry.as_ref(), &recognized, status)?;
        }

        // Step 13
        if !job_repo::mark_completed(&self.db, job)? {
            warn!("Lease lost before completion; leaving the job to its current holder");
        }
        Ok(status)
    }

    fn step_load_proof(&self, proof_image_id: &str) -> Result<ProofImage, ExtractionError> {
        let proof = proof_repo::find_by_id(&self.db, proof_image_id)?
            .ok_or(ExtractionError::NotFound)?;

        if proof.validation_status.is_reviewed() {
            return Err(ExtractionError::AlreadyReviewed);
        }
        if proof.uploaded_at.is_none() {
            return Err(ExtractionError::UploadIncomplete);
        }
        Ok(proof)
    }

    fn step_download(&self, storage_path: &str) -> Result<Vec<u8>, ExtractionError> {
        let store = Arc::clone(&self.blob_store);
        let path = storage_path.to_string();
        let timeout = self.config.storage_timeout;

        match run_with_timeout("download", timeout, move || store.download(&path)) {
            Ok(result) => Ok(result?),
            Err(CallError::TimedOut) => Err(StorageError::Timeout(whole_secs(timeout)).into()),
            Err(CallError::Aborted(message)) => Err(StorageError::Request(message).into()),
        }
    }

    fn step_recognize(&self, image: Vec<u8>) -> Result<RecognizerOutput, ExtractionError> {
        let recognizer = Arc::clone(&self.recognizer);
        let timeout = self.config.recognizer_timeout;

        match run_with_timeout("recognize", timeout, move || recognizer.recognize(&image)) {
            Ok(result) => Ok(result?),
            Err(CallError::TimedOut) => {
                Err(RecognizerError::Timeout(whole_secs(timeout)).into())
            }
            Err(CallError::Aborted(message)) => Err(RecognizerError::Request(message).into()),
        }
    }

    fn step_parse_fields(
        &self,
        output: RecognizerOutput,
        today: NaiveDate,
    ) -> Result<Recognized, ExtractionError> {
        let recognized = match output {
            RecognizerOutput::RawText(text) => {
                let extraction = extract_proof_fields(&text, today);
                debug!(
                    equipment_mode = extraction.equipment_mode,
                    "Parsed recognizer text"
                );
                Recognized {
                    fields: extraction.fields,
                    confidence: None,
                    rejection_reason: None,
                    source: "text",
                }
            }
            RecognizerOutput::Structured(guess) => Recognized {
                fields: guess.to_fields(today),
                confidence: guess.confidence,
                rejection_reason: guess.rejection_reason,
                source: "structured",
            },
        };

        if !recognized.fields.has_any() {
            return Err(ExtractionError::NoExtractableData);
        }
        Ok(recognized)
    }

    fn step_reconcile(
        &self,
        recognized: &Recognized,
        entry: Option<&TrainingEntry>,
    ) -> ValidationStatus {
        let manual = entry.map(TrainingEntry::manual_entry);
        let verdict = reconcile(&recognized.fields, manual.as_ref()).with_confidence_floor(
            recognized.confidence,
            self.config.auto_verify_min_confidence,
        );
        debug!(
            has_required = verdict.has_required,
            auto_verified = verdict.auto_verified,
            has_entry = entry.is_some(),
            "Reconciled extraction"
        );
        verdict.validation_status()
    }

    fn step_persist(
        &self,
        proof: &ProofImage,
        entry: Option<&TrainingEntry>,
        recognized: &Recognized,
        status: ValidationStatus,
    ) -> Result<(), ExtractionError> {
        let stored = serde_json::to_value(StoredExtraction {
            fields: &recognized.fields,
            rejection_reason: recognized.rejection_reason.as_deref(),
            source: recognized.source,
        })
        .map_err(DatabaseError::from)?;

        let updated = proof_repo::update_if_pending(
            &self.db,
            &proof.id,
            status,
            &stored,
            recognized.confidence,
        )?;
        if !updated {
            return Err(ExtractionError::ConcurrentReviewRace);
        }

        if let Some(entry) = entry.filter(|entry| entry.validation_status.is_pending()) {
            if !entry_repo::update_validation_status_if_pending(&self.db, &entry.id, status)? {
                debug!(entry_id = %entry.id, "Training entry reviewed meanwhile, left as is");
            }
        }
        Ok(())
    }
}

fn whole_secs(timeout: Duration) -> u64 {
    timeout.as_secs().max(1)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic".to_string()
    }
}

//! Test harness for isolated pipeline runs.
//!
//! Each harness owns a temp directory with its own SQLite file, an in-memory
//! blob store and helpers to seed proof images, entries and jobs.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use rowproof::db::entry_repo::{self, NewTrainingEntry, TrainingEntry};
use rowproof::db::job_repo::{self, ExtractionJob};
use rowproof::db::proof_repo::{self, ProofImage};
use rowproof::{
    BlobStore, Database, ExtractionPipeline, PipelineConfig, Recognizer, RecognizerError,
    RecognizerOutput, StorageError, StructuredGuess,
};

/// Blob store backed by a map, shared between the harness and pipelines.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn put(&self, path: &str, bytes: &[u8]) {
        self.objects
            .write()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
    }
}

impl BlobStore for MemoryBlobStore {
    fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

/// What a `ScriptedRecognizer` does on every call.
#[derive(Clone)]
pub enum Script {
    Text(String),
    Structured(StructuredGuess),
    Fail(String),
    Slow(Duration, String),
    Panic,
}

pub struct ScriptedRecognizer {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(Script::Text(text.to_string()))
    }

    pub fn structured(guess: StructuredGuess) -> Self {
        Self::new(Script::Structured(guess))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Recognizer for ScriptedRecognizer {
    fn recognize(&self, _image: &[u8]) -> Result<RecognizerOutput, RecognizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Text(text) => Ok(RecognizerOutput::RawText(text.clone())),
            Script::Structured(guess) => Ok(RecognizerOutput::Structured(guess.clone())),
            Script::Fail(message) => Err(RecognizerError::OcrFailed(message.clone())),
            Script::Slow(delay, text) => {
                thread::sleep(*delay);
                Ok(RecognizerOutput::RawText(text.clone()))
            }
            Script::Panic => panic!("scripted recognizer panic"),
        }
    }
}

/// Isolated database plus blob store for one test.
pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub store: MemoryBlobStore,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(&temp_dir.path().join("rowproof.db"))
            .expect("Failed to open test database");

        Self {
            temp_dir,
            db,
            store: MemoryBlobStore::default(),
        }
    }

    pub fn db_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("rowproof.db")
    }

    /// Registers a proof image without confirming its upload.
    pub fn pending_upload(&self, name: &str) -> ProofImage {
        let path = format!("athletes/a-1/{}", name);
        proof_repo::insert(&self.db, &path, Some("image/png")).expect("Failed to insert proof")
    }

    /// Registers an uploaded proof image and stores its bytes.
    pub fn uploaded_proof(&self, name: &str) -> ProofImage {
        let proof = self.pending_upload(name);
        self.store.put(&proof.storage_path, b"\x89PNG fake image bytes");
        proof_repo::mark_uploaded(&self.db, &proof.id).expect("Failed to mark upload");
        self.reload_proof(&proof.id)
    }

    pub fn add_entry(&self, entry: NewTrainingEntry) -> TrainingEntry {
        entry_repo::insert(&self.db, &entry).expect("Failed to insert entry")
    }

    pub fn enqueue(&self, proof_image_id: &str) -> ExtractionJob {
        job_repo::enqueue(&self.db, proof_image_id).expect("Failed to enqueue job")
    }

    pub fn reload_proof(&self, id: &str) -> ProofImage {
        proof_repo::find_by_id(&self.db, id)
            .expect("Failed to load proof")
            .expect("Proof image missing")
    }

    pub fn reload_entry(&self, id: &str) -> TrainingEntry {
        entry_repo::find_by_id(&self.db, id)
            .expect("Failed to load entry")
            .expect("Entry missing")
    }

    pub fn job_for(&self, proof_image_id: &str) -> ExtractionJob {
        job_repo::find_by_proof_image_id(&self.db, proof_image_id)
            .expect("Failed to load job")
            .expect("Job missing")
    }

    pub fn pipeline(&self, recognizer: Arc<dyn Recognizer>) -> ExtractionPipeline {
        self.pipeline_with(recognizer, PipelineConfig::default())
    }

    pub fn pipeline_with(
        &self,
        recognizer: Arc<dyn Recognizer>,
        config: PipelineConfig,
    ) -> ExtractionPipeline {
        ExtractionPipeline::new(
            self.db.clone(),
            Arc::new(self.store.clone()),
            recognizer,
            config,
        )
    }
}

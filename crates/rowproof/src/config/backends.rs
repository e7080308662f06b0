//! Builds the configured blob store and recognizer.

use std::sync::Arc;
use std::time::Duration;

use crate::config::schema::{RecognizerBackend, RecognizerConfig, StorageBackend, StorageConfig};
use crate::error::RowproofError;
use crate::recognizer::{HttpRecognizer, Recognizer, TesseractRecognizer};
use crate::secrets::{resolve_secret, resolve_secret_optional};
use crate::storage::{BlobStore, FilesystemBlobStore, HttpBlobStore};

pub fn build_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, RowproofError> {
    match &config.backend {
        StorageBackend::Filesystem { root } => {
            log::info!("Using filesystem blob store at {}", root);
            Ok(Arc::new(FilesystemBlobStore::new(root)))
        }
        StorageBackend::Http {
            base_url,
            bucket,
            service_key,
            service_key_file,
            service_key_env_var,
        } => {
            let key = resolve_secret(
                service_key.as_deref(),
                service_key_file.as_deref(),
                service_key_env_var.as_deref(),
            )?;
            let store = HttpBlobStore::new(
                base_url,
                bucket,
                key,
                Duration::from_secs(config.timeout_secs),
            )?;
            log::info!("Using HTTP blob store {} (bucket {})", base_url, bucket);
            Ok(Arc::new(store))
        }
    }
}

pub fn build_recognizer(config: &RecognizerConfig) -> Result<Arc<dyn Recognizer>, RowproofError> {
    match &config.backend {
        RecognizerBackend::Tesseract { languages } => {
            log::info!("Using Tesseract recognizer ({})", languages.join("+"));
            Ok(Arc::new(TesseractRecognizer::new(languages)))
        }
        RecognizerBackend::Http {
            endpoint,
            api_key,
            api_key_file,
            api_key_env_var,
        } => {
            let key = resolve_secret_optional(
                api_key.as_deref(),
                api_key_file.as_deref(),
                api_key_env_var.as_deref(),
            )?;
            let recognizer =
                HttpRecognizer::new(endpoint, key, Duration::from_secs(config.timeout_secs))?;
            log::info!("Using HTTP recognizer at {}", endpoint);
            Ok(Arc::new(recognizer))
        }
    }
}

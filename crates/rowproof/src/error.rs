use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RowproofError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Failed to read object '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage request failed: {0}")]
    Request(String),

    #[error("Storage returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Download timed out after {0}s")]
    Timeout(u64),
}

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Recognizer request failed: {0}")]
    Request(String),

    #[error("Recognizer returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed recognizer response: {0}")]
    MalformedResponse(String),

    #[error("Recognizer timed out after {0}s")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, RowproofError>;

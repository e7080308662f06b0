mod backends;
pub mod loader;
pub mod schema;

pub use backends::{build_blob_store, build_recognizer};
pub use loader::{load_config, load_config_from_str, validate_config};
pub use schema::{
    Config, LeaseConfig, PipelineSettings, RecognizerBackend, RecognizerConfig, StorageBackend,
    StorageConfig,
};

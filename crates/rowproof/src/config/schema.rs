use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub version: String,
    pub database_path: String,
    pub storage: StorageConfig,
    pub recognizer: RecognizerConfig,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub lease: LeaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(flatten)]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum StorageBackend {
    Filesystem {
        root: String,
    },
    Http {
        base_url: String,
        bucket: String,
        #[serde(default)]
        service_key: Option<String>,
        #[serde(default)]
        service_key_file: Option<String>,
        #[serde(default)]
        service_key_env_var: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizerConfig {
    #[serde(flatten)]
    pub backend: RecognizerBackend,
    #[serde(default = "default_recognizer_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum RecognizerBackend {
    Tesseract {
        #[serde(default = "default_languages")]
        languages: Vec<String>,
    },
    Http {
        endpoint: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        api_key_file: Option<String>,
        #[serde(default)]
        api_key_env_var: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSettings {
    /// Jobs processed per batch invocation.
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
    /// Structured guesses below this confidence are never auto-verified.
    #[serde(default)]
    pub auto_verify_min_confidence: Option<f64>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_jobs: default_max_jobs(),
            auto_verify_min_confidence: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseConfig {
    /// PROCESSING leases older than this are reclaimed. Unset disables reclaiming.
    #[serde(default)]
    pub stale_after_minutes: Option<u64>,
}

fn default_storage_timeout() -> u64 {
    30
}

fn default_recognizer_timeout() -> u64 {
    60
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_max_jobs() -> usize {
    1
}

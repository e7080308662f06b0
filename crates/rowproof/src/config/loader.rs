use std::path::Path;

use crate::config::schema::{Config, RecognizerBackend, StorageBackend};
use crate::error::ConfigError;
use crate::secrets::has_secret_source;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

/// Checks the rules the schema cannot express, and re-checks the bounds for
/// configs built in code.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(invalid(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    if config.database_path.trim().is_empty() {
        return Err(invalid("databasePath must not be empty"));
    }

    if config.storage.timeout_secs == 0 {
        return Err(invalid("storage.timeoutSecs must be positive"));
    }
    match &config.storage.backend {
        StorageBackend::Filesystem { root } => {
            if root.trim().is_empty() {
                return Err(invalid("storage.root must not be empty"));
            }
        }
        StorageBackend::Http {
            base_url,
            bucket,
            service_key,
            service_key_file,
            service_key_env_var,
        } => {
            if base_url.trim().is_empty() || bucket.trim().is_empty() {
                return Err(invalid("storage.baseUrl and storage.bucket must not be empty"));
            }
            if !has_secret_source(
                service_key.as_deref(),
                service_key_file.as_deref(),
                service_key_env_var.as_deref(),
            ) {
                return Err(invalid(
                    "HTTP storage needs one of serviceKey, serviceKeyFile or serviceKeyEnvVar",
                ));
            }
        }
    }

    if config.recognizer.timeout_secs == 0 {
        return Err(invalid("recognizer.timeoutSecs must be positive"));
    }
    if let RecognizerBackend::Http { endpoint, .. } = &config.recognizer.backend {
        if endpoint.trim().is_empty() {
            return Err(invalid("recognizer.endpoint must not be empty"));
        }
    }

    if config.pipeline.max_jobs == 0 {
        return Err(invalid("pipeline.maxJobs must be at least 1"));
    }
    if let Some(min) = config.pipeline.auto_verify_min_confidence {
        if !(0.0..=1.0).contains(&min) {
            return Err(invalid("pipeline.autoVerifyMinConfidence must be within [0, 1]"));
        }
    }

    if config.lease.stale_after_minutes == Some(0) {
        return Err(invalid("lease.staleAfterMinutes must be positive"));
    }

    Ok(())
}

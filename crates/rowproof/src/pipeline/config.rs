use std::time::Duration;

use crate::config::Config;

/// Runtime settings for the extraction pipeline, derived from [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_jobs: usize,
    pub auto_verify_min_confidence: Option<f64>,
    pub stale_after: Option<chrono::Duration>,
    pub storage_timeout: Duration,
    pub recognizer_timeout: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        let stale_after = config
            .lease
            .stale_after_minutes
            .and_then(|minutes| i64::try_from(minutes).ok())
            .and_then(chrono::Duration::try_minutes);

        Self {
            max_jobs: config.pipeline.max_jobs,
            auto_verify_min_confidence: config.pipeline.auto_verify_min_confidence,
            stale_after,
            storage_timeout: Duration::from_secs(config.storage.timeout_secs),
            recognizer_timeout: Duration::from_secs(config.recognizer.timeout_secs),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_jobs: 1,
            auto_verify_min_confidence: None,
            stale_after: None,
            storage_timeout: Duration::from_secs(30),
            recognizer_timeout: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    #[test]
    fn test_from_config() {
        let config = load_config_from_str(
            r#"{
                "version": "1.0",
                "databasePath": "rowproof.db",
                "storage": { "kind": "filesystem", "root": "/srv/proofs", "timeoutSecs": 5 },
                "recognizer": { "kind": "tesseract", "timeoutSecs": 20 },
                "pipeline": { "maxJobs": 3, "autoVerifyMinConfidence": 0.7 },
                "lease": { "staleAfterMinutes": 10 }
            }"#,
        )
        .unwrap();

        let pipeline = PipelineConfig::from_config(&config);
        assert_eq!(pipeline.max_jobs, 3);
        assert_eq!(pipeline.auto_verify_min_confidence, Some(0.7));
        assert_eq!(pipeline.stale_after, Some(chrono::Duration::minutes(10)));
        assert_eq!(pipeline.storage_timeout, Duration::from_secs(5));
        assert_eq!(pipeline.recognizer_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_default_disables_reclaim() {
        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.max_jobs, 1);
        assert!(pipeline.stale_after.is_none());
    }
}

//! Object storage over its REST API (`/storage/v1/object/{bucket}/{path}`).

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use super::{validate_object_path, BlobStore, StorageError};

/// Default connect timeout for storage requests.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpBlobStore {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: SecretString,
}

impl HttpBlobStore {
    pub fn new(
        base_url: &str,
        bucket: &str,
        service_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.trim_matches('/').to_string(),
            service_key,
        })
    }

    pub fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}

impl BlobStore for HttpBlobStore {
    fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        validate_object_path(path)?;

        let response = self
            .client
            .get(self.object_url(path))
            .bearer_auth(self.service_key.expose_secret())
            .header("apikey", self.service_key.expose_secret())
            .send()
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            return Err(StorageError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|e| StorageError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpBlobStore {
        HttpBlobStore::new(
            "https://storage.example.com/",
            "proofs",
            SecretString::from("key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_object_url() {
        assert_eq!(
            store().object_url("athletes/a1/proof.jpg"),
            "https://storage.example.com/storage/v1/object/proofs/athletes/a1/proof.jpg"
        );
    }

    #[test]
    fn test_download_rejects_traversal_before_request() {
        assert!(matches!(
            store().download("../x"),
            Err(StorageError::InvalidPath { .. })
        ));
    }
}

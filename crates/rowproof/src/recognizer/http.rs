//! Remote recognizer (vision model behind an HTTP endpoint).

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::{parse_response, Recognizer, RecognizerError, RecognizerOutput};

/// Default connect timeout for recognizer requests.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest<'a> {
    image: String,
    mime_type: &'a str,
}

pub struct HttpRecognizer {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl HttpRecognizer {
    pub fn new(
        endpoint: &str,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, RecognizerError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| RecognizerError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }
}

/// Best-effort MIME type from the image's magic bytes.
pub fn sniff_mime_type(image: &[u8]) -> String {
    image::guess_format(image)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .map(|ext| mime_guess::from_ext(ext).first_or_octet_stream().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

impl Recognizer for HttpRecognizer {
    fn recognize(&self, image: &[u8]) -> Result<RecognizerOutput, RecognizerError> {
        let _span = tracing::info_span!("recognizer.http", bytes = image.len()).entered();

        let mime_type = sniff_mime_type(image);
        let body = RecognizeRequest {
            image: STANDARD.encode(image),
            mime_type: &mime_type,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                RecognizerError::Request(format!("request timed out: {}", e))
            } else {
                RecognizerError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| RecognizerError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(RecognizerError::Status {
                status: status.as_u16(),
                message: text,
            });
        }

        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_sniff_mime_type() {
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2))
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        assert_eq!(sniff_mime_type(&png), "image/png");
        assert_eq!(sniff_mime_type(b"plain bytes"), "application/octet-stream");
    }

    #[test]
    fn test_request_body_shape() {
        let body = RecognizeRequest {
            image: STANDARD.encode(b"abc"),
            mime_type: "image/jpeg",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["image"], "YWJj");
        assert_eq!(json["mimeType"], "image/jpeg");
    }
}

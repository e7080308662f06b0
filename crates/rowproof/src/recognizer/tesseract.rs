use std::io::Cursor;
use std::sync::Arc;

use super::{Recognizer, RecognizerError, RecognizerOutput};

/// Local OCR through Tesseract. Always yields [`RecognizerOutput::RawText`].
#[derive(Clone)]
pub struct TesseractRecognizer {
    inner: Arc<TesseractInner>,
}

struct TesseractInner {
    languages: String,
}

impl TesseractRecognizer {
    pub fn new(languages: &[String]) -> Self {
        let lang_str = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };

        Self {
            inner: Arc::new(TesseractInner {
                languages: lang_str,
            }),
        }
    }

    pub fn languages(&self) -> &str {
        &self.inner.languages
    }

    /// Decodes the image and re-encodes it as PNG, the format leptonica reads reliably.
    pub fn normalize_image(image_data: &[u8]) -> Result<Vec<u8>, RecognizerError> {
        let img = image::load_from_memory(image_data)
            .map_err(|e| RecognizerError::ImageDecode(e.to_string()))?;

        let mut png_data = Vec::new();
        img.write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| RecognizerError::ImageDecode(format!("Failed to convert image: {}", e)))?;
        Ok(png_data)
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, image: &[u8]) -> Result<RecognizerOutput, RecognizerError> {
        let _span = tracing::info_span!("recognizer.tesseract", bytes = image.len()).entered();

        let png_data = Self::normalize_image(image)?;

        let mut lt = leptess::LepTess::new(None, &self.inner.languages).map_err(|e| {
            RecognizerError::OcrFailed(format!("Failed to initialize Tesseract: {}", e))
        })?;

        lt.set_image_from_mem(&png_data).map_err(|e| {
            RecognizerError::OcrFailed(format!("Failed to set image for OCR: {}", e))
        })?;

        let text = lt
            .get_utf8_text()
            .map_err(|e| RecognizerError::OcrFailed(e.to_string()))?;

        tracing::debug!(chars = text.chars().count(), "OCR finished");
        Ok(RecognizerOutput::RawText(text))
    }
}

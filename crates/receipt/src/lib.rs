//! Receipt scanning: OCR through a vision service, then heuristics that turn
//! the recognized text into a draft transaction.

use std::sync::Arc;

pub use error::ReceiptError;
pub use extract::{FOOD_CATEGORY, KeywordExtractor, ReceiptFields, TextToFields};
pub use vision::{DEFAULT_ENDPOINT, VisionClient};

mod error;
mod extract;
mod vision;

/// Result of a scan: the guessed fields plus the text they came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scan {
    pub fields: ReceiptFields,
    pub raw_text: String,
}

/// OCR client paired with a text extraction strategy.
#[derive(Clone)]
pub struct ReceiptScanner {
    vision: VisionClient,
    extractor: Arc<dyn TextToFields>,
}

impl std::fmt::Debug for ReceiptScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptScanner")
            .field("vision", &self.vision)
            .finish_non_exhaustive()
    }
}

impl ReceiptScanner {
    pub fn new(vision: VisionClient, extractor: Arc<dyn TextToFields>) -> Self {
        Self { vision, extractor }
    }

    /// Scanner using [`KeywordExtractor`].
    pub fn with_keywords(vision: VisionClient) -> Result<Self, ReceiptError> {
        Ok(Self::new(vision, Arc::new(KeywordExtractor::new()?)))
    }

    /// Scan a base64 image (plain or as a `data:` URL).
    pub async fn scan(&self, image_base64: &str) -> Result<Scan, ReceiptError> {
        let image = vision::decode_image(image_base64)?;
        let raw_text = self.vision.detect_text(&image).await?;
        if raw_text.trim().is_empty() {
            tracing::warn!("vision service recognized no text in a {} byte image", image.len());
        }
        Ok(Scan {
            fields: self.extractor.extract(&raw_text),
            raw_text,
        })
    }
}

use std::sync::Arc;
use std::time::Instant;

use sha2::{Digest, Sha256};

use crate::cache::ResultCache;
use crate::config::Config;
use crate::error::Result;
use crate::models::{PipelineOutcome, UploadedImage};
use crate::ocr::TextExtractor;
use crate::sanitize::sanitize_text;
use crate::validation::validate_image;

/// Computes the content hash used as the cache key and dedup identity:
/// lowercase SHA-256 hex over the raw image bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    format!("{digest:x}")
}

/// Composes the per-image operation: validate, hash, consult the cache (or
/// call the OCR provider), normalize the text, and assemble the outcome with
/// elapsed wall-clock time. Used by both the single and batch endpoints.
#[derive(Clone)]
pub struct ExtractionPipeline {
    config: Arc<Config>,
    cache: ResultCache,
    extractor: Arc<dyn TextExtractor>,
}

impl ExtractionPipeline {
    pub fn new(config: Arc<Config>, cache: ResultCache, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            config,
            cache,
            extractor,
        }
    }

    pub async fn process(&self, upload: UploadedImage) -> Result<PipelineOutcome> {
        let started = Instant::now();

        let metadata = validate_image(&upload, &self.config.upload)?;
        let hash = content_hash(&upload.bytes);

        let extractor = self.extractor.clone();
        let bytes = upload.bytes;
        let outcome = self
            .cache
            .get_or_compute(&hash, || async move { extractor.extract(&bytes).await })
            .await?;

        Ok(PipelineOutcome {
            text: sanitize_text(&outcome.text),
            confidence: outcome.confidence,
            processing_time_ms: started.elapsed().as_millis() as u64,
            metadata,
        })
    }
}

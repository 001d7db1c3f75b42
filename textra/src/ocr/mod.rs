//! OCR client layer.
//!
//! [`TextExtractor`] is the seam between the pipeline and the external
//! vision provider: image bytes in, extracted text plus an aggregate
//! confidence out. [`VisionClient`] implements it against the Google Cloud
//! Vision REST API and retries transient failures with exponential backoff
//! (see [`retry`]).

mod retry;
mod vision;

pub use retry::{RetryDecision, RetryPolicy, RetrySchedule};
pub use vision::VisionClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::OcrOutcome;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extracts text from raw image bytes. Implementations own their retry
    /// behavior; an error here means all attempts are exhausted.
    async fn extract(&self, image: &[u8]) -> Result<OcrOutcome>;
}

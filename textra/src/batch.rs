use futures::future::join_all;

use crate::error::{Result, TextraError};
use crate::models::{BatchItem, UploadedImage};
use crate::pipeline::ExtractionPipeline;

/// Fans the pipeline out over a bounded batch of images. Items run
/// concurrently; a failing item becomes an error slot instead of aborting
/// the batch, and results come back in submission order.
#[derive(Clone)]
pub struct BatchCoordinator {
    pipeline: ExtractionPipeline,
    max_items: usize,
}

impl BatchCoordinator {
    pub fn new(pipeline: ExtractionPipeline, max_items: usize) -> Self {
        Self {
            pipeline,
            max_items,
        }
    }

    pub async fn process_batch(&self, uploads: Vec<UploadedImage>) -> Result<Vec<BatchItem>> {
        if uploads.len() > self.max_items {
            return Err(TextraError::InvalidImage(format!(
                "Max {} images per batch.",
                self.max_items
            )));
        }

        let tasks = uploads.into_iter().map(|upload| {
            let pipeline = self.pipeline.clone();
            async move { pipeline.process(upload).await }
        });

        // join_all yields results in input order regardless of completion
        // order.
        let results = join_all(tasks).await;

        Ok(results
            .into_iter()
            .map(|result| match result {
                Ok(outcome) => BatchItem::Success(outcome),
                Err(err) => BatchItem::Failure {
                    error: err.to_string(),
                },
            })
            .collect())
    }
}

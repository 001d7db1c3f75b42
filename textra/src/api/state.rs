use std::sync::Arc;

use crate::batch::BatchCoordinator;
use crate::cache::ResultCache;
use crate::config::Config;
use crate::ocr::TextExtractor;
use crate::pipeline::ExtractionPipeline;
use crate::ratelimit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: ExtractionPipeline,
    pub batch: BatchCoordinator,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: Config, extractor: Arc<dyn TextExtractor>) -> Self {
        let config = Arc::new(config);
        let cache = ResultCache::new(config.cache.capacity);
        let pipeline = ExtractionPipeline::new(config.clone(), cache, extractor);
        let batch = BatchCoordinator::new(pipeline.clone(), config.upload.max_batch_size);
        let limiter = RateLimiter::new(std::time::Duration::from_secs(
            config.rate_limit.window_secs,
        ));

        Self {
            config,
            pipeline,
            batch,
            limiter,
        }
    }
}

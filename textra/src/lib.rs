pub mod api;
pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod ratelimit;
pub mod sanitize;
pub mod validation;

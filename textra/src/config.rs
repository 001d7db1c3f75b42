use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Content types accepted when no `SUPPORTED_FORMATS` override is present.
pub const DEFAULT_SUPPORTED_FORMATS: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
    "image/tiff",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub ocr: OcrConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes.
    pub max_file_size: usize,
    /// Declared content types admitted by the validator.
    pub allowed_content_types: Vec<String>,
    /// Maximum number of images in one batch request.
    pub max_batch_size: usize,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Total attempts per extraction, including the first.
    pub retry_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached OCR results before LRU eviction.
    pub capacity: usize,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub extract_per_window: u32,
    pub batch_per_window: u32,
    pub window_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("TEXTRA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("TEXTRA_PORT", 3000),
            },
            upload: UploadConfig {
                max_file_size: parse_env_or("MAX_FILE_SIZE_MB", 10usize) * 1024 * 1024,
                allowed_content_types: env::var("SUPPORTED_FORMATS")
                    .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_else(|_| {
                        DEFAULT_SUPPORTED_FORMATS
                            .iter()
                            .map(|s| s.to_string())
                            .collect()
                    }),
                max_batch_size: parse_env_or("MAX_BATCH_SIZE", 10),
            },
            ocr: OcrConfig {
                api_key: env::var("VISION_API_KEY").ok(),
                base_url: env::var("VISION_BASE_URL")
                    .unwrap_or_else(|_| "https://vision.googleapis.com/v1".to_string()),
                timeout_secs: parse_env_or("VISION_TIMEOUT", 30),
                retry_attempts: parse_env_or("VISION_RETRY_ATTEMPTS", 3),
                retry_initial_delay_ms: parse_env_or("VISION_RETRY_INITIAL_DELAY_MS", 1000),
                retry_max_delay_ms: parse_env_or("VISION_RETRY_MAX_DELAY_MS", 10_000),
            },
            cache: CacheConfig {
                capacity: parse_env_or("CACHE_SIZE", 100),
            },
            rate_limit: RateLimitConfig {
                extract_per_window: parse_env_or("RATE_LIMIT_EXTRACT", 10),
                batch_per_window: parse_env_or("RATE_LIMIT_BATCH", 5),
                window_secs: parse_env_or("RATE_LIMIT_WINDOW_SECS", 60),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

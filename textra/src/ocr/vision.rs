use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::OcrConfig;
use crate::error::{Result, TextraError};
use crate::models::OcrOutcome;

use super::retry::{RetryDecision, RetryPolicy, RetrySchedule};
use super::TextExtractor;

/// Client for the Google Cloud Vision `images:annotate` endpoint, using
/// document text detection. Each call retries transient failures according
/// to the configured [`RetryPolicy`] before surfacing a provider error.
#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResult {
    error: Option<ProviderStatus>,
    full_text_annotation: Option<TextAnnotation>,
}

#[derive(Debug, Deserialize)]
struct ProviderStatus {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    text: Option<String>,
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    blocks: Vec<Block>,
}

#[derive(Debug, Deserialize)]
struct Block {
    #[serde(default)]
    paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Deserialize)]
struct Paragraph {
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
struct Word {
    #[serde(default)]
    symbols: Vec<Symbol>,
}

#[derive(Debug, Deserialize)]
struct Symbol {
    confidence: Option<f64>,
}

impl VisionClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TextraError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            retry: RetryPolicy::from_config(config),
        })
    }

    async fn annotate(&self, image: &[u8], api_key: &str) -> Result<OcrOutcome> {
        let body = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: vec![Feature {
                    kind: "DOCUMENT_TEXT_DETECTION".to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/images:annotate?key={}", self.base_url, api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| TextraError::Provider(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(TextraError::Provider(format!(
                "provider returned {status}: {detail}"
            )));
        }

        let parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| TextraError::Provider(format!("unparseable provider response: {e}")))?;

        let result = parsed
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| TextraError::Provider("empty provider response".to_string()))?;

        // A provider-reported error message counts as a failure for retry
        // purposes, same as a transport error.
        if let Some(message) = result.error.and_then(|e| e.message) {
            if !message.is_empty() {
                return Err(TextraError::Provider(message));
            }
        }

        match result.full_text_annotation {
            // No detected text region is a valid empty result, not an error.
            None => Ok(OcrOutcome {
                text: String::new(),
                confidence: 0.0,
            }),
            Some(annotation) => Ok(OcrOutcome {
                text: annotation.text.unwrap_or_default().trim().to_string(),
                confidence: aggregate_confidence(&annotation.pages),
            }),
        }
    }
}

#[async_trait]
impl TextExtractor for VisionClient {
    async fn extract(&self, image: &[u8]) -> Result<OcrOutcome> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            TextraError::Provider("VISION_API_KEY is not configured".to_string())
        })?;

        let mut schedule = RetrySchedule::new(self.retry.clone());
        loop {
            match self.annotate(image, api_key).await {
                Ok(outcome) => {
                    info!(
                        text_len = outcome.text.len(),
                        confidence = outcome.confidence,
                        "ocr_success"
                    );
                    return Ok(outcome);
                }
                Err(err) => match schedule.on_failure() {
                    RetryDecision::RetryAfter(delay) => {
                        warn!(
                            error = %err,
                            attempt = schedule.attempts(),
                            delay_ms = delay.as_millis() as u64,
                            "OCR attempt failed, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::GiveUp => return Err(err),
                },
            }
        }
    }
}

/// Mean of every per-symbol confidence across all pages, rounded to two
/// decimals. Symbols without a confidence value are skipped; if none carry
/// one the aggregate is 0.0.
fn aggregate_confidence(pages: &[Page]) -> f64 {
    let confidences: Vec<f64> = pages
        .iter()
        .flat_map(|p| &p.blocks)
        .flat_map(|b| &b.paragraphs)
        .flat_map(|p| &p.words)
        .flat_map(|w| &w.symbols)
        .filter_map(|s| s.confidence)
        .collect();

    if confidences.is_empty() {
        return 0.0;
    }

    let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
    (mean * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages_with_confidences(values: &[Option<f64>]) -> Vec<Page> {
        vec![Page {
            blocks: vec![Block {
                paragraphs: vec![Paragraph {
                    words: vec![Word {
                        symbols: values
                            .iter()
                            .map(|&confidence| Symbol { confidence })
                            .collect(),
                    }],
                }],
            }],
        }]
    }

    #[test]
    fn test_aggregate_confidence_mean_and_rounding() {
        let pages = pages_with_confidences(&[Some(0.90), Some(0.95), Some(1.00)]);
        assert_eq!(aggregate_confidence(&pages), 0.95);
    }

    #[test]
    fn test_aggregate_confidence_no_symbols() {
        let pages = pages_with_confidences(&[]);
        assert_eq!(aggregate_confidence(&pages), 0.0);
        assert_eq!(aggregate_confidence(&[]), 0.0);
    }

    #[test]
    fn test_aggregate_confidence_skips_missing_values() {
        let pages = pages_with_confidences(&[Some(0.80), None, Some(0.90)]);
        assert_eq!(aggregate_confidence(&pages), 0.85);
    }

    #[test]
    fn test_aggregate_confidence_rounds_to_two_decimals() {
        let pages = pages_with_confidences(&[Some(1.0), Some(0.0), Some(0.0)]);
        assert_eq!(aggregate_confidence(&pages), 0.33);
    }

    #[test]
    fn test_response_parsing_camel_case() {
        let json = r#"{
            "responses": [{
                "fullTextAnnotation": {
                    "text": "HELLO\n",
                    "pages": [{
                        "blocks": [{
                            "paragraphs": [{
                                "words": [{
                                    "symbols": [
                                        {"text": "H", "confidence": 0.98},
                                        {"text": "I"}
                                    ]
                                }]
                            }]
                        }]
                    }]
                }
            }]
        }"#;

        let parsed: AnnotateResponse = serde_json::from_str(json).unwrap();
        let result = &parsed.responses[0];
        let annotation = result.full_text_annotation.as_ref().unwrap();
        assert_eq!(annotation.text.as_deref(), Some("HELLO\n"));
        assert_eq!(aggregate_confidence(&annotation.pages), 0.98);
    }

    #[test]
    fn test_response_parsing_provider_error() {
        let json = r#"{"responses": [{"error": {"message": "quota exceeded", "code": 8}}]}"#;
        let parsed: AnnotateResponse = serde_json::from_str(json).unwrap();
        let message = parsed.responses[0]
            .error
            .as_ref()
            .and_then(|e| e.message.as_deref());
        assert_eq!(message, Some("quota exceeded"));
    }

    #[test]
    fn test_client_without_api_key_constructs() {
        let config = OcrConfig {
            api_key: None,
            base_url: "https://vision.googleapis.com/v1".to_string(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_initial_delay_ms: 1000,
            retry_max_delay_ms: 10_000,
        };
        let client = VisionClient::new(&config);
        assert!(client.is_ok());
    }
}

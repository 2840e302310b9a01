//! Extraction client.
//!
//! Guards calls to a generative backend (API key, rate limit, text length),
//! classifies backend failures and turns the raw response into
//! [`ExtractedData`]. The backend itself is a trait so the transport can be
//! swapped or mocked.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::ExtractorConfig;
use crate::input::ExtractedData;
use crate::limiter::RateLimiter;
use crate::sanitize::{parse_response, ParseError};

/// Output language requested from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ja,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Ja => "ja",
            Language::En => "en",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ja" => Ok(Language::Ja),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// Everything a backend needs for one extraction call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub text: String,
    pub language: Language,
    pub model_id: String,
    pub api_key: String,
}

/// A failure reported by the backend transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// True if the message looks like an exhausted quota or upstream rate
    /// limit.
    pub fn is_quota_exhausted(&self) -> bool {
        const MARKERS: [&str; 4] = ["RESOURCE_EXHAUSTED", "quota", "429", "rate limit"];
        MARKERS.iter().any(|m| self.message.contains(m))
    }
}

/// A generative model that answers an extraction prompt with raw text.
pub trait ExtractionBackend {
    fn generate(
        &self,
        request: ExtractionRequest,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;
}

/// Typed extraction failures.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("API key not configured")]
    NoApiKey,
    #[error("please wait {wait_seconds} seconds before trying again")]
    RateLimited { wait_seconds: u64 },
    #[error("text too long: {length} characters (limit {limit})")]
    TextTooLong { length: usize, limit: usize },
    #[error("API quota exceeded; try a lighter model or wait a few minutes")]
    QuotaExceeded,
    #[error("API error: {0}")]
    Api(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Rate-limited, key-guarded access to an [`ExtractionBackend`].
#[derive(Debug)]
pub struct ExtractionClient<B> {
    backend: B,
    /// Held in memory only
    api_key: Option<String>,
    model_id: String,
    limiter: RateLimiter,
    max_text_length: usize,
    diagnostic_window: usize,
}

impl<B: ExtractionBackend> ExtractionClient<B> {
    pub fn new(backend: B, config: &ExtractorConfig) -> Self {
        Self {
            backend,
            api_key: None,
            model_id: config.model_id.clone(),
            limiter: RateLimiter::new(Duration::from_millis(config.min_request_interval_ms)),
            max_text_length: config.max_text_length,
            diagnostic_window: config.diagnostic_window,
        }
    }

    /// Stores a trimmed API key. A blank key clears it.
    pub fn set_api_key(&mut self, key: &str) {
        let key = key.trim();
        self.api_key = (!key.is_empty()).then(|| key.to_string());
    }

    pub fn clear_api_key(&mut self) {
        self.api_key = None;
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn set_model(&mut self, model_id: impl Into<String>) {
        self.model_id = model_id.into();
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Extracts timeline data from `text`.
    pub async fn extract(&mut self, text: &str, language: Language) -> Result<ExtractedData, ExtractError> {
        self.extract_at(text, language, Instant::now()).await
    }

    /// Like [`extract`](Self::extract) with an explicit clock reading.
    ///
    /// Checks run in order: API key, rate limit, text length. The request
    /// counts against the rate limit once all three pass, whatever the
    /// backend answers.
    pub async fn extract_at(
        &mut self,
        text: &str,
        language: Language,
        now: Instant,
    ) -> Result<ExtractedData, ExtractError> {
        let api_key = self.api_key.clone().ok_or(ExtractError::NoApiKey)?;

        if let Err(wait_seconds) = self.limiter.check(now) {
            tracing::warn!("Extraction rejected: retry in {}s", wait_seconds);
            return Err(ExtractError::RateLimited { wait_seconds });
        }

        let length = text.chars().count();
        if length > self.max_text_length {
            return Err(ExtractError::TextTooLong {
                length,
                limit: self.max_text_length,
            });
        }

        self.limiter.record(now);
        tracing::info!(
            "Requesting extraction from {} ({} characters, {})",
            self.model_id,
            length,
            language
        );

        let request = ExtractionRequest {
            text: text.to_string(),
            language,
            model_id: self.model_id.clone(),
            api_key,
        };
        let raw = self.backend.generate(request).await.map_err(|e| {
            if e.is_quota_exhausted() {
                tracing::warn!("Backend quota exhausted: {}", e);
                ExtractError::QuotaExceeded
            } else {
                tracing::error!("Backend error: {}", e);
                ExtractError::Api(e.message)
            }
        })?;

        let value = parse_response(&raw, self.diagnostic_window)?;
        Ok(ExtractedData::from_value(&value))
    }
}

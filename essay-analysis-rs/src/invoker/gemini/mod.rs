//! Gemini API client implementation
//!
//! This module provides an [`Invoker`] over the Gemini `generateContent`
//! REST endpoint, plus the `models.list` call used for diagnostics.

mod models;
pub use models::*;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::mapping::{map_provider_error, map_transport_error};
use crate::error::{AnalysisError, ProviderFailure, Result};
use crate::invoker::{InvocationResult, Invoker};
use crate::payload::PromptPayload;
use crate::registry::CandidateModel;

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiInvoker {
    /// HTTP client
    http_client: Client,

    /// API key; `None` when not configured
    api_key: Option<String>,

    /// Base URL without trailing slash
    base_url: String,
}

impl GeminiInvoker {
    /// Create a client from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("essay-analysis/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AnalysisError::configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key: config
                .api_key
                .as_ref()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a new builder for the Gemini client
    pub fn builder() -> GeminiInvokerBuilder {
        GeminiInvokerBuilder::default()
    }

    fn model_url(&self, candidate: &CandidateModel) -> String {
        let model = candidate.id().trim_start_matches("models/");
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    /// List models visible to the configured key
    pub async fn list_models(&self) -> Result<ListModelsResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AnalysisError::configuration("GOOGLE_GEMINI_API_KEY is not set"))?;

        let url = format!("{}/v1beta/models", self.base_url);
        debug!(url = %url, "Listing provider models");

        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_provider_error(status, &body).into());
        }

        let models = response.json::<ListModelsResponse>().await?;
        Ok(models)
    }
}

#[async_trait]
impl Invoker for GeminiInvoker {
    fn name(&self) -> &str {
        "gemini"
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn invoke(&self, candidate: &CandidateModel, payload: &PromptPayload) -> InvocationResult {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderFailure::permanent("UNAUTHENTICATED", "GOOGLE_GEMINI_API_KEY is not set")
        })?;

        let url = self.model_url(candidate);
        let request = GenerateContentRequest::from_payload(payload);
        let start_time = Instant::now();

        debug!(
            candidate = %candidate,
            segments = payload.segments().len(),
            text_bytes = payload.text_len(),
            inline_data = payload.has_inline_data(),
            "Sending generateContent request"
        );

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let failure = map_provider_error(status, &body);
            warn!(
                candidate = %candidate,
                status = status.as_u16(),
                class = %failure.class,
                elapsed_ms = elapsed_ms(start_time),
                "Provider rejected request: {}",
                failure.message
            );
            return Err(failure);
        }

        let body = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if let Some(tokens) = body.usage_metadata.as_ref().and_then(|u| u.total_token_count) {
            debug!(candidate = %candidate, tokens, "Provider usage");
        }

        match body.text() {
            Some(text) => {
                debug!(
                    candidate = %candidate,
                    chars = text.len(),
                    elapsed_ms = elapsed_ms(start_time),
                    "Provider returned text"
                );
                Ok(text)
            }
            None => Err(ProviderFailure::permanent("EMPTY_RESPONSE", body.empty_reason())
                .with_status_code(status.as_u16())),
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Builder for the Gemini client
#[derive(Debug, Default)]
pub struct GeminiInvokerBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiInvokerBuilder {
    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the Gemini client
    pub fn build(self) -> Result<GeminiInvoker> {
        let mut config = ProviderConfig::default();

        if let Some(api_key) = self.api_key {
            config.api_key = Some(api_key);
        }

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(timeout) = self.timeout {
            config.request_timeout = timeout;
        }

        GeminiInvoker::new(&config)
    }
}

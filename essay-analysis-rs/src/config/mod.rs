//! Configuration management for essay analysis
//!
//! Configuration is read once at process start through a [`ConfigProvider`]
//! and turned into an [`AnalyzerConfig`], which is then passed explicitly to
//! the components that need it.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AnalysisError, Result};
use crate::registry::CandidateRegistry;
use crate::resilience::RetryConfig;
use crate::util::split_list;

/// Default provider endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default fallback chain, highest priority first
pub const DEFAULT_CANDIDATE_MODELS: &str = "gemini-2.0-flash,gemini-2.0-flash-001,gemini-1.5-flash";

/// Default end-to-end deadline in seconds
pub const DEFAULT_DEADLINE_SECONDS: u64 = 60;

/// Default upper bound for an uploaded image
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get a value if present and non-blank
    fn get_optional(&self, key: &str) -> Option<String> {
        self.get_string(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a value, falling back to `default` only when the key is absent
    ///
    /// A present but malformed value is a configuration error.
    fn get_parsed_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        <T as FromStr>::Err: std::fmt::Display,
    {
        match self.get_optional(key) {
            Some(value) => value.parse::<T>().map_err(|e| {
                AnalysisError::configuration(format!("Invalid value for key {}: {}", key, e))
            }),
            None => Ok(default),
        }
    }

    /// Get a comma separated list with a default
    fn get_list_or(&self, key: &str, default: &str) -> Vec<String> {
        split_list(&self.get_string_or(key, default))
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));
        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                AnalysisError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => AnalysisError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| AnalysisError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// Trait for validated configuration sections
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;
}

/// Provider endpoint and credential
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key; absence is reported on first use
    pub api_key: Option<String>,

    /// Base URL (can be changed for proxies and tests)
    pub base_url: String,

    /// Upper bound for one HTTP request
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_DEADLINE_SECONDS),
        }
    }
}

impl ServiceConfig for ProviderConfig {
    fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AnalysisError::configuration(format!(
                "provider base URL must be http(s): {:?}",
                self.base_url
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(AnalysisError::configuration("provider request timeout must be positive"));
        }

        Ok(())
    }
}

/// Everything the analyzer needs, built once at start
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub provider: ProviderConfig,

    /// Candidate model ids, highest priority first
    pub candidate_models: Vec<String>,

    /// Candidates that cannot take inline image data
    pub text_only_models: Vec<String>,

    pub retry: RetryConfig,

    /// End-to-end deadline of one analysis, backoff included
    pub deadline: Duration,

    pub max_image_bytes: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            candidate_models: split_list(DEFAULT_CANDIDATE_MODELS),
            text_only_models: Vec::new(),
            retry: RetryConfig::default(),
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECONDS),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = RetryConfig::default();

        let deadline = Duration::from_secs(
            provider.get_parsed_or("essay_deadline_seconds", DEFAULT_DEADLINE_SECONDS)?,
        );

        let config = Self {
            provider: ProviderConfig {
                api_key: provider.get_optional("google_gemini_api_key"),
                base_url: provider
                    .get_string_or("essay_provider_base_url", DEFAULT_BASE_URL)
                    .trim_end_matches('/')
                    .to_string(),
                request_timeout: deadline,
            },
            candidate_models: provider.get_list_or("essay_candidate_models", DEFAULT_CANDIDATE_MODELS),
            text_only_models: provider.get_list_or("essay_text_only_models", ""),
            retry: RetryConfig {
                max_attempts: provider.get_parsed_or("essay_max_attempts", defaults.max_attempts)?,
                base_delay: Duration::from_millis(provider.get_parsed_or(
                    "essay_retry_base_delay_ms",
                    defaults.base_delay.as_millis() as u64,
                )?),
            },
            deadline,
            max_image_bytes: provider.get_parsed_or("essay_max_image_bytes", DEFAULT_MAX_IMAGE_BYTES)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_provider(&EnvConfigProvider::new())
    }

    /// Build the candidate registry described by this configuration
    pub fn registry(&self) -> Result<CandidateRegistry> {
        CandidateRegistry::from_ids(&self.candidate_models, &self.text_only_models)
    }

    /// Whether a credential is configured
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }
}

impl ServiceConfig for AnalyzerConfig {
    fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        self.registry()?;

        if self.retry.max_attempts == 0 {
            return Err(AnalysisError::configuration("max attempts per candidate must be at least 1"));
        }

        if self.deadline.is_zero() {
            return Err(AnalysisError::configuration("analysis deadline must be positive"));
        }

        if self.max_image_bytes == 0 {
            return Err(AnalysisError::configuration("max image size must be positive"));
        }

        for id in &self.text_only_models {
            if !self.candidate_models.contains(id) {
                return Err(AnalysisError::configuration(format!(
                    "text-only model {} is not a candidate",
                    id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_formatting() {
        let provider = EnvConfigProvider::new();
        assert_eq!(provider.format_key("essay_max_attempts"), "ESSAY_MAX_ATTEMPTS");

        let prefixed = EnvConfigProvider::new().with_prefix("STAGING");
        assert_eq!(prefixed.format_key("google-gemini.api_key"), "STAGING_GOOGLE_GEMINI_API_KEY");
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.has_api_key());
        assert_eq!(config.registry().unwrap().len(), 3);
    }
}

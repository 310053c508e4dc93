//! Backend connection settings.

use lexlib_core::defaults::{
    BAAS_TIMEOUT_SECS, READ_RETRIES, READ_RETRY_BASE_MS, STORAGE_BUCKET,
};
use lexlib_core::{Error, Result};

/// Configuration for the hosted backend client.
#[derive(Debug, Clone)]
pub struct BaasConfig {
    /// Project base URL, e.g. `https://xyz.example.co`.
    pub base_url: String,
    /// Service API key, sent as `apikey` and as the default bearer token.
    pub api_key: String,
    /// Object storage bucket holding document files.
    pub bucket: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Extra attempts for idempotent reads on retryable failures.
    pub read_retries: u32,
    /// First retry delay in milliseconds, doubled per attempt.
    pub retry_base_ms: u64,
}

impl Default for BaasConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            bucket: STORAGE_BUCKET.to_string(),
            timeout_seconds: BAAS_TIMEOUT_SECS,
            read_retries: READ_RETRIES,
            retry_base_ms: READ_RETRY_BASE_MS,
        }
    }
}

impl BaasConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Read `LEXLIB_BAAS_*` and `LEXLIB_STORAGE_BUCKET` / `LEXLIB_READ_RETRIES`.
    ///
    /// `LEXLIB_BAAS_URL` and `LEXLIB_BAAS_KEY` are required.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("LEXLIB_BAAS_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config("LEXLIB_BAAS_URL is not set".to_string()))?;
        let api_key = std::env::var("LEXLIB_BAAS_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config("LEXLIB_BAAS_KEY is not set".to_string()))?;

        let defaults = Self::default();
        Ok(Self {
            base_url,
            api_key,
            bucket: std::env::var("LEXLIB_STORAGE_BUCKET")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.bucket),
            timeout_seconds: std::env::var("LEXLIB_BAAS_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_seconds),
            read_retries: std::env::var("LEXLIB_READ_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.read_retries),
            retry_base_ms: defaults.retry_base_ms,
        })
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BaasConfig::new("https://project.example/", "key");
        assert_eq!(config.bucket, "documents");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.read_retries, 2);
        assert_eq!(config.base(), "https://project.example");
    }
}

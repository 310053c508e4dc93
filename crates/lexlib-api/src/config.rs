//! Server configuration from the environment.

use axum::http::HeaderValue;
use lexlib_core::defaults::{
    ALLOWED_ORIGIN, MAX_UPLOAD_BYTES, RATE_LIMIT_PERIOD_SECS, RATE_LIMIT_REQUESTS, SERVER_PORT,
};
use lexlib_core::{Error, Result};

/// Which collaborator implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Hosted backend over HTTP.
    Baas,
    /// In-process backend; data is lost on restart.
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "baas" | "" => Ok(Self::Baas),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Config(format!(
                "LEXLIB_BACKEND must be 'baas' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub backend: BackendKind,
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u64,
    pub rate_limit_period_secs: u64,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: SERVER_PORT,
            backend: BackendKind::Baas,
            rate_limit_enabled: true,
            rate_limit_requests: RATE_LIMIT_REQUESTS,
            rate_limit_period_secs: RATE_LIMIT_PERIOD_SECS,
            allowed_origins: vec![ALLOWED_ORIGIN.to_string()],
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let backend = match std::env::var("LEXLIB_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.backend,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            backend,
            rate_limit_enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.rate_limit_enabled),
            rate_limit_requests: std::env::var("RATE_LIMIT_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.rate_limit_requests),
            rate_limit_period_secs: std::env::var("RATE_LIMIT_PERIOD_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.rate_limit_period_secs),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| split_origins(&v))
                .filter(|list| !list.is_empty())
                .unwrap_or(defaults.allowed_origins),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
        })
    }

    /// Disable rate limiting; used by tests and local tooling.
    pub fn without_rate_limit(mut self) -> Self {
        self.rate_limit_enabled = false;
        self
    }

    /// Origins that parse as header values. Invalid entries are logged and
    /// skipped.
    pub fn origin_headers(&self) -> Vec<HeaderValue> {
        self.allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                    None
                }
            })
            .collect()
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

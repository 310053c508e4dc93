//! Authenticated HTTP client for the hosted backend.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use lexlib_core::{Error, Result};

use crate::config::BaasConfig;
use crate::error::{error_message, to_lexlib_error};

/// Row API prefix.
pub(crate) const REST: &str = "/rest/v1";
/// Object storage prefix.
pub(crate) const STORAGE: &str = "/storage/v1";
/// Auth prefix.
pub(crate) const AUTH: &str = "/auth/v1";

/// Client for the hosted backend's row, storage and auth APIs.
///
/// One client implements every collaborator trait from `lexlib_core`, so a
/// single value can be shared behind `Arc` for documents, files, events,
/// accounts and content pages.
#[derive(Clone)]
pub struct BaasClient {
    http: Client,
    config: BaasConfig,
}

impl std::fmt::Debug for BaasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaasClient")
            .field("base_url", &self.config.base_url)
            .field("bucket", &self.config.bucket)
            .finish_non_exhaustive()
    }
}

impl BaasClient {
    pub fn new(config: BaasConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::Config("backend base URL is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "baas",
            base_url = %config.base_url,
            bucket = %config.bucket,
            "Initializing backend client"
        );

        Ok(Self { http, config })
    }

    /// Create from `LEXLIB_BAAS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(BaasConfig::from_env()?)
    }

    pub fn config(&self) -> &BaasConfig {
        &self.config
    }

    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base(), endpoint)
    }

    /// Request authorized with the service key.
    pub(crate) fn build_request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(endpoint))
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
    }

    /// Request authorized with an end user's access token.
    pub(crate) fn build_user_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
    ) -> RequestBuilder {
        self.http
            .request(method, self.url(endpoint))
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", access_token))
    }

    /// Send once, turning non-success statuses into errors.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(to_lexlib_error(status.as_u16(), &error_message(&body)))
    }

    /// Send an idempotent read, retrying transport failures, 429 and 5xx
    /// with exponential backoff.
    pub(crate) async fn read<F>(&self, op: &str, make_request: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            match self.send(make_request()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.read_retries => {
                    let delay = self.config.retry_base_ms.saturating_mul(1 << attempt.min(16));
                    attempt += 1;
                    warn!(
                        subsystem = "baas",
                        op,
                        attempt,
                        delay_ms = delay,
                        error = %e,
                        "Backend read failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Decode a JSON response body.
    pub(crate) async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            Error::Serialization(format!("unexpected backend response: {}", e))
        })
    }
}

//! Shared application state.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use tracing::info;

use lexlib_baas::BaasClient;
use lexlib_core::{
    AccountDirectory, DocumentRepository, Error, EventRecorder, FileStore, InMemoryBackend,
    InflightGuard, Library, PageRepository, Result,
};

use crate::config::{BackendKind, ServerConfig};

pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<Library>,
    pub accounts: Arc<dyn AccountDirectory>,
    pub pages: Arc<dyn PageRepository>,
    /// Rejects duplicate submissions of the same mutation.
    pub inflight: InflightGuard,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    /// Wire state from a backend implementing every collaborator trait.
    pub fn with_backend<B>(backend: Arc<B>, config: &ServerConfig) -> Result<Self>
    where
        B: DocumentRepository
            + FileStore
            + EventRecorder
            + AccountDirectory
            + PageRepository
            + 'static,
    {
        let library = Library::new(backend.clone(), backend.clone(), backend.clone());
        Ok(Self {
            library: Arc::new(library),
            accounts: backend.clone(),
            pages: backend,
            inflight: InflightGuard::new(),
            rate_limiter: build_rate_limiter(config)?,
        })
    }

    /// Connect the backend selected by `config.backend`.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        match config.backend {
            BackendKind::Baas => {
                let client = BaasClient::from_env()?;
                Self::with_backend(Arc::new(client), config)
            }
            BackendKind::Memory => {
                info!("Using in-memory backend; data will not persist");
                Self::with_backend(Arc::new(InMemoryBackend::new()), config)
            }
        }
    }
}

fn build_rate_limiter(config: &ServerConfig) -> Result<Option<Arc<GlobalRateLimiter>>> {
    if !config.rate_limit_enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(RateLimiter::direct(build_quota(config)?))))
}

/// `rate_limit_requests` per `rate_limit_period_secs`: the full allowance is
/// available as a burst and refills evenly across the period.
fn build_quota(config: &ServerConfig) -> Result<Quota> {
    let burst = u32::try_from(config.rate_limit_requests)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| Error::Config("RATE_LIMIT_REQUESTS must be between 1 and u32::MAX".into()))?;
    let period = Duration::from_secs(config.rate_limit_period_secs);
    let quota = Quota::with_period(period / burst.get())
        .ok_or_else(|| Error::Config("RATE_LIMIT_PERIOD_SECS must be non-zero".into()))?
        .allow_burst(burst);
    Ok(quota)
}

//! Centralized default constants for lexlib.
//!
//! Every crate and the server binary reference these constants instead of
//! defining their own magic numbers. Organized by domain area.

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for document listings.
pub const PAGE_SIZE: u32 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default page size for dashboard tables (users, subscriptions).
pub const DASHBOARD_PAGE_SIZE: u32 = 20;

// =============================================================================
// SEARCH
// =============================================================================

/// Quiet period before a live search fires, in milliseconds.
pub const LIVE_SEARCH_DEBOUNCE_MS: u64 = 500;

/// Queries shorter than this (after trimming) are not sent to the backend.
pub const LIVE_SEARCH_MIN_CHARS: usize = 2;

// =============================================================================
// DISPLAY
// =============================================================================

/// Label shown for metadata values that the backend did not supply.
pub const MISSING_LABEL: &str = "N/A";

// =============================================================================
// HOSTED BACKEND
// =============================================================================

/// Object storage bucket holding document files.
pub const STORAGE_BUCKET: &str = "documents";

/// HTTP timeout for backend calls (seconds).
pub const BAAS_TIMEOUT_SECS: u64 = 30;

/// Retries allowed for idempotent reads (list, search, get, download).
pub const READ_RETRIES: u32 = 2;

/// Base delay between read retries (milliseconds); doubled per attempt.
pub const READ_RETRY_BASE_MS: u64 = 200;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default rate limit: max requests per period.
pub const RATE_LIMIT_REQUESTS: u64 = 100;

/// Default rate limit: period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

/// Default maximum request body (50 MB) for uploads.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Default CORS origin (local frontend dev server).
pub const ALLOWED_ORIGIN: &str = "http://localhost:5173";

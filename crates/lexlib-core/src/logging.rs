//! Structured logging field name constants for lexlib.
//!
//! All crates use these constants so log queries can rely on the same field
//! names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue (failed event recording, orphaned object) |
//! | INFO  | Lifecycle events, completed mutations |
//! | DEBUG | Filter adjustments, request shapes |
//! | TRACE | Per-row data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the HTTP request.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "core", "baas"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "resolver", "library", "live_search", "storage"
pub const COMPONENT: &str = "component";

/// Logical operation name.
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Document UUID being operated on.
pub const DOCUMENT_ID: &str = "document_id";

/// Authenticated user UUID.
pub const USER_ID: &str = "user_id";

/// Taxonomy category name.
pub const CATEGORY: &str = "category";

/// Taxonomy subcategory name.
pub const SUBCATEGORY: &str = "subcategory";

/// Storage object path.
pub const OBJECT_PATH: &str = "object_path";

/// Search query text.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned.
pub const RESULT_COUNT: &str = "result_count";

/// Denormalized total row count reported by the backend.
pub const TOTAL_ROWS: &str = "total_rows";

/// Retry attempt number (1-based).
pub const ATTEMPT: &str = "attempt";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

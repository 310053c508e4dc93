//! HTTP handlers, grouped by audience.

pub mod account;
pub mod admin;
pub mod categories;
pub mod documents;
pub mod pages;

use axum::response::IntoResponse;
use axum::Json;

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

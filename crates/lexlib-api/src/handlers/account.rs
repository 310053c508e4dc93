//! The signed-in user's own account.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use lexlib_core::{EventKind, Subscription, UserProfile};

use crate::auth::CurrentViewer;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub profile: UserProfile,
    pub subscription: Option<Subscription>,
    pub can_download: bool,
}

pub async fn me(CurrentViewer(viewer): CurrentViewer) -> Json<MeResponse> {
    let can_download = viewer.can_download(Utc::now());
    Json(MeResponse {
        profile: viewer.profile,
        subscription: viewer.subscription,
        can_download,
    })
}

/// Record a `login` event for the caller. Recording failures are logged
/// and never surface to the client.
pub async fn record_login(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> StatusCode {
    state
        .library
        .events()
        .record(EventKind::Login, viewer.profile.id, None)
        .await;
    StatusCode::NO_CONTENT
}

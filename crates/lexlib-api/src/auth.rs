//! Bearer-token authentication extractors.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use lexlib_core::{logging, resolve_viewer, Viewer};

use crate::{ApiError, AppState};

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Any signed-in user.
#[derive(Debug, Clone)]
pub struct CurrentViewer(pub Viewer);

#[async_trait]
impl FromRequestParts<AppState> for CurrentViewer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
        let viewer = resolve_viewer(state.accounts.as_ref(), token).await?;
        tracing::Span::current()
            .record(logging::USER_ID, tracing::field::display(viewer.profile.id));
        Ok(CurrentViewer(viewer))
    }
}

/// A signed-in user with the admin role.
#[derive(Debug, Clone)]
pub struct AdminViewer(pub Viewer);

#[async_trait]
impl FromRequestParts<AppState> for AdminViewer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let CurrentViewer(viewer) = CurrentViewer::from_request_parts(parts, state).await?;
        viewer.require_admin()?;
        Ok(AdminViewer(viewer))
    }
}

//! Public content pages.

use axum::extract::{Path, State};
use axum::Json;

use lexlib_core::ContentPage;

use crate::{ApiError, AppState};

/// A published page. Drafts are indistinguishable from missing pages.
pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ContentPage>, ApiError> {
    let page = state.pages.get_page(&slug).await?;
    if !page.published {
        return Err(lexlib_core::Error::NotFound(format!("page '{}'", slug)).into());
    }
    Ok(Json(page))
}

//! Read-only taxonomy endpoints.

use axum::extract::{Path, State};
use axum::Json;

use lexlib_core::Category;

use crate::{ApiError, AppState};

/// Every category with its subcategories, in display order.
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.library.taxonomy().categories().cloned().collect())
}

pub async fn list_subcategories(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let taxonomy = state.library.taxonomy();
    if !taxonomy.contains_category(&name) {
        return Err(ApiError::NotFound(format!("category '{}'", name)));
    }
    Ok(Json(taxonomy.subcategories_of(&name).to_vec()))
}

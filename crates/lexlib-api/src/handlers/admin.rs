//! Admin dashboard: document management, users, subscriptions and pages.
//!
//! Every handler requires the `admin` role. Mutations hold an in-flight
//! permit keyed on their target so a double-submitted form gets `409`.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use lexlib_core::{
    query_subscriptions, query_users, BatchReport, BatchStatus, ContentPage, DashboardPage,
    DeleteOutcome, Document, DocumentMetadata, DocumentUpdate, SortDirection, Subscription,
    SubscriptionQuery, SubscriptionStatus, UploadRequest, UserProfile, UserQuery, UserRole,
};

use crate::auth::AdminViewer;
use crate::{ApiError, AppState};

// =============================================================================
// DOCUMENTS
// =============================================================================

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("invalid multipart body: {}", e))
}

/// Upload a batch of files into one category.
///
/// Multipart fields: `category` (required), `subcategory`, `metadata` (a
/// JSON object applied to every file), then one `file` part per document.
/// Optional `title` parts are matched to files by position.
///
/// Responds `201` when every file was stored, `207` for a partial batch
/// and `422` when nothing was stored; the body is always the batch report.
pub async fn upload_documents(
    State(state): State<AppState>,
    AdminViewer(admin): AdminViewer,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<BatchReport>), ApiError> {
    let mut category: Option<String> = None;
    let mut subcategory: Option<String> = None;
    let mut metadata = DocumentMetadata::default();
    let mut titles: Vec<String> = Vec::new();
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "category" => category = Some(field.text().await.map_err(multipart_error)?),
            "subcategory" => subcategory = Some(field.text().await.map_err(multipart_error)?),
            "metadata" => {
                let raw = field.text().await.map_err(multipart_error)?;
                if !raw.trim().is_empty() {
                    metadata = serde_json::from_str(&raw)
                        .map_err(|e| ApiError::BadRequest(format!("invalid metadata: {}", e)))?;
                }
            }
            "title" => titles.push(field.text().await.map_err(multipart_error)?),
            "file" | "files" | "files[]" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                files.push((file_name, data.to_vec()));
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let category = category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("category is required".to_string()))?;
    let subcategory = subcategory
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if files.is_empty() {
        return Err(ApiError::BadRequest("no files in upload".to_string()));
    }

    let mut names: Vec<&str> = files.iter().map(|(name, _)| name.as_str()).collect();
    names.sort_unstable();
    let target = format!(
        "{}/{}/{}",
        category,
        subcategory.as_deref().unwrap_or(""),
        names.join(",")
    );
    let _permit = state.inflight.try_acquire("upload_documents", &target)?;

    let mut titles = titles.into_iter();
    let batch: Vec<UploadRequest> = files
        .into_iter()
        .map(|(file_name, data)| UploadRequest {
            file_name,
            data,
            title: titles.next().filter(|t| !t.trim().is_empty()),
            category: category.clone(),
            subcategory: subcategory.clone(),
            metadata: metadata.clone(),
        })
        .collect();

    let report = state.library.upload_batch(batch, None).await?;
    info!(
        admin = %admin.profile.id,
        succeeded = report.succeeded,
        failed = report.failed,
        "Admin upload finished"
    );

    let status = match report.status {
        BatchStatus::Complete => StatusCode::CREATED,
        BatchStatus::Partial => StatusCode::MULTI_STATUS,
        BatchStatus::Failed => StatusCode::UNPROCESSABLE_ENTITY,
    };
    Ok((status, Json(report)))
}

pub async fn update_document(
    State(state): State<AppState>,
    AdminViewer(_admin): AdminViewer,
    Path(id): Path<Uuid>,
    Json(update): Json<DocumentUpdate>,
) -> Result<Json<Document>, ApiError> {
    let _permit = state.inflight.try_acquire("update_document", &id.to_string())?;
    Ok(Json(state.library.update_document(id, update).await?))
}

/// Delete a document row and its stored file. A file that could not be
/// removed is reported as `orphaned_object` rather than failing the call.
pub async fn delete_document(
    State(state): State<AppState>,
    AdminViewer(_admin): AdminViewer,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let _permit = state.inflight.try_acquire("delete_document", &id.to_string())?;
    Ok(Json(state.library.delete_document(id).await?))
}

// =============================================================================
// USERS & SUBSCRIPTIONS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub search: Option<String>,
    pub role: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl UsersQuery {
    fn to_query(&self) -> Result<UserQuery, ApiError> {
        let mut query = UserQuery::default().with_page(self.page, self.page_size);
        query.search = self.search.clone();
        query.role = self
            .role
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .map(|r| UserRole::from(r.to_string()));
        if let Some(field) = &self.sort_by {
            query.sort = field.parse()?;
        }
        if let Some(order) = &self.sort_order {
            query.direction = order.parse::<SortDirection>()?;
        }
        Ok(query)
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    AdminViewer(_admin): AdminViewer,
    Query(params): Query<UsersQuery>,
) -> Result<Json<DashboardPage<UserProfile>>, ApiError> {
    let query = params.to_query()?;
    let users = state.accounts.list_users().await?;
    Ok(Json(query_users(users, &query)))
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionsQuery {
    pub status: Option<String>,
    pub user_id: Option<Uuid>,
    pub plan: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl SubscriptionsQuery {
    fn to_query(&self) -> Result<SubscriptionQuery, ApiError> {
        let mut query = SubscriptionQuery::default().with_page(self.page, self.page_size);
        query.status = match self.status.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(s) => Some(s.parse::<SubscriptionStatus>()?),
            None => None,
        };
        query.user_id = self.user_id;
        query.plan = self.plan.clone();
        if let Some(field) = &self.sort_by {
            query.sort = field.parse()?;
        }
        if let Some(order) = &self.sort_order {
            query.direction = order.parse::<SortDirection>()?;
        }
        Ok(query)
    }
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    AdminViewer(_admin): AdminViewer,
    Query(params): Query<SubscriptionsQuery>,
) -> Result<Json<DashboardPage<Subscription>>, ApiError> {
    let query = params.to_query()?;
    let subscriptions = state.accounts.list_subscriptions().await?;
    Ok(Json(query_subscriptions(subscriptions, &query)))
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionStatusChange {
    pub status: SubscriptionStatus,
}

pub async fn update_subscription(
    State(state): State<AppState>,
    AdminViewer(admin): AdminViewer,
    Path(id): Path<Uuid>,
    Json(change): Json<SubscriptionStatusChange>,
) -> Result<Json<Subscription>, ApiError> {
    let _permit = state
        .inflight
        .try_acquire("update_subscription", &id.to_string())?;
    let subscription = state
        .accounts
        .update_subscription_status(id, change.status)
        .await?;
    info!(
        admin = %admin.profile.id,
        subscription_id = %id,
        status = ?subscription.status,
        "Subscription updated"
    );
    Ok(Json(subscription))
}

// =============================================================================
// CONTENT PAGES
// =============================================================================

pub async fn list_pages(
    State(state): State<AppState>,
    AdminViewer(_admin): AdminViewer,
) -> Result<Json<Vec<ContentPage>>, ApiError> {
    Ok(Json(state.pages.list_pages().await?))
}

#[derive(Debug, Deserialize)]
pub struct PageInput {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub published: bool,
}

/// Slugs are lowercase ASCII letters, digits and hyphens.
fn valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 100
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub async fn upsert_page(
    State(state): State<AppState>,
    AdminViewer(_admin): AdminViewer,
    Path(slug): Path<String>,
    Json(input): Json<PageInput>,
) -> Result<Json<ContentPage>, ApiError> {
    if !valid_slug(&slug) {
        return Err(ApiError::BadRequest(format!("invalid page slug '{}'", slug)));
    }
    if input.title.trim().is_empty() {
        return Err(ApiError::BadRequest("page title must not be empty".to_string()));
    }
    let _permit = state.inflight.try_acquire("upsert_page", &slug)?;
    let page = ContentPage {
        slug,
        title: input.title.trim().to_string(),
        body: input.body,
        published: input.published,
        updated_at: Utc::now(),
    };
    Ok(Json(state.pages.upsert_page(&page).await?))
}

pub async fn delete_page(
    State(state): State<AppState>,
    AdminViewer(_admin): AdminViewer,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    let _permit = state.inflight.try_acquire("delete_page", &slug)?;
    state.pages.delete_page(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

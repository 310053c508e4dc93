//! Public browse/search and authenticated preview/download.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lexlib_core::{
    DateRange, Document, DocumentFilter, DocumentPage, FetchedFile, PageRequest, Preview,
    SortSpec,
};

use crate::auth::CurrentViewer;
use crate::query_types::QueryDate;
use crate::{ApiError, AppState};

/// Query parameters for `GET /api/v1/documents`.
#[derive(Debug, Default, Deserialize)]
pub struct ListDocumentsQuery {
    pub title: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Comma-separated; every term must match.
    pub keywords: Option<String>,
    pub date_from: Option<QueryDate>,
    pub date_to: Option<QueryDate>,
    /// MIME type or extension, e.g. `application/pdf` or `pdf`.
    pub document_type: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ListDocumentsQuery {
    pub fn filter(&self) -> Result<DocumentFilter, ApiError> {
        let mut filter = DocumentFilter::new();
        if let Some(title) = &self.title {
            filter = filter.with_title(title.as_str());
        }
        if let Some(category) = &self.category {
            filter = filter.with_category(category.as_str());
        }
        if let Some(subcategory) = &self.subcategory {
            filter = filter.with_subcategory(subcategory.as_str());
        }
        if let Some(keywords) = &self.keywords {
            filter = filter.with_keywords(keywords.as_str());
        }
        if let Some(document_type) = &self.document_type {
            filter = filter.with_document_type(document_type.as_str());
        }
        if let Some(status) = &self.status {
            filter = filter.with_status(status.as_str());
        }
        if self.date_from.is_some() || self.date_to.is_some() {
            let range = DateRange::new(
                self.date_from.map(|d| d.start_bound()),
                self.date_to.map(|d| d.end_bound()),
            )?;
            filter = filter.with_date_range(range);
        }
        Ok(filter)
    }

    pub fn sort(&self) -> Result<Option<SortSpec>, ApiError> {
        Ok(SortSpec::parse(
            self.sort_by.as_deref(),
            self.sort_order.as_deref(),
        )?)
    }

    pub fn page(&self) -> PageRequest {
        PageRequest::from_query(self.page, self.page_size)
    }
}

/// List one page of documents.
///
/// Unknown categories yield an empty page; a subcategory outside the
/// category is ignored; a page past the end is clamped.
pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<DocumentPage>, ApiError> {
    let filter = query.filter()?;
    let page = state
        .library
        .browse(&filter, query.sort()?, query.page())
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn search_documents(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.library.search(&query.q).await?))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.library.get(id).await?))
}

/// Body returned when a document cannot be shown inline.
#[derive(Debug, Serialize)]
struct DownloadInstead {
    preview: &'static str,
    document: Document,
    download_url: String,
}

pub async fn preview_document(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    match state.library.preview(&viewer, id).await? {
        Preview::Inline(file) => Ok(file_response(file, "inline")),
        Preview::DownloadInstead(document) => Ok(Json(DownloadInstead {
            preview: "download_instead",
            download_url: format!("/api/v1/documents/{}/download", document.id),
            document,
        })
        .into_response()),
    }
}

pub async fn download_document(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let file = state.library.download(&viewer, id).await?;
    Ok(file_response(file, "attachment"))
}

fn file_response(file: FetchedFile, disposition: &str) -> Response {
    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let content_disposition =
        HeaderValue::from_str(&format!("{}; filename=\"{}\"", disposition, file.file_name))
            .or_else(|_| HeaderValue::from_str(disposition))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, content_disposition),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        ],
        file.data,
    )
        .into_response()
}

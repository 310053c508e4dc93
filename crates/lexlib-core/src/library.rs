//! Document library service.
//!
//! Orchestrates the collaborators behind browsing, search, upload, update,
//! delete, preview and download. Holds no mutable state of its own.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::access::Viewer;
use crate::error::{Error, Result};
use crate::events::EventLogger;
use crate::files::{self, PreviewKind};
use crate::live_search::LiveSearch;
use crate::filter::{DocumentFilter, SortSpec};
use crate::logging;
use crate::models::*;
use crate::pagination::{DocumentPage, PageRequest, PageWindow};
use crate::resolver::FilterResolver;
use crate::taxonomy::Taxonomy;
use crate::traits::{DocumentRepository, EventRecorder, FileStore};

// =============================================================================
// UPLOAD TYPES
// =============================================================================

/// One file of an upload batch.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub data: Vec<u8>,
    /// Defaults to the file name without its extension.
    pub title: Option<String>,
    pub category: String,
    /// May be omitted for categories with a single subcategory.
    pub subcategory: Option<String>,
    /// Optional descriptive metadata; `size` and `type` are filled in.
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    Started,
    Stored,
    Completed,
    Failed,
}

/// Per-file progress estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub index: usize,
    pub file_name: String,
    pub stage: UploadStage,
    pub percent: u8,
}

/// Result for one file of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadOutcome {
    pub index: usize,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn succeeded(&self) -> bool {
        self.document.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every file succeeded.
    Complete,
    /// Some files succeeded, some failed.
    Partial,
    /// No file succeeded.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub status: BatchStatus,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<UploadOutcome>,
}

impl BatchReport {
    fn from_outcomes(outcomes: Vec<UploadOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
        let failed = outcomes.len() - succeeded;
        let status = match (succeeded, failed) {
            (_, 0) => BatchStatus::Complete,
            (0, _) => BatchStatus::Failed,
            _ => BatchStatus::Partial,
        };
        Self {
            status,
            succeeded,
            failed,
            outcomes,
        }
    }
}

// =============================================================================
// UPDATE / DELETE / FETCH TYPES
// =============================================================================

/// Admin edit of a document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    /// Metadata keys to overwrite; keys not present keep their stored value.
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub id: Uuid,
    /// Storage path left behind when the row was deleted but the file
    /// could not be removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orphaned_object: Option<String>,
}

/// File bytes ready to hand to a client.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Inline(FetchedFile),
    /// No viewer for this format; the client should offer a download.
    DownloadInstead(Document),
}

impl Preview {
    pub fn kind(&self) -> PreviewKind {
        match self {
            Preview::Inline(_) => PreviewKind::Inline,
            Preview::DownloadInstead(_) => PreviewKind::DownloadInstead,
        }
    }
}

// =============================================================================
// LIBRARY
// =============================================================================

#[derive(Clone)]
pub struct Library {
    documents: Arc<dyn DocumentRepository>,
    files: Arc<dyn FileStore>,
    events: EventLogger,
    taxonomy: &'static Taxonomy,
}

impl Library {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        files: Arc<dyn FileStore>,
        events: Arc<dyn EventRecorder>,
    ) -> Self {
        Self {
            documents,
            files,
            events: EventLogger::new(events),
            taxonomy: Taxonomy::standard(),
        }
    }

    pub fn taxonomy(&self) -> &'static Taxonomy {
        self.taxonomy
    }

    pub fn events(&self) -> &EventLogger {
        &self.events
    }

    pub fn repository(&self) -> Arc<dyn DocumentRepository> {
        Arc::clone(&self.documents)
    }

    /// A fresh debounced search session over this library's documents.
    pub fn live_search(&self) -> LiveSearch {
        LiveSearch::new(Arc::clone(&self.documents))
    }

    fn resolver(&self) -> FilterResolver<'static> {
        FilterResolver::new(self.taxonomy)
    }

    // ─── Browse & search ────────────────────────────────────────────────────

    /// List one page of documents matching `filter`.
    ///
    /// Unknown categories short-circuit to an empty page without a backend
    /// call. A page past the end is clamped to the last page.
    #[instrument(
        skip(self, filter),
        fields(subsystem = "core", component = "library", op = "browse", total_rows = tracing::field::Empty)
    )]
    pub async fn browse(
        &self,
        filter: &DocumentFilter,
        sort: Option<SortSpec>,
        page: PageRequest,
    ) -> Result<DocumentPage> {
        let query = self.resolver().resolve(filter, sort, page);
        if query.is_empty_result() {
            return Ok(DocumentPage::empty(page));
        }

        let start = Instant::now();
        let rows = self.documents.list_documents(&query).await?;
        let mut result = DocumentPage::from_rows(rows, page);

        // Past the last page the backend returns no rows and therefore no
        // total; probe the first page for it and refetch the clamped page.
        if result.documents.is_empty() && page.page > 1 {
            let first = PageRequest {
                page: 1,
                page_size: page.page_size,
            };
            let probe = self.documents.list_documents(&query.with_page(first)).await?;
            let total = probe.first().map(|r| r.total_rows.max(0) as u64).unwrap_or(0);
            let window = PageWindow::new(page, total);
            debug!(
                requested = page.page,
                clamped = window.current_page,
                "Requested page past the end, clamping"
            );
            result = if window.current_page == 1 {
                DocumentPage {
                    documents: probe.into_iter().map(|r| r.document).collect(),
                    pagination: window,
                }
            } else {
                let rows = self
                    .documents
                    .list_documents(&query.with_page(window.request()))
                    .await?;
                DocumentPage {
                    documents: rows.into_iter().map(|r| r.document).collect(),
                    pagination: window,
                }
            };
        }

        tracing::Span::current().record(logging::TOTAL_ROWS, result.pagination.total_rows);
        debug!(
            result_count = result.documents.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Browse complete"
        );
        Ok(result)
    }

    /// Server-ranked fuzzy search. Blank text yields no results.
    #[instrument(skip(self), fields(subsystem = "core", component = "library", op = "search"))]
    pub async fn search(&self, text: &str) -> Result<Vec<Document>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.documents.search_documents(text).await?;
        Ok(rows.into_iter().map(|r| r.document).collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<Document> {
        self.documents.get_document(id).await
    }

    // ─── Upload ─────────────────────────────────────────────────────────────

    /// Upload files one after another in the given order.
    ///
    /// A failed file does not stop the batch. Progress events are sent on
    /// `progress` when provided; a closed receiver is ignored.
    #[instrument(
        skip(self, batch, progress),
        fields(subsystem = "core", component = "library", op = "upload_batch", file_count = batch.len())
    )]
    pub async fn upload_batch(
        &self,
        batch: Vec<UploadRequest>,
        progress: Option<mpsc::Sender<UploadProgress>>,
    ) -> Result<BatchReport> {
        if batch.is_empty() {
            return Err(Error::InvalidInput("no files to upload".to_string()));
        }

        let mut outcomes = Vec::with_capacity(batch.len());
        for (index, request) in batch.into_iter().enumerate() {
            let file_name = request.file_name.clone();
            let report = |stage: UploadStage, percent: u8| {
                let progress = progress.clone();
                let file_name = file_name.clone();
                async move {
                    if let Some(tx) = progress {
                        let _ = tx
                            .send(UploadProgress {
                                index,
                                file_name,
                                stage,
                                percent,
                            })
                            .await;
                    }
                }
            };

            report(UploadStage::Started, 0).await;
            let outcome = match self.upload_one(request, || report(UploadStage::Stored, 50)).await {
                Ok(document) => {
                    report(UploadStage::Completed, 100).await;
                    UploadOutcome {
                        index,
                        file_name,
                        document: Some(document),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(index, file = %file_name, error = %e, "Upload failed");
                    report(UploadStage::Failed, 100).await;
                    UploadOutcome {
                        index,
                        file_name,
                        document: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let report = BatchReport::from_outcomes(outcomes);
        info!(
            status = ?report.status,
            succeeded = report.succeeded,
            failed = report.failed,
            "Upload batch finished"
        );
        Ok(report)
    }

    async fn upload_one<F, Fut>(&self, request: UploadRequest, on_stored: F) -> Result<Document>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        if request.data.is_empty() {
            return Err(Error::InvalidInput(format!(
                "file '{}' is empty",
                request.file_name
            )));
        }
        let (category, subcategory) = self
            .taxonomy
            .validate_pair(&request.category, request.subcategory.as_deref())?;

        let content_type = files::detect_content_type(&request.file_name, &request.data);
        let path = files::object_path(category, subcategory, &request.file_name);
        let title = request
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| default_title(&request.file_name));
        let metadata = DocumentMetadata {
            size: request.data.len() as u64,
            mime_type: content_type.clone(),
            ..request.metadata
        };

        self.files.upload(&path, request.data, &content_type).await?;
        on_stored().await;

        let record = NewDocumentRecord {
            title,
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            file_url: self.files.public_url(&path),
            file_path: path.clone(),
            metadata,
        };
        match self.documents.insert_document(record).await {
            Ok(document) => {
                info!(
                    document_id = %document.id,
                    category,
                    subcategory,
                    object_path = %path,
                    "Document uploaded"
                );
                Ok(document)
            }
            Err(e) => {
                // Don't leave a file behind without a row pointing at it.
                if let Err(cleanup) = self.files.remove(&path).await {
                    warn!(object_path = %path, error = %cleanup, "Failed to remove object after insert failure");
                }
                Err(e)
            }
        }
    }

    // ─── Update & delete ────────────────────────────────────────────────────

    /// Apply an admin edit.
    ///
    /// A category change needs a valid pair (the subcategory may be omitted
    /// only when the category has exactly one). A subcategory alone must
    /// belong to the stored category. Metadata keys are merged over the
    /// stored metadata.
    #[instrument(skip(self, update), fields(subsystem = "core", component = "library", op = "update_document", document_id = %id))]
    pub async fn update_document(&self, id: Uuid, update: DocumentUpdate) -> Result<Document> {
        let current = self.documents.get_document(id).await?;
        let mut patch = DocumentPatch::default();

        if let Some(title) = update.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(Error::InvalidInput("title must not be blank".to_string()));
            }
            patch.title = Some(title.to_string());
        }

        match (update.category.as_deref(), update.subcategory.as_deref()) {
            (Some(category), subcategory) => {
                let (c, s) = self.taxonomy.validate_pair(category, subcategory)?;
                patch.category = Some(c.to_string());
                patch.subcategory = Some(s.to_string());
            }
            (None, Some(subcategory)) => {
                let (_, s) = self
                    .taxonomy
                    .validate_pair(&current.category, Some(subcategory))?;
                patch.subcategory = Some(s.to_string());
            }
            (None, None) => {}
        }

        if let Some(overrides) = update.metadata {
            patch.metadata = Some(merge_metadata(&current.metadata, overrides)?);
        }

        if patch.is_empty() {
            return Err(Error::InvalidInput("nothing to update".to_string()));
        }

        let updated = self.documents.update_document(id, &patch).await?;
        info!("Document updated");
        Ok(updated)
    }

    /// Delete a document's row, then its stored file.
    ///
    /// Once the row is gone the document no longer exists for readers, so a
    /// failure to remove the file is reported as an orphan, not an error.
    #[instrument(skip(self), fields(subsystem = "core", component = "library", op = "delete_document", document_id = %id))]
    pub async fn delete_document(&self, id: Uuid) -> Result<DeleteOutcome> {
        let document = self.documents.get_document(id).await?;
        self.documents.delete_document_row(id).await?;

        let orphaned_object = match document.object_path() {
            Some(path) => match self.files.remove(&path).await {
                Ok(()) => None,
                Err(e) => {
                    warn!(object_path = %path, error = %e, "Row deleted but stored file was not removed");
                    Some(path)
                }
            },
            None => {
                debug!(file_url = %document.file_url, "No storage path for document, nothing to remove");
                None
            }
        };

        info!(orphaned = orphaned_object.is_some(), "Document deleted");
        Ok(DeleteOutcome {
            id,
            orphaned_object,
        })
    }

    // ─── Preview & download ─────────────────────────────────────────────────

    async fn fetch(&self, document: &Document) -> Result<FetchedFile> {
        let path = document.object_path().ok_or_else(|| {
            Error::Storage(format!("document {} has no stored file", document.id))
        })?;
        let data = self.files.download(&path).await?;
        let file_name = document.download_name();
        let content_type = if document.metadata.mime_type.is_empty() {
            files::detect_content_type(&file_name, &data)
        } else {
            document.metadata.mime_type.clone()
        };
        Ok(FetchedFile {
            file_name,
            content_type,
            data,
        })
    }

    /// Preview a document for a signed-in viewer and record a `view` event.
    #[instrument(skip(self, viewer), fields(subsystem = "core", component = "library", op = "preview", document_id = %id, user_id = %viewer.profile.id))]
    pub async fn preview(&self, viewer: &Viewer, id: Uuid) -> Result<Preview> {
        let document = self.documents.get_document(id).await?;
        let kind = PreviewKind::for_mime(&document.metadata.mime_type);

        let preview = match kind {
            PreviewKind::Inline => Preview::Inline(self.fetch(&document).await?),
            PreviewKind::DownloadInstead => {
                debug!(mime = %document.metadata.mime_type, "No inline preview for format");
                Preview::DownloadInstead(document)
            }
        };

        self.events
            .record(EventKind::View, viewer.profile.id, Some(id))
            .await;
        Ok(preview)
    }

    /// Fetch a document's bytes for download.
    ///
    /// The `download` event is recorded only after the fetch succeeded.
    #[instrument(skip(self, viewer), fields(subsystem = "core", component = "library", op = "download", document_id = %id, user_id = %viewer.profile.id))]
    pub async fn download(&self, viewer: &Viewer, id: Uuid) -> Result<FetchedFile> {
        viewer.require_download(Utc::now())?;
        let document = self.documents.get_document(id).await?;
        let file = self.fetch(&document).await?;
        self.events
            .record(EventKind::Download, viewer.profile.id, Some(id))
            .await;
        Ok(file)
    }
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library").finish_non_exhaustive()
    }
}

fn default_title(file_name: &str) -> String {
    let name = files::sanitize_filename(file_name);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name,
    }
}

/// Overlay `overrides` onto `current`. `size` and `type` describe the stored
/// file and cannot be overridden.
fn merge_metadata(
    current: &DocumentMetadata,
    overrides: serde_json::Map<String, serde_json::Value>,
) -> Result<DocumentMetadata> {
    let mut merged = match serde_json::to_value(current)? {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    for (key, value) in overrides {
        if key == "size" || key == "type" {
            continue;
        }
        if value.is_null() {
            merged.remove(&key);
        } else {
            merged.insert(key, value);
        }
    }
    serde_json::from_value(serde_json::Value::Object(merged))
        .map_err(|e| Error::InvalidInput(format!("invalid metadata: {}", e)))
}

//! In-process backend.
//!
//! Implements every collaborator trait over in-memory tables. Used for
//! local runs (`LEXLIB_BACKEND=memory`) and as the backend in tests, where
//! its failure switches simulate a misbehaving remote service.
//!
//! ```
//! use lexlib_core::memory::InMemoryBackend;
//! use lexlib_core::FileStore;
//!
//! let backend = InMemoryBackend::new().with_failing_upload("broken.pdf");
//! assert!(backend
//!     .public_url("Bills/Government Bills/x.pdf")
//!     .ends_with("/documents/Bills/Government Bills/x.pdf"));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::defaults::STORAGE_BUCKET;
use crate::error::{Error, Result};
use crate::models::*;
use crate::resolver::RemoteQuery;
use crate::traits::*;

#[derive(Debug, Default)]
struct Tables {
    documents: Vec<Document>,
    objects: HashMap<String, Vec<u8>>,
    events: Vec<AccessEvent>,
    users: Vec<UserProfile>,
    tokens: HashMap<String, Uuid>,
    subscriptions: Vec<Subscription>,
    pages: Vec<ContentPage>,
}

#[derive(Debug, Default)]
struct Faults {
    /// File names whose upload is rejected.
    upload_names: HashSet<String>,
    fail_removals: bool,
    fail_events: bool,
    fail_downloads: bool,
}

/// Shared in-memory tables. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<std::sync::RwLock<Faults>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Fault injection ────────────────────────────────────────────────────

    fn with_faults(self, f: impl FnOnce(&mut Faults)) -> Self {
        if let Ok(mut faults) = self.faults.write() {
            f(&mut faults);
        }
        self
    }

    fn faults<T>(&self, f: impl FnOnce(&Faults) -> T) -> T
    where
        T: Default,
    {
        self.faults.read().map(|faults| f(&faults)).unwrap_or_default()
    }

    /// Reject uploads whose object path ends with `file_name`.
    pub fn with_failing_upload(self, file_name: impl Into<String>) -> Self {
        let name = file_name.into();
        self.with_faults(|f| {
            f.upload_names.insert(name);
        })
    }

    pub fn with_failing_removals(self) -> Self {
        self.with_faults(|f| f.fail_removals = true)
    }

    pub fn with_failing_events(self) -> Self {
        self.with_faults(|f| f.fail_events = true)
    }

    pub fn with_failing_downloads(self) -> Self {
        self.with_faults(|f| f.fail_downloads = true)
    }

    // ─── Seeding & inspection ───────────────────────────────────────────────

    /// Register a user reachable through `token`.
    pub async fn add_user(&self, profile: UserProfile, token: impl Into<String>) {
        let mut tables = self.tables.write().await;
        tables.tokens.insert(token.into(), profile.id);
        tables.users.retain(|u| u.id != profile.id);
        tables.users.push(profile);
    }

    pub async fn add_subscription(&self, subscription: Subscription) {
        self.tables.write().await.subscriptions.push(subscription);
    }

    /// Insert a document row as-is, optionally with its stored file.
    pub async fn seed_document(&self, document: Document, file: Option<Vec<u8>>) {
        let mut tables = self.tables.write().await;
        if let (Some(data), Some(path)) = (file, document.object_path()) {
            tables.objects.insert(path, data);
        }
        tables.documents.push(document);
    }

    pub async fn events(&self) -> Vec<AccessEvent> {
        self.tables.read().await.events.clone()
    }

    pub async fn documents(&self) -> Vec<Document> {
        self.tables.read().await.documents.clone()
    }

    pub async fn stored_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.tables.read().await.objects.keys().cloned().collect();
        paths.sort();
        paths
    }
}

fn rows(documents: Vec<&Document>, total: usize) -> Vec<DocumentRow> {
    documents
        .into_iter()
        .map(|d| DocumentRow {
            document: d.clone(),
            total_rows: total as i64,
        })
        .collect()
}

#[async_trait]
impl DocumentRepository for InMemoryBackend {
    async fn list_documents(&self, query: &RemoteQuery) -> Result<Vec<DocumentRow>> {
        let tables = self.tables.read().await;
        let matched = query.select(&tables.documents);
        let total = matched.len();
        // Like the remote listing: no clamping, a page past the end is empty.
        let page = matched
            .into_iter()
            .skip(query.page.offset() as usize)
            .take(query.page.page_size as usize)
            .collect();
        Ok(rows(page, total))
    }

    async fn search_documents(&self, text: &str) -> Result<Vec<DocumentRow>> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let tables = self.tables.read().await;
        let mut hits: Vec<(u8, &Document)> = tables
            .documents
            .iter()
            .filter_map(|d| {
                if d.title.to_lowercase().contains(&needle) {
                    Some((0, d))
                } else if d
                    .metadata
                    .keywords
                    .iter()
                    .any(|k| k.to_lowercase().contains(&needle))
                    || d.category.to_lowercase().contains(&needle)
                    || d.subcategory.to_lowercase().contains(&needle)
                {
                    Some((1, d))
                } else {
                    None
                }
            })
            .collect();
        // Title hits rank first, newest first within a rank.
        hits.sort_by(|(ra, a), (rb, b)| ra.cmp(rb).then_with(|| b.created_at.cmp(&a.created_at)));
        let total = hits.len();
        Ok(rows(hits.into_iter().map(|(_, d)| d).collect(), total))
    }

    async fn get_document(&self, id: Uuid) -> Result<Document> {
        self.tables
            .read()
            .await
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(Error::DocumentNotFound(id))
    }

    async fn insert_document(&self, record: NewDocumentRecord) -> Result<Document> {
        let document = Document {
            id: Uuid::now_v7(),
            title: record.title,
            category: record.category,
            subcategory: record.subcategory,
            file_url: record.file_url,
            file_path: record.file_path,
            created_at: Utc::now(),
            metadata: record.metadata,
        };
        self.tables.write().await.documents.push(document.clone());
        Ok(document)
    }

    async fn update_document(&self, id: Uuid, patch: &DocumentPatch) -> Result<Document> {
        let mut tables = self.tables.write().await;
        let document = tables
            .documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(Error::DocumentNotFound(id))?;
        if let Some(title) = &patch.title {
            document.title = title.clone();
        }
        if let Some(category) = &patch.category {
            document.category = category.clone();
        }
        if let Some(subcategory) = &patch.subcategory {
            document.subcategory = subcategory.clone();
        }
        if let Some(metadata) = &patch.metadata {
            document.metadata = metadata.clone();
        }
        Ok(document.clone())
    }

    async fn delete_document_row(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        let before = tables.documents.len();
        tables.documents.retain(|d| d.id != id);
        if tables.documents.len() == before {
            return Err(Error::DocumentNotFound(id));
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for InMemoryBackend {
    async fn upload(&self, path: &str, data: Vec<u8>, _content_type: &str) -> Result<()> {
        let rejected = self.faults(|f| f.upload_names.iter().any(|name| path.ends_with(name.as_str())));
        if rejected {
            return Err(Error::Storage(format!("upload rejected for '{}'", path)));
        }
        let mut tables = self.tables.write().await;
        if tables.objects.contains_key(path) {
            return Err(Error::Storage(format!("object '{}' already exists", path)));
        }
        tables.objects.insert(path.to_string(), data);
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        if self.faults(|f| f.fail_downloads) {
            return Err(Error::Storage(format!("download failed for '{}'", path)));
        }
        self.tables
            .read()
            .await
            .objects
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("object '{}'", path)))
    }

    async fn remove(&self, path: &str) -> Result<()> {
        if self.faults(|f| f.fail_removals) {
            return Err(Error::Storage(format!("remove failed for '{}'", path)));
        }
        self.tables.write().await.objects.remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://storage/object/public/{}/{}", STORAGE_BUCKET, path)
    }
}

#[async_trait]
impl EventRecorder for InMemoryBackend {
    async fn record_event(&self, event: &AccessEvent) -> Result<()> {
        if self.faults(|f| f.fail_events) {
            return Err(Error::Remote {
                status: 503,
                message: "event sink unavailable".to_string(),
            });
        }
        self.tables.write().await.events.push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl AccountDirectory for InMemoryBackend {
    async fn authenticate(&self, token: &str) -> Result<UserProfile> {
        let tables = self.tables.read().await;
        let id = tables
            .tokens
            .get(token)
            .ok_or_else(|| Error::Unauthorized("invalid or expired token".to_string()))?;
        tables
            .users
            .iter()
            .find(|u| u.id == *id)
            .cloned()
            .ok_or_else(|| Error::Unauthorized("user no longer exists".to_string()))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn subscription_for(&self, user_id: Uuid) -> Result<Option<Subscription>> {
        Ok(self
            .tables
            .read()
            .await
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| s.starts_at)
            .cloned())
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        Ok(self.tables.read().await.subscriptions.clone())
    }

    async fn update_subscription_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Subscription> {
        let mut tables = self.tables.write().await;
        let subscription = tables
            .subscriptions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("subscription {}", id)))?;
        subscription.status = status;
        Ok(subscription.clone())
    }
}

#[async_trait]
impl PageRepository for InMemoryBackend {
    async fn get_page(&self, slug: &str) -> Result<ContentPage> {
        self.tables
            .read()
            .await
            .pages
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("page '{}'", slug)))
    }

    async fn list_pages(&self) -> Result<Vec<ContentPage>> {
        let mut pages = self.tables.read().await.pages.clone();
        pages.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(pages)
    }

    async fn upsert_page(&self, page: &ContentPage) -> Result<ContentPage> {
        let stored = ContentPage {
            updated_at: Utc::now(),
            ..page.clone()
        };
        let mut tables = self.tables.write().await;
        tables.pages.retain(|p| p.slug != stored.slug);
        tables.pages.push(stored.clone());
        Ok(stored)
    }

    async fn delete_page(&self, slug: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let before = tables.pages.len();
        tables.pages.retain(|p| p.slug != slug);
        if tables.pages.len() == before {
            return Err(Error::NotFound(format!("page '{}'", slug)));
        }
        Ok(())
    }
}

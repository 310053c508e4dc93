//! Collaborator traits.
//!
//! Every call lexlib makes against the hosted backend goes through one of
//! these traits, so services can run against the HTTP client or the
//! in-memory backend interchangeably.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::resolver::RemoteQuery;

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Remote document gateway: the row store plus the server-side listing and
/// fuzzy search functions.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// List documents for a resolved query.
    ///
    /// Rows come back ordered per the query's sort, each carrying the
    /// total number of matching rows. Callers must not send an
    /// [empty-result](RemoteQuery::is_empty_result) query.
    async fn list_documents(&self, query: &RemoteQuery) -> Result<Vec<DocumentRow>>;

    /// Fuzzy text search ranked by the backend.
    async fn search_documents(&self, text: &str) -> Result<Vec<DocumentRow>>;

    /// Fetch one document. Fails with `DocumentNotFound` when absent.
    async fn get_document(&self, id: Uuid) -> Result<Document>;

    /// Insert a document row and return it as stored.
    async fn insert_document(&self, record: NewDocumentRecord) -> Result<Document>;

    /// Apply a partial update and return the stored row.
    async fn update_document(&self, id: Uuid, patch: &DocumentPatch) -> Result<Document>;

    /// Delete the document row only; the stored file is removed separately.
    async fn delete_document_row(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// FILE STORAGE
// =============================================================================

/// Object storage for document files.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store bytes at `path`.
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Fetch the bytes stored at `path`.
    async fn download(&self, path: &str) -> Result<Vec<u8>>;

    /// Remove the object at `path`.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Public URL under which `path` is served.
    fn public_url(&self, path: &str) -> String;
}

// =============================================================================
// EVENTS
// =============================================================================

/// Sink for view/download/login analytics events.
#[async_trait]
pub trait EventRecorder: Send + Sync {
    async fn record_event(&self, event: &AccessEvent) -> Result<()>;
}

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Users, their roles and subscriptions.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Resolve a bearer access token to the user's profile.
    ///
    /// Fails with `Unauthorized` for unknown or expired tokens.
    async fn authenticate(&self, token: &str) -> Result<UserProfile>;

    async fn list_users(&self) -> Result<Vec<UserProfile>>;

    /// The user's most recent subscription, if any.
    async fn subscription_for(&self, user_id: Uuid) -> Result<Option<Subscription>>;

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>>;

    async fn update_subscription_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Subscription>;
}

// =============================================================================
// CONTENT PAGES
// =============================================================================

#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Fetch a page by slug. Fails with `NotFound` when absent.
    async fn get_page(&self, slug: &str) -> Result<ContentPage>;

    async fn list_pages(&self) -> Result<Vec<ContentPage>>;

    /// Insert or replace the page with `page.slug`.
    async fn upsert_page(&self, page: &ContentPage) -> Result<ContentPage>;

    async fn delete_page(&self, slug: &str) -> Result<()>;
}

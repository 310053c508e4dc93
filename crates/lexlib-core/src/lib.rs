//! # lexlib-core
//!
//! Core types, taxonomy, filter resolution and services for the lexlib
//! legal document library.
//!
//! Persistence, authentication, search ranking and file storage live in a
//! hosted backend reached through the traits in [`traits`]. This crate holds
//! the logic that sits in front of it: the category taxonomy, the filter
//! resolver, pagination, access policy and the library services.

pub mod access;
pub mod dashboard;
pub mod defaults;
pub mod error;
pub mod events;
pub mod files;
pub mod filter;
pub mod inflight;
pub mod library;
pub mod live_search;
pub mod logging;
pub mod memory;
pub mod models;
pub mod pagination;
pub mod resolver;
pub mod taxonomy;
pub mod traits;

// Re-export commonly used types at crate root
pub use access::{resolve_viewer, Viewer};
pub use dashboard::{
    query_subscriptions, query_users, DashboardPage, SubscriptionQuery, SubscriptionSortField,
    UserQuery, UserSortField,
};
pub use error::{Error, Result};
pub use events::EventLogger;
pub use files::{detect_content_type, sanitize_filename, PreviewKind};
pub use filter::{DateRange, DocumentFilter, SortDirection, SortField, SortSpec};
pub use inflight::{InflightGuard, InflightPermit};
pub use library::{
    BatchReport, BatchStatus, DeleteOutcome, DocumentUpdate, FetchedFile, Library, Preview,
    UploadOutcome, UploadProgress, UploadRequest, UploadStage,
};
pub use live_search::{LiveSearch, LiveSearchOutcome};
pub use memory::InMemoryBackend;
pub use models::*;
pub use pagination::{DocumentPage, PageRequest, PageWindow};
pub use resolver::{FilterResolver, QueryScope, RemoteQuery};
pub use taxonomy::{Category, Taxonomy};
pub use traits::*;

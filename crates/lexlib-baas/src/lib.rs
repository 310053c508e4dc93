//! # lexlib-baas
//!
//! HTTP client for the hosted backend behind lexlib.
//!
//! [`BaasClient`] implements every collaborator trait of `lexlib_core`
//! against the backend's REST surface:
//!
//! - rows and RPC functions under `/rest/v1` (documents, events, profiles,
//!   subscriptions, content pages)
//! - object storage under `/storage/v1`
//! - token verification under `/auth/v1`
//!
//! Idempotent reads are retried on transport failures, 429 and 5xx;
//! mutations are sent exactly once.

mod accounts;
pub mod client;
pub mod config;
pub mod documents;
mod events;
pub mod error;
mod pages;
pub mod storage;

pub use client::BaasClient;
pub use config::BaasConfig;
pub use documents::ListDocumentsParams;
pub use error::{error_message, to_lexlib_error, BaasErrorCode};
pub use storage::encode_object_path;

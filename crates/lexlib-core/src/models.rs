//! Core data models for lexlib.
//!
//! Documents, their typed metadata, access events, accounts, subscriptions
//! and content pages. Field names follow the hosted backend's column names so
//! records deserialize directly from its JSON rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::defaults::MISSING_LABEL;

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Publication status stored in document metadata.
///
/// Unknown strings are preserved as [`DocumentStatus::Other`] rather than
/// rejected, since the metadata bag is written by several tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentStatus {
    Draft,
    Published,
    Archived,
    Other(String),
}

impl DocumentStatus {
    /// Human-readable label.
    pub fn label(&self) -> &str {
        match self {
            DocumentStatus::Draft => "Draft",
            DocumentStatus::Published => "Published",
            DocumentStatus::Archived => "Archived",
            DocumentStatus::Other(s) => s.as_str(),
        }
    }

    /// Wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Published => "published",
            DocumentStatus::Archived => "archived",
            DocumentStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for DocumentStatus {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "draft" => DocumentStatus::Draft,
            "published" => DocumentStatus::Published,
            "archived" => DocumentStatus::Archived,
            _ => DocumentStatus::Other(s),
        }
    }
}

impl From<DocumentStatus> for String {
    fn from(s: DocumentStatus) -> Self {
        s.as_str().to_string()
    }
}

/// Typed document metadata.
///
/// `size` and `type` are required for display and default to `0` / `""`
/// when the backend omits them. Every other key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// File size in bytes.
    #[serde(default, deserialize_with = "lenient_size")]
    pub size: u64,

    /// MIME type of the stored file.
    #[serde(rename = "type", default, deserialize_with = "lenient_mime")]
    pub mime_type: String,

    #[serde(
        default,
        deserialize_with = "lenient_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<DocumentStatus>,

    /// Act number for legislation (e.g. "No. 4 of 2023").
    #[serde(
        rename = "actNumber",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub act_number: Option<String>,

    /// Act type for legislation (e.g. "Principal", "Amendment").
    #[serde(
        rename = "actType",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub act_type: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_keywords",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub keywords: Vec<String>,
}

impl DocumentMetadata {
    /// Status label, `"N/A"` when absent.
    pub fn status_label(&self) -> &str {
        self.status
            .as_ref()
            .map(|s| s.label())
            .unwrap_or(MISSING_LABEL)
    }

    /// Act number, `"N/A"` when absent.
    pub fn act_number_label(&self) -> &str {
        self.act_number.as_deref().unwrap_or(MISSING_LABEL)
    }

    /// Act type, `"N/A"` when absent.
    pub fn act_type_label(&self) -> &str {
        self.act_type.as_deref().unwrap_or(MISSING_LABEL)
    }
}

/// Accepts a number, a numeric string, or null for `size`.
fn lenient_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Any non-string `type` reads as unknown.
fn lenient_mime<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}

/// Accepts a string or a number; anything else, and blank strings, read as
/// absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<DocumentStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.map(DocumentStatus::from))
}

/// A `null` or non-object metadata column reads as all defaults.
fn lenient_metadata<'de, D>(deserializer: D) -> Result<DocumentMetadata, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        value @ serde_json::Value::Object(_) => {
            serde_json::from_value(value).map_err(<D::Error as serde::de::Error>::custom)
        }
        _ => Ok(DocumentMetadata::default()),
    }
}

/// Accepts an array of strings, a comma-separated string, or null.
fn lenient_keywords<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let raw: Vec<String> = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        serde_json::Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(raw
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect())
}

/// A document record as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub subcategory: String,
    /// Public URL of the stored file.
    pub file_url: String,
    /// Object path inside the storage bucket.
    #[serde(default)]
    pub file_path: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_metadata")]
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Storage object path for this document.
    ///
    /// Older rows carry only `file_url`; for those the path is recovered
    /// from the public URL (`.../object/public/<bucket>/<path>`).
    pub fn object_path(&self) -> Option<String> {
        if !self.file_path.is_empty() {
            return Some(self.file_path.clone());
        }
        let (_, rest) = self.file_url.split_once("/object/public/")?;
        let (_bucket, path) = rest.split_once('/')?;
        if path.is_empty() {
            return None;
        }
        Some(
            urlencoding::decode(path)
                .map(|p| p.into_owned())
                .unwrap_or_else(|_| path.to_string()),
        )
    }

    /// File name presented to downloaders.
    pub fn download_name(&self) -> String {
        let base = self
            .object_path()
            .and_then(|p| p.rsplit('/').next().map(str::to_string))
            .unwrap_or_default();
        // Stored names are prefixed with "<uuid>-"; strip it back off.
        let base = match (base.get(..36), base.get(36..37), base.get(37..)) {
            (Some(prefix), Some("-"), Some(rest)) if Uuid::parse_str(prefix).is_ok() => {
                rest.to_string()
            }
            _ => base,
        };
        let base = if base.is_empty() {
            crate::files::sanitize_filename(&self.title)
        } else {
            base
        };
        crate::files::sanitize_filename(&base)
    }
}

/// A listing/search row: a document plus the denormalized total row count
/// the backend attaches to every row of a paged response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRow {
    #[serde(flatten)]
    pub document: Document,
    #[serde(default)]
    pub total_rows: i64,
}

/// Row written by the backend when a document is created.
#[derive(Debug, Clone, Serialize)]
pub struct NewDocumentRecord {
    pub title: String,
    pub category: String,
    pub subcategory: String,
    pub file_url: String,
    pub file_path: String,
    pub metadata: DocumentMetadata,
}

/// Partial update sent to the backend. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Full replacement metadata (already merged with the stored value).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.subcategory.is_none()
            && self.metadata.is_none()
    }
}

// =============================================================================
// ACCESS EVENTS
// =============================================================================

/// Kind of recorded access event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    View,
    Download,
    Login,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::View => "view",
            EventKind::Download => "download",
            EventKind::Login => "login",
        }
    }
}

/// An access event recorded for analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessEvent {
    #[serde(rename = "event_type")]
    pub kind: EventKind,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
}

impl AccessEvent {
    pub fn new(kind: EventKind, user_id: Uuid, document_id: Option<Uuid>) -> Self {
        Self {
            kind,
            user_id,
            document_id,
            occurred_at: Utc::now(),
        }
    }
}

// =============================================================================
// ACCOUNTS & SUBSCRIPTIONS
// =============================================================================

/// Role stored on a user profile. Anything other than `admin` is a member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    Admin,
    #[default]
    Member,
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        if s.trim().eq_ignore_ascii_case("admin") {
            UserRole::Admin
        } else {
            UserRole::Member
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => "admin".to_string(),
            UserRole::Member => "member".to_string(),
        }
    }
}

/// A registered library user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Display name, falling back to the email address.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Subscription lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Expired,
    Cancelled,
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown subscription status '{}'",
                other
            ))),
        }
    }
}

/// A user's paid access to downloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: String,
    pub status: SubscriptionStatus,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Active status and `now` inside `[starts_at, ends_at]`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active
            && self.starts_at <= now
            && self.ends_at.map_or(true, |end| now <= end)
    }
}

// =============================================================================
// CONTENT PAGES
// =============================================================================

/// An editable static page (about, terms, pricing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPage {
    pub slug: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub published: bool,
    pub updated_at: DateTime<Utc>,
}

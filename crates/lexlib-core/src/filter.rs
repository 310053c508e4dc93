//! Document filter and sort value types.
//!
//! A [`DocumentFilter`] is a plain value built through its builder methods.
//! Selecting a category always clears the subcategory, and a subcategory
//! can only be set together with (or after) its category, so the only way to
//! end up with a mismatched pair is deserializing one from a request. The
//! [`FilterResolver`](crate::resolver::FilterResolver) normalizes that case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// DATE RANGE
// =============================================================================

/// Inclusive creation-date range. An absent bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(Error::InvalidInput(
                    "date range start must not be after its end".to_string(),
                ));
            }
        }
        Ok(Self { start, end })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Inclusive on both bounds.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at <= e)
    }
}

// =============================================================================
// DOCUMENT FILTER
// =============================================================================

/// User-facing document filter. Every field is optional; an empty filter
/// matches every document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFilter {
    /// Title text, forwarded raw to the backend for fuzzy matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Category name; absent or empty means all categories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Subcategory name; only meaningful together with `category`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Free-form keyword text, forwarded raw.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "DateRange::is_unbounded")]
    pub date_range: DateRange,
    /// MIME type or extension class (e.g. "application/pdf", "pdf").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Treat blank strings as absent.
fn non_blank(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl DocumentFilter {
    /// Create an empty filter (matches all documents).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = non_blank(title);
        self
    }

    /// Select a category. Any previously selected subcategory is cleared.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = non_blank(category);
        self.subcategory = None;
        self
    }

    /// Select a subcategory. Ignored unless a category is already selected.
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        if self.category.is_some() {
            self.subcategory = non_blank(subcategory);
        }
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = non_blank(keywords);
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = non_blank(document_type);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = non_blank(status);
        self
    }

    /// Check if the filter is completely empty (matches all documents).
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.subcategory.is_none()
            && self.keywords.is_none()
            && self.date_range.is_unbounded()
            && self.document_type.is_none()
            && self.status.is_none()
    }
}

// =============================================================================
// SORT SPEC
// =============================================================================

/// Field a document listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    Title,
    Category,
    /// `metadata.size`
    Size,
}

impl SortField {
    /// Column name understood by the backend's listing function.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Title => "title",
            SortField::Category => "category",
            SortField::Size => "metadata.size",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "created_at" | "date" => Ok(SortField::CreatedAt),
            "title" => Ok(SortField::Title),
            "category" => Ok(SortField::Category),
            "size" | "metadata.size" => Ok(SortField::Size),
            other => Err(Error::InvalidInput(format!(
                "unknown sort field '{}' (expected created_at, title, category or size)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(Error::InvalidInput(format!(
                "unknown sort direction '{}' (expected asc or desc)",
                other
            ))),
        }
    }
}

/// Ordering of a document listing. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Parse optional `sort_by` / `sort_order` request parameters.
    ///
    /// A missing field yields the default spec. A field without a direction
    /// sorts ascending, except `created_at` which sorts newest first.
    pub fn parse(field: Option<&str>, direction: Option<&str>) -> Result<Option<Self>> {
        let field = match field.map(str::trim).filter(|f| !f.is_empty()) {
            Some(f) => f.parse::<SortField>()?,
            None => return Ok(None),
        };
        let direction = match direction.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => d.parse::<SortDirection>()?,
            None if field == SortField::CreatedAt => SortDirection::Desc,
            None => SortDirection::Asc,
        };
        Ok(Some(Self { field, direction }))
    }
}

//! Filter resolution.
//!
//! [`FilterResolver::resolve`] is the single entry point that turns a
//! user-facing [`DocumentFilter`] plus sort and page request into a
//! [`RemoteQuery`]. Invalid combinations are corrected rather than rejected:
//!
//! 1. An unknown category fails closed: the query matches nothing and is
//!    never sent to the backend.
//! 2. A subcategory outside the selected category is dropped, widening the
//!    query to the whole category.
//! 3. Title and keyword text are forwarded raw; fuzzy matching is remote.
//! 4. Date ranges are inclusive, and an absent bound is unbounded.
//! 5. An explicit sort wins over the default `created_at desc`.
//! 6. Pages are 1-indexed and clamped once the row total is known.
//!
//! The same query can be applied to an already-fetched slice with
//! [`RemoteQuery::apply_in_memory`].

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::filter::{DateRange, DocumentFilter, SortDirection, SortField, SortSpec};
use crate::models::Document;
use crate::pagination::{DocumentPage, PageRequest, PageWindow};
use crate::taxonomy::Taxonomy;

/// Which part of the taxonomy a query covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum QueryScope {
    /// Guaranteed zero rows.
    Empty,
    /// Every category.
    All,
    Category { category: String },
    Subcategory {
        category: String,
        subcategory: String,
    },
}

/// A validated query ready for the remote listing call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteQuery {
    pub scope: QueryScope,
    pub title: Option<String>,
    pub keywords: Option<String>,
    pub date_range: DateRange,
    pub document_type: Option<String>,
    pub status: Option<String>,
    pub sort: SortSpec,
    pub page: PageRequest,
}

impl RemoteQuery {
    /// True when the query can only ever return zero rows.
    pub fn is_empty_result(&self) -> bool {
        matches!(self.scope, QueryScope::Empty)
    }

    pub fn category(&self) -> Option<&str> {
        match &self.scope {
            QueryScope::Category { category } | QueryScope::Subcategory { category, .. } => {
                Some(category)
            }
            _ => None,
        }
    }

    pub fn subcategory(&self) -> Option<&str> {
        match &self.scope {
            QueryScope::Subcategory { subcategory, .. } => Some(subcategory),
            _ => None,
        }
    }

    /// Same query addressing a different page.
    pub fn with_page(&self, page: PageRequest) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Whether `doc` satisfies every predicate of this query.
    ///
    /// Text matching is a case-insensitive substring test; the backend's
    /// fuzzy ranking is not reproduced.
    pub fn matches(&self, doc: &Document) -> bool {
        let in_scope = match &self.scope {
            QueryScope::Empty => false,
            QueryScope::All => true,
            QueryScope::Category { category } => doc.category == *category,
            QueryScope::Subcategory {
                category,
                subcategory,
            } => doc.category == *category && doc.subcategory == *subcategory,
        };
        if !in_scope || !self.date_range.contains(doc.created_at) {
            return false;
        }

        if let Some(title) = &self.title {
            if !contains_ci(&doc.title, title) {
                return false;
            }
        }

        if let Some(keywords) = &self.keywords {
            let terms = keywords
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty());
            for term in terms {
                if !doc.metadata.keywords.iter().any(|k| contains_ci(k, term)) {
                    return false;
                }
            }
        }

        if let Some(wanted) = &self.document_type {
            if !matches_document_type(doc, wanted) {
                return false;
            }
        }

        if let Some(wanted) = &self.status {
            let status = doc.metadata.status.as_ref().map(|s| s.as_str());
            if !status.is_some_and(|s| s.eq_ignore_ascii_case(wanted.trim())) {
                return false;
            }
        }

        true
    }

    /// Every matching document in query order, unpaginated.
    pub fn select<'d>(&self, documents: &'d [Document]) -> Vec<&'d Document> {
        let mut matched: Vec<&Document> = documents.iter().filter(|d| self.matches(d)).collect();
        matched.sort_by(|a, b| compare(a, b, self.sort));
        matched
    }

    /// Filter, sort and paginate an in-memory slice the way the backend would.
    ///
    /// The page is clamped against the filtered total.
    pub fn apply_in_memory(&self, documents: &[Document]) -> DocumentPage {
        let matched = self.select(documents);
        let window = PageWindow::new(self.page, matched.len() as u64);
        let documents = matched
            .into_iter()
            .skip(window.offset() as usize)
            .take(window.page_size as usize)
            .cloned()
            .collect();

        DocumentPage {
            documents,
            pagination: window,
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

/// `wanted` is either a full MIME type or an extension class such as "pdf".
fn matches_document_type(doc: &Document, wanted: &str) -> bool {
    let wanted = wanted.trim().to_lowercase();
    let mime = doc.metadata.mime_type.to_lowercase();
    if wanted.contains('/') {
        return mime == wanted;
    }
    let subtype_match = mime.rsplit('/').next().is_some_and(|sub| sub == wanted);
    let extension_match = doc
        .object_path()
        .and_then(|p| p.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()))
        .is_some_and(|ext| ext == wanted);
    subtype_match || extension_match
}

fn compare(a: &Document, b: &Document, sort: SortSpec) -> Ordering {
    let ordering = match sort.field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Title => a.title.cmp(&b.title),
        SortField::Category => a
            .category
            .cmp(&b.category)
            .then_with(|| a.subcategory.cmp(&b.subcategory)),
        SortField::Size => a.metadata.size.cmp(&b.metadata.size),
    };
    match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Resolves document filters against a taxonomy.
#[derive(Debug, Clone, Copy)]
pub struct FilterResolver<'a> {
    taxonomy: &'a Taxonomy,
}

impl FilterResolver<'static> {
    /// Resolver over the built-in taxonomy.
    pub fn standard() -> Self {
        Self::new(Taxonomy::standard())
    }
}

impl<'a> FilterResolver<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &'a Taxonomy {
        self.taxonomy
    }

    /// Resolve a filter, optional explicit sort and page request.
    pub fn resolve(
        &self,
        filter: &DocumentFilter,
        sort: Option<SortSpec>,
        page: PageRequest,
    ) -> RemoteQuery {
        RemoteQuery {
            scope: self.resolve_scope(filter),
            title: filter.title.clone(),
            keywords: filter.keywords.clone(),
            date_range: filter.date_range,
            document_type: filter.document_type.clone(),
            status: filter.status.clone(),
            sort: sort.unwrap_or_default(),
            page,
        }
    }

    fn resolve_scope(&self, filter: &DocumentFilter) -> QueryScope {
        let category = match filter.category.as_deref().filter(|c| !c.is_empty()) {
            Some(c) => c,
            None => return QueryScope::All,
        };

        if !self.taxonomy.contains_category(category) {
            debug!(category, "Unknown category, resolving to empty query");
            return QueryScope::Empty;
        }

        match filter.subcategory.as_deref().filter(|s| !s.is_empty()) {
            Some(sub) if self.taxonomy.contains_pair(category, sub) => QueryScope::Subcategory {
                category: category.to_string(),
                subcategory: sub.to_string(),
            },
            Some(sub) => {
                debug!(
                    category,
                    subcategory = sub,
                    "Subcategory not in category, widening to whole category"
                );
                QueryScope::Category {
                    category: category.to_string(),
                }
            }
            None => QueryScope::Category {
                category: category.to_string(),
            },
        }
    }
}

//! Document rows and the listing/search RPC functions.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use lexlib_core::logging;
use lexlib_core::{
    Document, DocumentPatch, DocumentRepository, DocumentRow, Error, NewDocumentRecord,
    RemoteQuery, Result,
};

use crate::client::{BaasClient, REST};

const DOCUMENTS: &str = "/rest/v1/documents";

/// Parameters of the `list_documents` RPC function.
#[derive(Debug, Serialize, PartialEq)]
pub struct ListDocumentsParams<'a> {
    pub p_category: Option<&'a str>,
    pub p_subcategory: Option<&'a str>,
    pub p_title: Option<&'a str>,
    pub p_keywords: Option<&'a str>,
    pub p_date_from: Option<String>,
    pub p_date_to: Option<String>,
    pub p_document_type: Option<&'a str>,
    pub p_status: Option<&'a str>,
    pub p_sort_by: &'static str,
    pub p_sort_order: &'static str,
    pub p_page: u32,
    pub p_page_size: u32,
}

impl<'a> From<&'a RemoteQuery> for ListDocumentsParams<'a> {
    fn from(query: &'a RemoteQuery) -> Self {
        Self {
            p_category: query.category(),
            p_subcategory: query.subcategory(),
            p_title: query.title.as_deref(),
            p_keywords: query.keywords.as_deref(),
            p_date_from: query.date_range.start.map(|d| d.to_rfc3339()),
            p_date_to: query.date_range.end.map(|d| d.to_rfc3339()),
            p_document_type: query.document_type.as_deref(),
            p_status: query.status.as_deref(),
            p_sort_by: query.sort.field.column(),
            p_sort_order: query.sort.direction.as_str(),
            p_page: query.page.page,
            p_page_size: query.page.page_size,
        }
    }
}

#[derive(Serialize)]
struct SearchParams<'a> {
    search_query: &'a str,
}

fn id_filter(id: Uuid) -> [(&'static str, String); 2] {
    [("id", format!("eq.{}", id)), ("select", "*".to_string())]
}

#[async_trait]
impl DocumentRepository for BaasClient {
    #[instrument(
        skip(self, query),
        fields(subsystem = "baas", component = "documents", op = "list_documents", result_count = tracing::field::Empty)
    )]
    async fn list_documents(&self, query: &RemoteQuery) -> Result<Vec<DocumentRow>> {
        if query.is_empty_result() {
            debug!("Empty-result query, skipping backend call");
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let params = ListDocumentsParams::from(query);
        let endpoint = format!("{}/rpc/list_documents", REST);
        let response = self
            .read("list_documents", || {
                self.build_request(Method::POST, &endpoint).json(&params)
            })
            .await?;
        let rows: Vec<DocumentRow> = Self::json(response).await?;

        tracing::Span::current().record(logging::RESULT_COUNT, rows.len());
        debug!(
            page = params.p_page,
            page_size = params.p_page_size,
            duration_ms = start.elapsed().as_millis() as u64,
            "Listed documents"
        );
        Ok(rows)
    }

    #[instrument(skip(self), fields(subsystem = "baas", component = "documents", op = "search_documents"))]
    async fn search_documents(&self, text: &str) -> Result<Vec<DocumentRow>> {
        let endpoint = format!("{}/rpc/search_documents", REST);
        let params = SearchParams { search_query: text };
        let response = self
            .read("search_documents", || {
                self.build_request(Method::POST, &endpoint).json(&params)
            })
            .await?;
        let rows: Vec<DocumentRow> = Self::json(response).await?;
        debug!(result_count = rows.len(), "Searched documents");
        Ok(rows)
    }

    #[instrument(skip(self), fields(subsystem = "baas", component = "documents", op = "get_document", document_id = %id))]
    async fn get_document(&self, id: Uuid) -> Result<Document> {
        let response = self
            .read("get_document", || {
                self.build_request(Method::GET, DOCUMENTS).query(&id_filter(id))
            })
            .await?;
        let rows: Vec<Document> = Self::json(response).await?;
        rows.into_iter().next().ok_or(Error::DocumentNotFound(id))
    }

    #[instrument(skip(self, record), fields(subsystem = "baas", component = "documents", op = "insert_document", category = %record.category))]
    async fn insert_document(&self, record: NewDocumentRecord) -> Result<Document> {
        let response = self
            .send(
                self.build_request(Method::POST, DOCUMENTS)
                    .header("Prefer", "return=representation")
                    .json(&record),
            )
            .await?;
        let rows: Vec<Document> = Self::json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Internal("insert returned no row".to_string()))
    }

    #[instrument(skip(self, patch), fields(subsystem = "baas", component = "documents", op = "update_document", document_id = %id))]
    async fn update_document(&self, id: Uuid, patch: &DocumentPatch) -> Result<Document> {
        let response = self
            .send(
                self.build_request(Method::PATCH, DOCUMENTS)
                    .query(&[("id", format!("eq.{}", id))])
                    .header("Prefer", "return=representation")
                    .json(patch),
            )
            .await?;
        let rows: Vec<Document> = Self::json(response).await?;
        rows.into_iter().next().ok_or(Error::DocumentNotFound(id))
    }

    #[instrument(skip(self), fields(subsystem = "baas", component = "documents", op = "delete_document_row", document_id = %id))]
    async fn delete_document_row(&self, id: Uuid) -> Result<()> {
        let response = self
            .send(
                self.build_request(Method::DELETE, DOCUMENTS)
                    .query(&[("id", format!("eq.{}", id))])
                    .header("Prefer", "return=representation"),
            )
            .await?;
        let deleted: Vec<serde_json::Value> = Self::json(response).await?;
        if deleted.is_empty() {
            return Err(Error::DocumentNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lexlib_core::{
        DateRange, DocumentFilter, FilterResolver, PageRequest, SortDirection, SortField,
        SortSpec,
    };

    #[test]
    fn test_params_for_subcategory_query() {
        let filter = DocumentFilter::new()
            .with_category("Hansards")
            .with_subcategory("Hansards 2024")
            .with_title("budget");
        let query = FilterResolver::standard().resolve(&filter, None, PageRequest::new(2, 25));
        let params = ListDocumentsParams::from(&query);

        assert_eq!(params.p_category, Some("Hansards"));
        assert_eq!(params.p_subcategory, Some("Hansards 2024"));
        assert_eq!(params.p_title, Some("budget"));
        assert_eq!(params.p_sort_by, "created_at");
        assert_eq!(params.p_sort_order, "desc");
        assert_eq!(params.p_page, 2);
        assert_eq!(params.p_page_size, 25);
    }

    #[test]
    fn test_params_serialize_nulls_and_dates() {
        let range = DateRange::new(
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            None,
        )
        .unwrap();
        let query = FilterResolver::standard().resolve(
            &DocumentFilter::new().with_date_range(range),
            Some(SortSpec::new(SortField::Size, SortDirection::Asc)),
            PageRequest::default(),
        );
        let json = serde_json::to_value(ListDocumentsParams::from(&query)).unwrap();

        assert!(json["p_category"].is_null());
        assert_eq!(json["p_date_from"], "2024-01-01T00:00:00+00:00");
        assert!(json["p_date_to"].is_null());
        assert_eq!(json["p_sort_by"], "metadata.size");
        assert_eq!(json["p_sort_order"], "asc");
    }
}

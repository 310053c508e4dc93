//! Debounced live search with stale-response suppression.
//!
//! Every call to [`LiveSearch::search`] takes a new generation number. The
//! call waits out the quiet period and then checks whether it is still the
//! newest; if not, it returns [`LiveSearchOutcome::Superseded`] without
//! touching the backend. The same check runs again when the backend
//! answers, so a slow response to an older query is discarded even if it
//! arrives after a newer query was issued.
//!
//! One `LiveSearch` belongs to one search box: clones share the generation
//! counter, so every query typed into that box supersedes the previous one.
//! Obtain one per session from [`crate::Library::live_search`]. The HTTP
//! server exposes the plain ranked search at `/documents/search`; an
//! interactive client keeps its own `LiveSearch` in front of that call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::defaults::{LIVE_SEARCH_DEBOUNCE_MS, LIVE_SEARCH_MIN_CHARS};
use crate::error::Result;
use crate::models::Document;
use crate::traits::DocumentRepository;

/// Result of one live search call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "documents", rename_all = "snake_case")]
pub enum LiveSearchOutcome {
    /// Ranked matches for the newest query.
    Results(Vec<Document>),
    /// Query shorter than the minimum length; nothing was sent.
    TooShort,
    /// A newer query was issued before this one completed.
    Superseded,
}

#[derive(Clone)]
pub struct LiveSearch {
    repo: Arc<dyn DocumentRepository>,
    generation: Arc<AtomicU64>,
    debounce: Duration,
    min_chars: usize,
}

impl LiveSearch {
    pub fn new(repo: Arc<dyn DocumentRepository>) -> Self {
        Self {
            repo,
            generation: Arc::new(AtomicU64::new(0)),
            debounce: Duration::from_millis(LIVE_SEARCH_DEBOUNCE_MS),
            min_chars: LIVE_SEARCH_MIN_CHARS,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Issue a query. Any older query still pending becomes superseded,
    /// including when this one is too short to send.
    #[instrument(skip(self), fields(subsystem = "core", component = "live_search", op = "search"))]
    pub async fn search(&self, text: &str) -> Result<LiveSearchOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let text = text.trim();
        if text.chars().count() < self.min_chars {
            return Ok(LiveSearchOutcome::TooShort);
        }

        tokio::time::sleep(self.debounce).await;
        if !self.is_current(generation) {
            debug!(generation, "Query superseded during quiet period");
            return Ok(LiveSearchOutcome::Superseded);
        }

        let start = Instant::now();
        let rows = self.repo.search_documents(text).await?;
        if !self.is_current(generation) {
            debug!(generation, "Discarding stale search response");
            return Ok(LiveSearchOutcome::Superseded);
        }

        debug!(
            result_count = rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Live search complete"
        );
        Ok(LiveSearchOutcome::Results(
            rows.into_iter().map(|r| r.document).collect(),
        ))
    }
}

impl std::fmt::Debug for LiveSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSearch")
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("debounce", &self.debounce)
            .field("min_chars", &self.min_chars)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{DocumentPatch, DocumentRow, NewDocumentRecord};
    use crate::resolver::RemoteQuery;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Answers every search after `latency` with one row titled by the query.
    struct SlowSearch {
        latency: Duration,
        queries: Mutex<Vec<String>>,
    }

    impl SlowSearch {
        fn new(latency_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                latency: Duration::from_millis(latency_ms),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentRepository for SlowSearch {
        async fn list_documents(&self, _query: &RemoteQuery) -> crate::Result<Vec<DocumentRow>> {
            Ok(Vec::new())
        }

        async fn search_documents(&self, text: &str) -> crate::Result<Vec<DocumentRow>> {
            self.queries.lock().unwrap().push(text.to_string());
            tokio::time::sleep(self.latency).await;
            Ok(vec![DocumentRow {
                document: crate::models::Document {
                    id: Uuid::new_v4(),
                    title: text.to_string(),
                    category: "Hansards".into(),
                    subcategory: "Hansards 2024".into(),
                    file_url: String::new(),
                    file_path: String::new(),
                    created_at: Utc::now(),
                    metadata: Default::default(),
                },
                total_rows: 1,
            }])
        }

        async fn get_document(&self, id: Uuid) -> crate::Result<crate::models::Document> {
            Err(Error::DocumentNotFound(id))
        }

        async fn insert_document(
            &self,
            _record: NewDocumentRecord,
        ) -> crate::Result<crate::models::Document> {
            Err(Error::Internal("read-only".into()))
        }

        async fn update_document(
            &self,
            id: Uuid,
            _patch: &DocumentPatch,
        ) -> crate::Result<crate::models::Document> {
            Err(Error::DocumentNotFound(id))
        }

        async fn delete_document_row(&self, id: Uuid) -> crate::Result<()> {
            Err(Error::DocumentNotFound(id))
        }
    }

    fn titles(outcome: LiveSearchOutcome) -> Vec<String> {
        match outcome {
            LiveSearchOutcome::Results(docs) => docs.into_iter().map(|d| d.title).collect(),
            other => panic!("expected results, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_period_coalesces_keystrokes() {
        let repo = SlowSearch::new(0);
        let search = LiveSearch::new(repo.clone());

        let first = tokio::spawn({
            let s = search.clone();
            async move { s.search("ha").await }
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        let second = tokio::spawn({
            let s = search.clone();
            async move { s.search("hansard").await }
        });

        assert_eq!(
            first.await.unwrap().unwrap(),
            LiveSearchOutcome::Superseded
        );
        assert_eq!(titles(second.await.unwrap().unwrap()), vec!["hansard"]);
        assert_eq!(repo.queries(), vec!["hansard"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_is_discarded() {
        let repo = SlowSearch::new(1_000);
        let search = LiveSearch::new(repo.clone());

        let first = tokio::spawn({
            let s = search.clone();
            async move { s.search("finance").await }
        });
        // The first query has fired and is waiting on the backend.
        tokio::time::sleep(Duration::from_millis(700)).await;
        let second = tokio::spawn({
            let s = search.clone();
            async move { s.search("finance act").await }
        });

        assert_eq!(
            first.await.unwrap().unwrap(),
            LiveSearchOutcome::Superseded
        );
        assert_eq!(titles(second.await.unwrap().unwrap()), vec!["finance act"]);
        assert_eq!(repo.queries(), vec!["finance", "finance act"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_not_sent() {
        let repo = SlowSearch::new(0);
        let search = LiveSearch::new(repo.clone());
        assert_eq!(search.search(" h ").await.unwrap(), LiveSearchOutcome::TooShort);
        assert!(repo.queries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_query_waits_out_debounce() {
        let repo = SlowSearch::new(0);
        let search = LiveSearch::new(repo.clone()).with_debounce(Duration::from_millis(500));
        let started = tokio::time::Instant::now();
        let outcome = search.search("bills").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(titles(outcome), vec!["bills"]);
    }
}

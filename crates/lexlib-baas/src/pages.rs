//! Editable content pages.

use async_trait::async_trait;
use reqwest::Method;
use tracing::{info, instrument};

use lexlib_core::{ContentPage, Error, PageRepository, Result};

use crate::client::BaasClient;

const CONTENT_PAGES: &str = "/rest/v1/content_pages";

fn slug_filter(slug: &str) -> (&'static str, String) {
    ("slug", format!("eq.{}", slug))
}

fn not_found(slug: &str) -> Error {
    Error::NotFound(format!("page '{}'", slug))
}

#[async_trait]
impl PageRepository for BaasClient {
    #[instrument(skip(self), fields(subsystem = "baas", component = "pages", op = "get_page"))]
    async fn get_page(&self, slug: &str) -> Result<ContentPage> {
        let response = self
            .read("get_page", || {
                self.build_request(Method::GET, CONTENT_PAGES)
                    .query(&[slug_filter(slug), ("select", "*".to_string())])
            })
            .await?;
        let pages: Vec<ContentPage> = Self::json(response).await?;
        pages.into_iter().next().ok_or_else(|| not_found(slug))
    }

    #[instrument(skip(self), fields(subsystem = "baas", component = "pages", op = "list_pages"))]
    async fn list_pages(&self) -> Result<Vec<ContentPage>> {
        let response = self
            .read("list_pages", || {
                self.build_request(Method::GET, CONTENT_PAGES)
                    .query(&[("select", "*"), ("order", "slug.asc")])
            })
            .await?;
        Self::json(response).await
    }

    #[instrument(skip(self, page), fields(subsystem = "baas", component = "pages", op = "upsert_page", slug = %page.slug))]
    async fn upsert_page(&self, page: &ContentPage) -> Result<ContentPage> {
        let response = self
            .send(
                self.build_request(Method::POST, CONTENT_PAGES)
                    .query(&[("on_conflict", "slug")])
                    .header("Prefer", "resolution=merge-duplicates,return=representation")
                    .json(&[page]),
            )
            .await?;
        let pages: Vec<ContentPage> = Self::json(response).await?;
        let stored = pages
            .into_iter()
            .next()
            .ok_or_else(|| Error::Internal("upsert returned no row".to_string()))?;
        info!(published = stored.published, "Page saved");
        Ok(stored)
    }

    #[instrument(skip(self), fields(subsystem = "baas", component = "pages", op = "delete_page"))]
    async fn delete_page(&self, slug: &str) -> Result<()> {
        let response = self
            .send(
                self.build_request(Method::DELETE, CONTENT_PAGES)
                    .query(&[slug_filter(slug)])
                    .header("Prefer", "return=representation"),
            )
            .await?;
        let deleted: Vec<serde_json::Value> = Self::json(response).await?;
        if deleted.is_empty() {
            return Err(not_found(slug));
        }
        Ok(())
    }
}

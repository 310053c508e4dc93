//! Object storage for document files.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, instrument};

use lexlib_core::{Error, FileStore, Result};

use crate::client::{BaasClient, STORAGE};

/// Percent-encode each segment of an object path, keeping the separators.
pub fn encode_object_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Rejected or missing objects are storage failures; auth and transient
/// errors pass through unchanged.
fn storage_error(path: &str, err: Error) -> Error {
    match err {
        Error::InvalidInput(message) | Error::NotFound(message) => {
            Error::Storage(format!("{}: {}", path, message))
        }
        other => other,
    }
}

impl BaasClient {
    fn object_endpoint(&self, path: &str) -> String {
        format!(
            "{}/object/{}/{}",
            STORAGE,
            self.config().bucket,
            encode_object_path(path)
        )
    }
}

#[async_trait]
impl FileStore for BaasClient {
    #[instrument(skip(self, data), fields(subsystem = "baas", component = "storage", op = "upload", object_path = %path, bytes = data.len()))]
    async fn upload(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        let request = self
            .build_request(Method::POST, &self.object_endpoint(path))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(data);
        self.send(request)
            .await
            .map_err(|e| storage_error(path, e))?;
        debug!("Stored object");
        Ok(())
    }

    #[instrument(skip(self), fields(subsystem = "baas", component = "storage", op = "download", object_path = %path))]
    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let endpoint = self.object_endpoint(path);
        let response = self
            .read("download", || self.build_request(Method::GET, &endpoint))
            .await
            .map_err(|e| storage_error(path, e))?;
        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "Fetched object");
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self), fields(subsystem = "baas", component = "storage", op = "remove", object_path = %path))]
    async fn remove(&self, path: &str) -> Result<()> {
        let endpoint = format!("{}/object/{}", STORAGE, self.config().bucket);
        let request = self
            .build_request(Method::DELETE, &endpoint)
            .json(&json!({ "prefixes": [path] }));
        let response = self
            .send(request)
            .await
            .map_err(|e| storage_error(path, e))?;

        // Removing a missing object answers 200 with an empty list.
        let removed: Vec<serde_json::Value> = Self::json(response).await?;
        if removed.is_empty() {
            return Err(Error::Storage(format!("{}: object not found", path)));
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}{}/object/public/{}/{}",
            self.config().base(),
            STORAGE,
            self.config().bucket,
            encode_object_path(path)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BaasConfig;

    #[test]
    fn test_encode_keeps_separators() {
        assert_eq!(
            encode_object_path("Hansards/Hansards 2024/abc-report #1.pdf"),
            "Hansards/Hansards%202024/abc-report%20%231.pdf"
        );
    }

    #[test]
    fn test_public_url_round_trips_through_document() {
        let client =
            BaasClient::new(BaasConfig::new("https://project.example", "key")).unwrap();
        let url = client.public_url("Hansards/Hansards 2024/abc-report.pdf");
        assert_eq!(
            url,
            "https://project.example/storage/v1/object/public/documents/Hansards/Hansards%202024/abc-report.pdf"
        );

        let document: lexlib_core::Document = serde_json::from_value(serde_json::json!({
            "id": "0192d6a8-0000-7000-8000-000000000001",
            "title": "Report",
            "category": "Hansards",
            "subcategory": "Hansards 2024",
            "file_url": url,
            "created_at": "2024-03-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(
            document.object_path().as_deref(),
            Some("Hansards/Hansards 2024/abc-report.pdf")
        );
    }
}

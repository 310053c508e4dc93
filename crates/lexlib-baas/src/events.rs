//! Access event sink.

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use lexlib_core::{AccessEvent, EventRecorder, Result};

use crate::client::BaasClient;

const ACCESS_EVENTS: &str = "/rest/v1/access_events";

#[async_trait]
impl EventRecorder for BaasClient {
    #[instrument(skip(self, event), fields(subsystem = "baas", component = "events", op = "record_event", event_type = event.kind.as_str()))]
    async fn record_event(&self, event: &AccessEvent) -> Result<()> {
        self.send(
            self.build_request(Method::POST, ACCESS_EVENTS)
                .header("Prefer", "return=minimal")
                .json(event),
        )
        .await?;
        Ok(())
    }
}

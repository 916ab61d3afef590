//! Chunked delivery of rendered cards to an interaction webhook.
//!
//! Each chunk is one outbound message. A failed chunk aborts the remaining
//! chunks and posts a single user-visible notice; partial delivery is
//! acceptable and not retried.

use std::time::Duration;

use eyre::{Result, WrapErr};
use serde_json::Value;

use crate::layout::{Component, RenderBackend};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts rendered message chunks to a webhook URL.
pub struct Deliverer {
    http: reqwest::Client,
    backend: Box<dyn RenderBackend>,
}

impl Deliverer {
    pub fn new(backend: Box<dyn RenderBackend>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .wrap_err("failed to build HTTP client")?;
        Ok(Self { http, backend })
    }

    /// Send components in capacity-bounded chunks. Stops at the first failed
    /// chunk and posts one error notice instead.
    pub async fn send_components(
        &self,
        webhook_url: &str,
        components: Vec<Component>,
        ephemeral: bool,
    ) -> Result<()> {
        if components.is_empty() {
            return Ok(());
        }
        let chunks = self.backend.chunk(components);
        let total = chunks.len();
        for (idx, chunk) in chunks.iter().enumerate() {
            let payload = self.backend.render_chunk(chunk, ephemeral);
            if let Err(e) = self.post(webhook_url, &payload).await {
                tracing::warn!(chunk = idx + 1, total, error = %e, "failed to send message chunk");
                crate::metrics::record_delivery_failure();
                let notice = self.backend.render_chunk(
                    &[Component::text("Failed to send formatted response.")],
                    true,
                );
                if let Err(e) = self.post(webhook_url, &notice).await {
                    tracing::warn!(error = %e, "failed to send delivery-failure notice");
                }
                break;
            }
        }
        Ok(())
    }

    async fn post(&self, url: &str, payload: &Value) -> Result<()> {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .wrap_err("webhook request failed")?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        eyre::bail!("webhook post failed ({status}): {snippet}")
    }
}

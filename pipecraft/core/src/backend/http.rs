//! HTTP/SSE Agent Backend
//!
//! Transport implementation for the agent's streaming REST endpoint. The
//! endpoint answers a POST with a server-sent-event stream; each `data:`
//! line carries one JSON-encoded [`AnalysisEvent`].
//!
//! Transport failures and malformed event payloads are both normalized to a
//! single in-band [`StreamSignal::Error`], after which the stream ends. A
//! dropped receiver (cancellation) stops the reader task at its next send.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use super::traits::{AgentBackend, AnalysisRequest, AnalysisStream, StreamSignal};
use crate::config::PipecraftConfig;
use crate::streaming::events::AnalysisEvent;

/// Sentinel payload some SSE servers emit before closing.
const DONE_SENTINEL: &str = "[DONE]";

/// HTTP/SSE client for the analysis agent service.
#[derive(Clone)]
pub struct HttpAgentBackend {
    base_url: String,
    channel_capacity: usize,
    http_client: reqwest::Client,
}

impl HttpAgentBackend {
    /// Create a backend for the given base URL with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeouts(
            base_url,
            Duration::from_secs(5),
            Duration::from_secs(120),
            100,
        )
    }

    /// Create a backend from loaded configuration.
    #[must_use]
    pub fn from_config(config: &PipecraftConfig) -> Self {
        Self::with_timeouts(
            config.agent.base_url.clone(),
            config.agent.connect_timeout,
            config.agent.request_timeout,
            config.streaming.channel_capacity,
        )
    }

    fn with_timeouts(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
        channel_capacity: usize,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            channel_capacity,
            http_client: reqwest::Client::builder()
                .connect_timeout(connect_timeout)
                .timeout(request_timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Get the streaming analysis endpoint URL.
    fn stream_url(&self) -> String {
        format!("{}/api/v1/analysis/stream", self.base_url)
    }

    /// Get the health endpoint URL.
    fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }
}

/// Extract the payload of one SSE line.
///
/// Returns `None` for blank lines, comments, and non-data fields
/// (`event:`, `id:`, `retry:`).
fn extract_payload(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    line.strip_prefix("data:").map(str::trim)
}

#[async_trait]
impl AgentBackend for HttpAgentBackend {
    fn name(&self) -> &'static str {
        "agent-http"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn stream_analysis(&self, request: &AnalysisRequest) -> anyhow::Result<AnalysisStream> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);

        let body = serde_json::json!({
            "connection_id": request.key.connection_id,
            "query": request.key.query,
            "thread_id": request.key.thread_id,
        });

        let response = self
            .http_client
            .post(self.stream_url())
            .header("accept", "text/event-stream")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("agent service returned {status}: {body}");
        }

        let mut stream = response.bytes_stream();

        let task = tokio::spawn(async move {
            let mut buffer = String::new();

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));

                        while let Some(pos) = buffer.find('\n') {
                            let line = buffer[..pos].to_string();
                            buffer = buffer[pos + 1..].to_string();

                            let Some(payload) = extract_payload(&line) else {
                                continue;
                            };
                            if payload == DONE_SENTINEL {
                                return;
                            }

                            match serde_json::from_str::<AnalysisEvent>(payload) {
                                Ok(event) => {
                                    if tx.send(StreamSignal::Event(event)).await.is_err() {
                                        // Receiver dropped: stream was cancelled.
                                        return;
                                    }
                                }
                                Err(err) => {
                                    tracing::warn!(%err, "malformed analysis event");
                                    let _ = tx
                                        .send(StreamSignal::Error(format!(
                                            "malformed analysis event: {err}"
                                        )))
                                        .await;
                                    return;
                                }
                            }
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(StreamSignal::Error(err.to_string())).await;
                        return;
                    }
                }
            }
            // Clean end of stream: the closed channel is the completion signal.
        });

        Ok(AnalysisStream::new(rx, task))
    }
}

//! HTTP client for one OpenAI-compatible chat-completions call against a
//! single (model, key) candidate. Failover across candidates lives in
//! [`super::failover`].

use crate::config::RelayConfig;
use crate::llm::{Candidate, ChunkSink, StreamChunk};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Classified failure of a single candidate attempt.
#[derive(Debug, Error)]
pub enum ProviderFailure {
    #[error("rate limited (429)")]
    RateLimited,

    #[error("transport: {0}")]
    Transport(String),

    #[error("upstream status {status}: {body}")]
    Upstream { status: u16, body: String },
}

impl ProviderFailure {
    /// Whether the failover controller may advance to the next candidate.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProviderFailure::RateLimited
                | ProviderFailure::Transport(_)
                | ProviderFailure::Upstream { .. }
        )
    }
}

impl From<ProviderFailure> for crate::NovaError {
    fn from(f: ProviderFailure) -> Self {
        match f {
            ProviderFailure::RateLimited => crate::NovaError::RateLimited,
            ProviderFailure::Transport(m) => crate::NovaError::Transport(m),
            ProviderFailure::Upstream { status, body } => crate::NovaError::Upstream {
                status,
                message: body,
            },
        }
    }
}

/// How a streaming attempt ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The upstream stream ran to its terminator.
    Completed,
    /// The client transport closed; the upstream stream was aborted.
    ClientClosed,
}

/// A single chat-completion call against one candidate, blocking or
/// incremental.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Non-streaming call; used for the decision step.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        candidate: &Candidate,
    ) -> Result<String, ProviderFailure>;

    /// Streaming call. Each decoded delta is handed to `sink` before the
    /// next record is read; a sink error aborts the upstream stream.
    async fn stream(
        &self,
        system: &str,
        user: &str,
        candidate: &Candidate,
        sink: &mut dyn ChunkSink,
    ) -> Result<StreamEnd, ProviderFailure>;
}

/// Reqwest-backed [`ChatBackend`] for OpenAI-compatible endpoints.
pub struct ProviderClient {
    http: Client,
    base_url: String,
    request_timeout: Duration,
    referer: Option<String>,
    app_title: Option<String>,
}

impl ProviderClient {
    pub fn new(config: &RelayConfig) -> crate::Result<Self> {
        // No whole-request timeout on the shared client: it would cut off
        // long streams. The non-streaming call applies its own deadline.
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| crate::NovaError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            referer: config.referer.clone(),
            app_title: config.app_title.clone(),
        })
    }

    fn request(&self, candidate: &Candidate, body: &Value) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let mut req = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .bearer_auth(&candidate.api_key)
            .json(body);
        if let Some(referer) = &self.referer {
            req = req.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.app_title {
            req = req.header("X-Title", title);
        }
        req
    }
}

fn chat_body(model: &str, system: &str, user: &str, stream: bool) -> Value {
    let mut body = json!({
        "model": model,
        "messages": [
            {"role": "system", "content": system},
            {"role": "user", "content": user}
        ]
    });
    if stream {
        body["stream"] = json!(true);
    }
    body
}

/// Classify a non-success HTTP status per the failover contract: 429 is
/// rate limiting, everything else 4xx/5xx is an upstream error.
fn classify_status(status: StatusCode, body: String) -> ProviderFailure {
    if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderFailure::RateLimited
    } else {
        ProviderFailure::Upstream {
            status: status.as_u16(),
            body,
        }
    }
}

fn extract_message_content(v: &Value) -> Option<String> {
    v.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}

fn extract_delta(v: &Value) -> Option<&str> {
    v.get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
}

#[async_trait]
impl ChatBackend for ProviderClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        candidate: &Candidate,
    ) -> Result<String, ProviderFailure> {
        let body = chat_body(&candidate.model, system, user, false);
        debug!(target: "llm_client", model = %candidate.model, "POST chat/completions");

        let resp = self
            .request(candidate, &body)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| ProviderFailure::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        // A 200 with an unexpected shape degrades to an empty decision
        // rather than failing the turn.
        match resp.json::<Value>().await {
            Ok(val) => Ok(extract_message_content(&val).unwrap_or_else(|| {
                warn!(target: "llm_client", "Missing choices[0].message.content in response");
                String::new()
            })),
            Err(e) => {
                warn!(target: "llm_client", error = %e, "Failed to parse completion JSON");
                Ok(String::new())
            }
        }
    }

    async fn stream(
        &self,
        system: &str,
        user: &str,
        candidate: &Candidate,
        sink: &mut dyn ChunkSink,
    ) -> Result<StreamEnd, ProviderFailure> {
        let body = chat_body(&candidate.model, system, user, true);
        debug!(target: "llm_client", model = %candidate.model, "POST chat/completions (stream)");

        let resp = self
            .request(candidate, &body)
            .send()
            .await
            .map_err(|e| ProviderFailure::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        // The event decoder buffers partial records spanning read
        // boundaries; each complete record carries one JSON payload.
        let mut events = resp.bytes_stream().eventsource();
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    return Err(ProviderFailure::Transport(format!("stream read: {e}")));
                }
            };

            if event.data.trim() == "[DONE]" {
                return Ok(StreamEnd::Completed);
            }

            let record: Value = match serde_json::from_str(&event.data) {
                Ok(v) => v,
                Err(e) => {
                    // Skip malformed records instead of ending the stream.
                    warn!(target: "llm_client", error = %e, "Skipping undecodable stream record");
                    continue;
                }
            };

            if let Some(delta) = extract_delta(&record) {
                if delta.is_empty() {
                    continue;
                }
                if sink.accept(StreamChunk::new(delta)).await.is_err() {
                    debug!(target: "llm_client", "Client closed; aborting upstream stream");
                    return Ok(StreamEnd::ClientClosed);
                }
            }
        }

        warn!(target: "llm_client", "Stream ended without [DONE] terminator");
        Ok(StreamEnd::Completed)
    }
}

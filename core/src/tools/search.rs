use crate::cache::{cache_key, ResponseCache};
use crate::tools::{build_http_client, ToolAdapter, ToolError, ToolKind, ToolReply, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct InstantAnswerResponse {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractSource", default)]
    abstract_source: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "FirstURL", default)]
    first_url: String,
}

/// Web search via the DuckDuckGo Instant Answer API.
///
/// The only cache-backed adapter: identical queries within the TTL window
/// are replayed without contacting the upstream source.
pub struct SearchTool {
    http: reqwest::Client,
    cache: Arc<ResponseCache>,
    ttl: Duration,
}

impl SearchTool {
    pub fn new(timeout: Duration, cache: Arc<ResponseCache>, ttl: Duration) -> Self {
        Self {
            http: build_http_client(timeout),
            cache,
            ttl,
        }
    }

    async fn lookup(&self, query: &str) -> ToolResult<String> {
        let url = format!(
            "https://api.duckduckgo.com/?q={}&format=json&no_html=1&skip_disambig=1",
            urlencoding::encode(query)
        );

        debug!(target: "tool_search", query = %query, "Querying instant answers");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ToolError::Request(format!("status {}", resp.status())));
        }

        let data: InstantAnswerResponse = resp
            .json()
            .await
            .map_err(|e| ToolError::MalformedPayload(e.to_string()))?;

        render(query, &data).ok_or(ToolError::NoResults)
    }
}

fn render(query: &str, data: &InstantAnswerResponse) -> Option<String> {
    if !data.abstract_text.is_empty() {
        return Some(format!(
            "#### Quick Search Answer for \"{query}\":\n\n{}\n\nSource: {} ([More Details]({}))",
            data.abstract_text, data.abstract_source, data.abstract_url
        ));
    }

    // Disambiguation-style responses carry their payload in related topics.
    let topic = data.related_topics.iter().find(|t| !t.text.is_empty())?;
    Some(format!(
        "#### Quick Search Answer for \"{query}\":\n\n{}\n\n[More Details]({})",
        topic.text, topic.first_url
    ))
}

#[async_trait]
impl ToolAdapter for SearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Search
    }

    async fn fetch(&self, query: &str) -> ToolReply {
        let key = cache_key(self.kind().name(), query);
        if let Some(cached) = self.cache.get(&key) {
            debug!(target: "tool_search", query = %query, "Serving cached result");
            return ToolReply::from_adapter(self.kind(), cached);
        }

        match self.lookup(query).await {
            Ok(body) => {
                self.cache.put(&key, &body, self.ttl);
                ToolReply::from_adapter(self.kind(), body)
            }
            Err(e) => {
                warn!(target: "tool_search", query = %query, error = %e, "Lookup failed");
                ToolReply::from_adapter(
                    self.kind(),
                    format!("Sorry, I couldn't find a quick answer for \"{query}\"."),
                )
            }
        }
    }
}

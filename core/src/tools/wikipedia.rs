use crate::tools::{build_http_client, ToolAdapter, ToolError, ToolKind, ToolReply, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Intro extracts can run long; keep the downstream prompt small.
const MAX_EXTRACT_CHARS: usize = 1500;

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, WikiPage>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    #[serde(default)]
    extract: Option<String>,
}

/// Article lookup via the Wikipedia extracts API.
pub struct WikipediaTool {
    http: reqwest::Client,
}

impl WikipediaTool {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: build_http_client(timeout),
        }
    }

    async fn lookup(&self, query: &str) -> ToolResult<String> {
        let url = format!(
            "https://en.wikipedia.org/w/api.php?action=query&format=json&prop=extracts&exintro=true&explaintext=true&redirects=1&titles={}",
            urlencoding::encode(query)
        );

        debug!(target: "tool_wikipedia", query = %query, "Fetching article extract");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ToolError::Request(format!("status {}", resp.status())));
        }

        let data: ExtractResponse = resp
            .json()
            .await
            .map_err(|e| ToolError::MalformedPayload(e.to_string()))?;

        render(query, &data).ok_or(ToolError::NoResults)
    }
}

fn render(query: &str, data: &ExtractResponse) -> Option<String> {
    let pages = &data.query.as_ref()?.pages;
    let extract = pages
        .values()
        .filter_map(|p| p.extract.as_deref())
        .find(|e| !e.trim().is_empty())?;

    let mut body: String = extract.chars().take(MAX_EXTRACT_CHARS).collect();
    if extract.chars().count() > MAX_EXTRACT_CHARS {
        body.push('…');
    }

    Some(format!(
        "#### Wikipedia Result for \"{query}\":\n\n{body}\n\n[Read more on Wikipedia](https://en.wikipedia.org/wiki/{})",
        urlencoding::encode(query)
    ))
}

#[async_trait]
impl ToolAdapter for WikipediaTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Wikipedia
    }

    async fn fetch(&self, query: &str) -> ToolReply {
        match self.lookup(query).await {
            Ok(body) => ToolReply::from_adapter(self.kind(), body),
            Err(e) => {
                warn!(target: "tool_wikipedia", query = %query, error = %e, "Lookup failed");
                ToolReply::from_adapter(
                    self.kind(),
                    format!("Sorry, I couldn't find a Wikipedia article for \"{query}\"."),
                )
            }
        }
    }
}

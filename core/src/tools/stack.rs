use crate::tools::{build_http_client, ToolAdapter, ToolError, ToolKind, ToolReply, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_QUESTIONS: usize = 3;

#[derive(Debug, Deserialize)]
struct QuestionSearchResponse {
    #[serde(default)]
    items: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct Question {
    title: String,
    #[serde(default)]
    score: i64,
    link: String,
}

/// Question search via the Stack Exchange API (Stack Overflow site).
pub struct StackTool {
    http: reqwest::Client,
}

impl StackTool {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: build_http_client(timeout),
        }
    }

    async fn lookup(&self, query: &str) -> ToolResult<String> {
        let url = format!(
            "https://api.stackexchange.com/2.3/search/advanced?order=desc&sort=relevance&q={}&site=stackoverflow&filter=default&pagesize={}",
            urlencoding::encode(query),
            MAX_QUESTIONS
        );

        debug!(target: "tool_stack", query = %query, "Searching questions");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ToolError::Request(format!("status {}", resp.status())));
        }

        let data: QuestionSearchResponse = resp
            .json()
            .await
            .map_err(|e| ToolError::MalformedPayload(e.to_string()))?;

        render(query, &data).ok_or(ToolError::NoResults)
    }
}

fn render(query: &str, data: &QuestionSearchResponse) -> Option<String> {
    if data.items.is_empty() {
        return None;
    }
    let mut out = format!("#### Top Stack Overflow Questions for \"{query}\":\n\n");
    for q in data.items.iter().take(MAX_QUESTIONS) {
        out.push_str(&format!("- **{}** (Score: {})\n", q.title, q.score));
        out.push_str(&format!("  - [View Question]({})\n\n", q.link));
    }
    Some(out)
}

#[async_trait]
impl ToolAdapter for StackTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Stack
    }

    async fn fetch(&self, query: &str) -> ToolReply {
        match self.lookup(query).await {
            Ok(body) => ToolReply::from_adapter(self.kind(), body),
            Err(e) => {
                warn!(target: "tool_stack", query = %query, error = %e, "Lookup failed");
                ToolReply::from_adapter(
                    self.kind(),
                    format!(
                        "Sorry, I couldn't find any related questions on Stack Overflow for \"{query}\"."
                    ),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_lists_questions_with_scores() {
        let data: QuestionSearchResponse = serde_json::from_str(
            r#"{"items":[{"title":"How do I borrow?","score":42,"link":"https://stackoverflow.com/q/1"}]}"#,
        )
        .unwrap();
        let md = render("borrow", &data).unwrap();
        assert!(md.contains("- **How do I borrow?** (Score: 42)"));
        assert!(md.contains("[View Question](https://stackoverflow.com/q/1)"));
    }

    #[test]
    fn render_returns_none_without_items() {
        let data: QuestionSearchResponse = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        assert!(render("q", &data).is_none());
    }
}

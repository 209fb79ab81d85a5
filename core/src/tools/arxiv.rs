use crate::tools::{build_http_client, ToolAdapter, ToolError, ToolKind, ToolReply, ToolResult};
use async_trait::async_trait;
use chrono::DateTime;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_PAPERS: usize = 3;

#[derive(Debug)]
struct Paper {
    title: String,
    author: String,
    published: String,
    link: String,
}

/// Research paper search via the arXiv Atom API.
pub struct ArxivTool {
    http: reqwest::Client,
}

impl ArxivTool {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: build_http_client(timeout),
        }
    }

    async fn lookup(&self, query: &str) -> ToolResult<String> {
        let url = format!(
            "http://export.arxiv.org/api/query?search_query=all:{}&start=0&max_results={}",
            urlencoding::encode(query),
            MAX_PAPERS
        );

        debug!(target: "tool_arxiv", query = %query, "Searching papers");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ToolError::Request(format!("status {}", resp.status())));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ToolError::Request(e.to_string()))?;
        let papers = parse_feed(&body)?;
        render(query, &papers).ok_or(ToolError::NoResults)
    }
}

fn parse_feed(xml: &str) -> ToolResult<Vec<Paper>> {
    let doc =
        roxmltree::Document::parse(xml).map_err(|e| ToolError::MalformedPayload(e.to_string()))?;

    // Match on local names; the feed carries the Atom namespace.
    let mut papers = Vec::new();
    for entry in doc
        .descendants()
        .filter(|n| n.tag_name().name() == "entry")
    {
        let child_text = |name: &str| {
            entry
                .children()
                .find(|c| c.tag_name().name() == name)
                .and_then(|c| c.text())
                .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
                .unwrap_or_default()
        };

        let author = entry
            .descendants()
            .find(|n| n.tag_name().name() == "name")
            .and_then(|n| n.text())
            .unwrap_or("Unknown")
            .trim()
            .to_string();

        let published = match DateTime::parse_from_rfc3339(&child_text("published")) {
            Ok(ts) => ts.format("%Y-%m-%d").to_string(),
            Err(_) => child_text("published"),
        };

        papers.push(Paper {
            title: child_text("title"),
            author,
            published,
            link: child_text("id"),
        });
        if papers.len() == MAX_PAPERS {
            break;
        }
    }
    Ok(papers)
}

fn render(query: &str, papers: &[Paper]) -> Option<String> {
    if papers.is_empty() {
        return None;
    }
    let mut out = format!("#### arXiv Results for \"{query}\":\n\n");
    for p in papers {
        out.push_str(&format!("- **{}**\n", p.title));
        out.push_str(&format!("  - *Authors:* {}\n", p.author));
        out.push_str(&format!("  - *Published:* {}\n", p.published));
        out.push_str(&format!("  - [Read Paper]({})\n\n", p.link));
    }
    Some(out)
}

#[async_trait]
impl ToolAdapter for ArxivTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Arxiv
    }

    async fn fetch(&self, query: &str) -> ToolReply {
        match self.lookup(query).await {
            Ok(body) => ToolReply::from_adapter(self.kind(), body),
            Err(e) => {
                warn!(target: "tool_arxiv", query = %query, error = %e, "Lookup failed");
                ToolReply::from_adapter(
                    self.kind(),
                    format!("Sorry, I couldn't find any research papers on arXiv for \"{query}\"."),
                )
            }
        }
    }
}

use crate::tools::{build_http_client, ToolAdapter, ToolError, ToolKind, ToolReply, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_REPOS: usize = 3;

#[derive(Debug, Deserialize)]
struct RepoSearchResponse {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    full_name: String,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    description: Option<String>,
    html_url: String,
}

/// Repository search via the GitHub REST API.
pub struct GithubTool {
    http: reqwest::Client,
}

impl GithubTool {
    pub fn new(timeout: Duration) -> Self {
        // GitHub rejects requests without a User-Agent; the shared builder sets one.
        Self {
            http: build_http_client(timeout),
        }
    }

    async fn lookup(&self, query: &str) -> ToolResult<String> {
        let url = format!(
            "https://api.github.com/search/repositories?q={}&sort=stars&order=desc&per_page={}",
            urlencoding::encode(query),
            MAX_REPOS
        );

        debug!(target: "tool_github", query = %query, "Searching repositories");

        let resp = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| ToolError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ToolError::Request(format!("status {}", resp.status())));
        }

        let data: RepoSearchResponse = resp
            .json()
            .await
            .map_err(|e| ToolError::MalformedPayload(e.to_string()))?;

        render(query, &data).ok_or(ToolError::NoResults)
    }
}

fn render(query: &str, data: &RepoSearchResponse) -> Option<String> {
    if data.items.is_empty() {
        return None;
    }
    let mut out = format!("#### Top GitHub Repositories for \"{query}\":\n\n");
    for repo in data.items.iter().take(MAX_REPOS) {
        let description = repo
            .description
            .as_deref()
            .unwrap_or("No description provided.");
        out.push_str(&format!(
            "- **{}** (⭐ {})\n",
            repo.full_name, repo.stargazers_count
        ));
        out.push_str(&format!("  - {description}\n"));
        out.push_str(&format!("  - [View on GitHub]({})\n\n", repo.html_url));
    }
    Some(out)
}

#[async_trait]
impl ToolAdapter for GithubTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Github
    }

    async fn fetch(&self, query: &str) -> ToolReply {
        match self.lookup(query).await {
            Ok(body) => ToolReply::from_adapter(self.kind(), body),
            Err(e) => {
                warn!(target: "tool_github", query = %query, error = %e, "Lookup failed");
                ToolReply::from_adapter(
                    self.kind(),
                    format!("Sorry, I couldn't find any GitHub repositories for \"{query}\"."),
                )
            }
        }
    }
}

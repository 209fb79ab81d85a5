//! Command parsing and routing to tool adapters.

use crate::cache::ResponseCache;
use crate::config::RelayConfig;
use crate::tools::{
    arxiv::ArxivTool, books::BooksTool, github::GithubTool, map::MapTool, search::SearchTool,
    stack::StackTool, wikipedia::WikipediaTool,
};
use crate::tools::{ToolAdapter, ToolKind, ToolReply};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Reserved prefix character for direct tool commands.
pub const COMMAND_MARKER: char = '!';

const USAGE_HINT: &str =
    "Please provide a search term after the command. Example: `!wiki Albert Einstein`";

/// Routes a parsed tool invocation to the matching adapter.
///
/// Never errors: empty queries and unknown names come back as hint replies
/// without any adapter being contacted.
pub struct ToolDispatcher {
    adapters: HashMap<ToolKind, Arc<dyn ToolAdapter>>,
    // Enabled tools in registration order, for the commands hint.
    enabled: Vec<ToolKind>,
}

impl ToolDispatcher {
    /// Build a dispatcher over an explicit adapter set. Primarily a test
    /// seam; production code goes through [`ToolDispatcher::from_config`].
    pub fn with_adapters(adapters: Vec<Arc<dyn ToolAdapter>>) -> Self {
        let enabled: Vec<ToolKind> = adapters.iter().map(|a| a.kind()).collect();
        let adapters = adapters.into_iter().map(|a| (a.kind(), a)).collect();
        Self { adapters, enabled }
    }

    /// Build the real adapter set for the configured tools.
    pub fn from_config(config: &RelayConfig, cache: Arc<ResponseCache>) -> Self {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let ttl = Duration::from_secs(config.cache_ttl_secs);

        let mut adapters: Vec<Arc<dyn ToolAdapter>> = Vec::new();
        for kind in &config.enabled_tools {
            let adapter: Arc<dyn ToolAdapter> = match kind {
                ToolKind::Wikipedia => Arc::new(WikipediaTool::new(timeout)),
                ToolKind::Search => {
                    Arc::new(SearchTool::new(timeout, Arc::clone(&cache), ttl))
                }
                ToolKind::Arxiv => Arc::new(ArxivTool::new(timeout)),
                ToolKind::Books => Arc::new(BooksTool::new(timeout)),
                ToolKind::Github => Arc::new(GithubTool::new(timeout)),
                ToolKind::Stack => Arc::new(StackTool::new(timeout)),
                ToolKind::Map => Arc::new(MapTool::new()),
            };
            adapters.push(adapter);
        }
        info!(target: "dispatch", tools = %adapters.len(), "Registered tool adapters");
        Self::with_adapters(adapters)
    }

    /// Handle a raw `!<tool> <query>` command line.
    pub async fn dispatch(&self, raw: &str) -> ToolReply {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix(COMMAND_MARKER).unwrap_or(trimmed);
        let (name, query) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body, ""),
        };
        self.invoke(name, query).await
    }

    /// Route an already-parsed invocation (tool name + query) to its adapter.
    pub async fn invoke(&self, name: &str, query: &str) -> ToolReply {
        let query = query.trim();
        if query.is_empty() {
            return ToolReply::hint(USAGE_HINT.to_string());
        }

        match ToolKind::parse(name).and_then(|kind| self.adapters.get(&kind)) {
            Some(adapter) => {
                debug!(target: "dispatch", tool = %adapter.kind(), query = %query, "Invoking adapter");
                adapter.fetch(query).await
            }
            None => ToolReply::hint(format!(
                "Unknown command: `{COMMAND_MARKER}{name}`. Available commands are: {}.",
                self.command_list()
            )),
        }
    }

    pub fn enabled_tools(&self) -> &[ToolKind] {
        &self.enabled
    }

    fn command_list(&self) -> String {
        self.enabled
            .iter()
            .map(|kind| format!("`{COMMAND_MARKER}{}`", kind.command()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

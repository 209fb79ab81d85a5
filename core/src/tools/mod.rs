//! Tool adapters and command dispatch.
//!
//! Each adapter wraps one external data source and renders a short markdown
//! summary. Adapters never raise: upstream outages and malformed payloads
//! degrade to a user-facing apology line so a bad source cannot abort the
//! turn.

pub mod arxiv;
pub mod books;
pub mod dispatch;
pub mod error;
pub mod github;
pub mod map;
pub mod search;
pub mod stack;
pub mod traits;
pub mod wikipedia;

// Re-export common types
pub use dispatch::{ToolDispatcher, COMMAND_MARKER};
pub use error::{ToolError, ToolResult};
pub use traits::{ToolAdapter, ToolReply};

use std::fmt;
use std::time::Duration;

/// The recognized external data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Wikipedia,
    Search,
    Arxiv,
    Books,
    Github,
    Stack,
    Map,
}

impl ToolKind {
    pub const ALL: [ToolKind; 7] = [
        ToolKind::Wikipedia,
        ToolKind::Search,
        ToolKind::Arxiv,
        ToolKind::Books,
        ToolKind::Github,
        ToolKind::Stack,
        ToolKind::Map,
    ];

    /// Canonical name, as used in decision JSON and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Wikipedia => "wikipedia",
            ToolKind::Search => "search",
            ToolKind::Arxiv => "arxiv",
            ToolKind::Books => "books",
            ToolKind::Github => "github",
            ToolKind::Stack => "stack",
            ToolKind::Map => "map",
        }
    }

    /// Short command form, as typed after the `!` marker.
    pub fn command(&self) -> &'static str {
        match self {
            ToolKind::Wikipedia => "wiki",
            ToolKind::Search => "search",
            ToolKind::Arxiv => "arxiv",
            ToolKind::Books => "books",
            ToolKind::Github => "github",
            ToolKind::Stack => "stack",
            ToolKind::Map => "map",
        }
    }

    /// Case-insensitive lookup accepting the canonical name, the command
    /// form, and a handful of aliases.
    pub fn parse(name: &str) -> Option<ToolKind> {
        match name.trim().to_lowercase().as_str() {
            "wiki" | "wikipedia" => Some(ToolKind::Wikipedia),
            "search" | "ddg" => Some(ToolKind::Search),
            "arxiv" => Some(ToolKind::Arxiv),
            "books" | "library" => Some(ToolKind::Books),
            "github" | "gh" => Some(ToolKind::Github),
            "stack" | "stackoverflow" => Some(ToolKind::Stack),
            "map" | "osm" => Some(ToolKind::Map),
            _ => None,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared HTTP client construction for adapters.
pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent("nova-agent/0.1")
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

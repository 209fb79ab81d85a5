use super::ToolKind;
use async_trait::async_trait;

/// Terminal result of a tool invocation: markdown ready for the client.
///
/// `source` is `None` for dispatcher hints (usage, unknown command) that
/// never reached an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReply {
    pub body: String,
    pub source: Option<ToolKind>,
}

impl ToolReply {
    pub fn from_adapter(kind: ToolKind, body: String) -> Self {
        Self {
            body,
            source: Some(kind),
        }
    }

    pub fn hint(body: String) -> Self {
        Self { body, source: None }
    }
}

/// The core trait for all tool adapters.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Which source this adapter wraps.
    fn kind(&self) -> ToolKind;

    /// Look up `query` against the external source.
    ///
    /// Must not fail: network errors and unexpected payload shapes are
    /// converted into a user-facing apology line inside the adapter.
    async fn fetch(&self, query: &str) -> ToolReply;
}

use crate::tools::{ToolAdapter, ToolKind, ToolReply};
use async_trait::async_trait;

/// Location lookup rendered as an OpenStreetMap search link.
///
/// Purely local: no upstream call, so it can never fail.
#[derive(Default)]
pub struct MapTool;

impl MapTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolAdapter for MapTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Map
    }

    async fn fetch(&self, query: &str) -> ToolReply {
        ToolReply::from_adapter(
            self.kind(),
            format!(
                "Here is a map link for \"{query}\":\n\n[View on OpenStreetMap](https://www.openstreetmap.org/search?query={})",
                urlencoding::encode(query)
            ),
        )
    }
}

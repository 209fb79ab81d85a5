use async_trait::async_trait;
use thiserror::Error;

/// One decoded increment of assistant text. Transient; forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub delta: String,
}

impl StreamChunk {
    pub fn new(delta: impl Into<String>) -> Self {
        Self {
            delta: delta.into(),
        }
    }
}

/// The client transport has gone away; the upstream stream must be aborted.
#[derive(Debug, Error)]
#[error("client transport closed")]
pub struct SinkClosed;

/// Destination for streamed chunks.
///
/// `accept` completes before the caller decodes the next record, so a slow
/// outbound transport pauses the upstream read loop. There is no buffering
/// beyond what the transport itself provides.
#[async_trait]
pub trait ChunkSink: Send {
    async fn accept(&mut self, chunk: StreamChunk) -> Result<(), SinkClosed>;
}

/// Sink that buffers chunks in memory. Used by tests and by callers that
/// need the assembled text rather than a live relay.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub chunks: Vec<String>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.chunks.concat()
    }
}

#[async_trait]
impl ChunkSink for CollectSink {
    async fn accept(&mut self, chunk: StreamChunk) -> Result<(), SinkClosed> {
        self.chunks.push(chunk.delta);
        Ok(())
    }
}

// Nova Core Library
// Conversational relay engine: decision calls, tool dispatch, failover, streaming

pub mod cache;
pub mod config;
pub mod llm;
pub mod prompt;
pub mod tools;
pub mod turn;

// Export core types
pub use cache::{cache_key, ResponseCache};
pub use config::RelayConfig;
pub use llm::{
    Candidate, ChatBackend, ChunkSink, CollectSink, FailoverPolicy, ProviderClient,
    ProviderFailure, SinkClosed, StreamChunk, StreamEnd,
};
pub use tools::{ToolAdapter, ToolDispatcher, ToolKind, ToolReply};
pub use turn::{ChatTurn, Decision, Orchestrator, TurnOutcome, VisualizationSpec, VizKind};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NovaError {
    #[error("authentication required")]
    AuthRequired,

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("rate limited by upstream provider")]
    RateLimited,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("all provider candidates exhausted after {attempts} attempts")]
    AllProvidersExhausted { attempts: usize },

    #[error("client transport closed mid-turn")]
    ClientGone,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NovaError>;

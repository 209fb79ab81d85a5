//! Upstream model plumbing: provider client, failover controller, and the
//! chunk sink seam used to relay streamed deltas to the client transport.

mod client;
mod failover;
mod sink;

pub use client::{ChatBackend, ProviderClient, ProviderFailure, StreamEnd};
pub use failover::{Candidate, FailoverPolicy};
pub use sink::{ChunkSink, CollectSink, SinkClosed, StreamChunk};

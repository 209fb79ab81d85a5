//! Ordered-candidate failover.
//!
//! One primitive serves both fallback axes: fallback API keys for a fixed
//! model, and fallback models across a fixed key. The caller supplies
//! whichever ordered list is relevant to the call site.

use crate::llm::client::{ChatBackend, ProviderFailure, StreamEnd};
use crate::llm::sink::{ChunkSink, SinkClosed, StreamChunk};
use crate::{NovaError, Result};
use async_trait::async_trait;
use std::future::Future;
use tracing::{error, warn};

/// A (model, credential) pair eligible for an upstream call. Ordering of
/// candidate lists is part of the contract: primary before fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub model: String,
    pub api_key: String,
}

/// Ordered candidates plus the classification predicate deciding whether a
/// failure allows advancing to the next candidate.
pub struct FailoverPolicy {
    candidates: Vec<Candidate>,
    advance_on: fn(&ProviderFailure) -> bool,
}

impl FailoverPolicy {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            advance_on: ProviderFailure::is_recoverable,
        }
    }

    pub fn with_advance_on(mut self, advance_on: fn(&ProviderFailure) -> bool) -> Self {
        self.advance_on = advance_on;
        self
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Try candidates strictly in order, returning the first success.
    ///
    /// Advances only on failures the policy classifies as recoverable; a
    /// non-recoverable failure is returned as-is, and exhausting the list
    /// aggregates into [`NovaError::AllProvidersExhausted`].
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(Candidate) -> Fut,
        Fut: Future<Output = std::result::Result<T, ProviderFailure>>,
    {
        let mut attempts = 0;
        for candidate in &self.candidates {
            attempts += 1;
            match op(candidate.clone()).await {
                Ok(value) => return Ok(value),
                Err(failure) if (self.advance_on)(&failure) => {
                    log_advance(candidate, &failure);
                }
                Err(failure) => return Err(failure.into()),
            }
        }
        Err(NovaError::AllProvidersExhausted { attempts })
    }

    /// Streaming variant of [`FailoverPolicy::run`].
    ///
    /// Once any chunk has been forwarded for a candidate, that candidate is
    /// committed: forwarding is not transactional, so a later failure ends
    /// the turn instead of advancing. Returns the number of forwarded
    /// chunks on success.
    pub async fn run_stream(
        &self,
        backend: &dyn ChatBackend,
        system: &str,
        user: &str,
        sink: &mut dyn ChunkSink,
    ) -> Result<usize> {
        let mut attempts = 0;
        for candidate in &self.candidates {
            attempts += 1;
            let mut tracked = TrackingSink::new(&mut *sink);
            match backend.stream(system, user, candidate, &mut tracked).await {
                Ok(StreamEnd::Completed) => return Ok(tracked.forwarded),
                Ok(StreamEnd::ClientClosed) => return Err(NovaError::ClientGone),
                Err(failure) => {
                    if tracked.forwarded > 0 {
                        error!(
                            target: "failover",
                            model = %candidate.model,
                            chunks = tracked.forwarded,
                            error = %failure,
                            "Stream failed after chunks were forwarded; candidate is committed"
                        );
                        return Err(failure.into());
                    }
                    if (self.advance_on)(&failure) {
                        log_advance(candidate, &failure);
                    } else {
                        return Err(failure.into());
                    }
                }
            }
        }
        Err(NovaError::AllProvidersExhausted { attempts })
    }
}

fn log_advance(candidate: &Candidate, failure: &ProviderFailure) {
    match failure {
        ProviderFailure::RateLimited => {
            warn!(target: "failover", model = %candidate.model, "Rate limited; advancing to next candidate");
        }
        ProviderFailure::Transport(msg) => {
            warn!(target: "failover", model = %candidate.model, error = %msg, "Transport failure; advancing to next candidate");
        }
        ProviderFailure::Upstream { status, body } => {
            error!(target: "failover", model = %candidate.model, status = %status, body = %body, "Upstream error; advancing to next candidate");
        }
    }
}

/// Counts chunks forwarded through to the real sink so the failover loop
/// can tell whether a candidate is committed.
struct TrackingSink<'a> {
    inner: &'a mut dyn ChunkSink,
    forwarded: usize,
}

impl<'a> TrackingSink<'a> {
    fn new(inner: &'a mut dyn ChunkSink) -> Self {
        Self {
            inner,
            forwarded: 0,
        }
    }
}

#[async_trait]
impl ChunkSink for TrackingSink<'_> {
    async fn accept(&mut self, chunk: StreamChunk) -> std::result::Result<(), SinkClosed> {
        self.inner.accept(chunk).await?;
        self.forwarded += 1;
        Ok(())
    }
}

use async_trait::async_trait;
use nova_core::{
    Candidate, ChatBackend, ChunkSink, CollectSink, FailoverPolicy, NovaError, ProviderFailure,
    SinkClosed, StreamChunk, StreamEnd,
};
use std::sync::atomic::{AtomicUsize, Ordering};

fn cand(model: &str, key: &str) -> Candidate {
    Candidate {
        model: model.to_string(),
        api_key: key.to_string(),
    }
}

#[tokio::test]
async fn advances_past_rate_limited_candidate_and_returns_next_outcome() {
    let policy = FailoverPolicy::new(vec![cand("m", "bad-key"), cand("m", "good-key")]);
    let calls = AtomicUsize::new(0);

    let result = policy
        .run(|c| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if c.api_key == "bad-key" {
                    Err(ProviderFailure::RateLimited)
                } else {
                    Ok(format!("answered with {}", c.api_key))
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(result, "answered with good-key");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn single_failing_candidate_exhausts() {
    let policy = FailoverPolicy::new(vec![cand("m", "k")]);

    let err = policy
        .run(|_c| async move { Err::<String, _>(ProviderFailure::Transport("down".into())) })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        NovaError::AllProvidersExhausted { attempts: 1 }
    ));
}

#[tokio::test]
async fn empty_candidate_list_exhausts_without_attempts() {
    let policy = FailoverPolicy::new(Vec::new());
    let err = policy
        .run(|_c| async move { Ok::<_, ProviderFailure>("unreachable") })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NovaError::AllProvidersExhausted { attempts: 0 }
    ));
}

#[tokio::test]
async fn success_short_circuits_remaining_candidates() {
    let policy = FailoverPolicy::new(vec![cand("m1", "k"), cand("m2", "k")]);
    let calls = AtomicUsize::new(0);

    let result = policy
        .run(|c| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, ProviderFailure>(c.model) }
        })
        .await
        .unwrap();

    assert_eq!(result, "m1");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn custom_predicate_stops_on_non_advancing_failure() {
    let policy = FailoverPolicy::new(vec![cand("m1", "k"), cand("m2", "k")])
        .with_advance_on(|f| matches!(f, ProviderFailure::RateLimited));
    let calls = AtomicUsize::new(0);

    let err = policy
        .run(|_c| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Err::<String, _>(ProviderFailure::Upstream {
                    status: 500,
                    body: "boom".into(),
                })
            }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, NovaError::Upstream { status: 500, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ---- streaming variant ----

/// Per-model scripted streaming behavior, keyed by candidate model name.
struct FakeStreamBackend {
    stream_calls: AtomicUsize,
}

impl FakeStreamBackend {
    fn new() -> Self {
        Self {
            stream_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ChatBackend for FakeStreamBackend {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _candidate: &Candidate,
    ) -> Result<String, ProviderFailure> {
        Ok(String::new())
    }

    async fn stream(
        &self,
        _system: &str,
        _user: &str,
        candidate: &Candidate,
        sink: &mut dyn ChunkSink,
    ) -> Result<StreamEnd, ProviderFailure> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        match candidate.model.as_str() {
            "rate-limited" => Err(ProviderFailure::RateLimited),
            "dies-mid-stream" => {
                if sink.accept(StreamChunk::new("partial")).await.is_err() {
                    return Ok(StreamEnd::ClientClosed);
                }
                Err(ProviderFailure::Transport("connection reset".into()))
            }
            _ => {
                for part in ["Hello, ", "world"] {
                    if sink.accept(StreamChunk::new(part)).await.is_err() {
                        return Ok(StreamEnd::ClientClosed);
                    }
                }
                Ok(StreamEnd::Completed)
            }
        }
    }
}

#[tokio::test]
async fn stream_advances_when_no_bytes_were_forwarded() {
    let backend = FakeStreamBackend::new();
    let policy = FailoverPolicy::new(vec![cand("rate-limited", "k"), cand("ok", "k")]);
    let mut sink = CollectSink::new();

    let chunks = policy
        .run_stream(&backend, "sys", "user", &mut sink)
        .await
        .unwrap();

    assert_eq!(chunks, 2);
    assert_eq!(sink.text(), "Hello, world");
    assert_eq!(backend.stream_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stream_failure_after_first_chunk_is_committed() {
    let backend = FakeStreamBackend::new();
    let policy = FailoverPolicy::new(vec![cand("dies-mid-stream", "k"), cand("ok", "k")]);
    let mut sink = CollectSink::new();

    let err = policy
        .run_stream(&backend, "sys", "user", &mut sink)
        .await
        .unwrap_err();

    // The forwarded chunk commits the candidate: no retry on the backup.
    assert!(matches!(err, NovaError::Transport(_)));
    assert_eq!(backend.stream_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sink.chunks, vec!["partial".to_string()]);
}

#[tokio::test]
async fn stream_exhausts_when_every_candidate_fails_before_commit() {
    let backend = FakeStreamBackend::new();
    let policy = FailoverPolicy::new(vec![cand("rate-limited", "k1"), cand("rate-limited", "k2")]);
    let mut sink = CollectSink::new();

    let err = policy
        .run_stream(&backend, "sys", "user", &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        NovaError::AllProvidersExhausted { attempts: 2 }
    ));
    assert!(sink.chunks.is_empty());
}

struct ClosedSink;

#[async_trait]
impl ChunkSink for ClosedSink {
    async fn accept(&mut self, _chunk: StreamChunk) -> Result<(), SinkClosed> {
        Err(SinkClosed)
    }
}

#[tokio::test]
async fn closed_client_aborts_without_retrying() {
    let backend = FakeStreamBackend::new();
    let policy = FailoverPolicy::new(vec![cand("ok", "k"), cand("ok-too", "k")]);
    let mut sink = ClosedSink;

    let err = policy
        .run_stream(&backend, "sys", "user", &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(err, NovaError::ClientGone));
    assert_eq!(backend.stream_calls.load(Ordering::SeqCst), 1);
}

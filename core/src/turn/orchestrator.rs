//! The per-turn state machine: DECIDING, then a tool call, a streamed
//! answer, or a visualization document, all delivered through one sink.

use crate::config::RelayConfig;
use crate::llm::{ChatBackend, ChunkSink, FailoverPolicy, StreamChunk};
use crate::prompt;
use crate::tools::{ToolDispatcher, ToolKind, COMMAND_MARKER};
use crate::turn::{ChatTurn, Decision};
use crate::{NovaError, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fixed terminal message when every candidate has been exhausted.
pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "Sorry, I'm currently facing connection issues with the AI service. Please try again in a moment.";

/// Prompt substrings that turn a search-tool decision into the first half
/// of the two-step visualization protocol.
const CHART_CUES: [&str; 3] = ["chart", "graph", "plot"];

/// How a turn ended. Everything user-visible has already been written to
/// the sink by the time this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A direct answer was streamed chunk by chunk.
    Streamed { chunks: usize },
    /// A tool result (or dispatcher hint) was delivered.
    ToolServed { tool: Option<ToolKind> },
    /// A `continue` envelope was emitted; the caller owes a second turn
    /// carrying the gathered data as context.
    AwaitingContext,
    /// A chart/table document was delivered.
    Visualized { kind: crate::turn::VizKind },
    /// Every candidate failed; the fixed service message was delivered.
    Unavailable,
}

pub struct Orchestrator {
    backend: Arc<dyn ChatBackend>,
    dispatcher: ToolDispatcher,
    decision_policy: FailoverPolicy,
    stream_policy: FailoverPolicy,
    system_prompt: String,
}

impl Orchestrator {
    pub fn new(
        config: &RelayConfig,
        backend: Arc<dyn ChatBackend>,
        dispatcher: ToolDispatcher,
    ) -> Self {
        Self {
            backend,
            dispatcher,
            decision_policy: FailoverPolicy::new(config.decision_candidates()),
            stream_policy: FailoverPolicy::new(config.stream_candidates()),
            system_prompt: prompt::decision_prompt(&config.enabled_tools),
        }
    }

    /// Run one turn end to end, writing every user-visible byte to `sink`.
    pub async fn run_turn(
        &self,
        turn: &ChatTurn,
        sink: &mut dyn ChunkSink,
    ) -> Result<TurnOutcome> {
        let original = turn.prompt.trim();
        if original.is_empty() {
            return Err(NovaError::EmptyPrompt);
        }

        // `!wiki Turing` style commands skip the decision call entirely.
        if original.starts_with(COMMAND_MARKER) {
            let reply = self.dispatcher.dispatch(original).await;
            deliver(sink, &reply.body).await?;
            return Ok(TurnOutcome::ToolServed { tool: reply.source });
        }

        let context = turn
            .context
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        let effective = if context.is_empty() {
            original.to_string()
        } else {
            prompt::visualization_prompt(original, context)
        };

        // DECIDING: one non-streaming call over the key axis.
        let backend = self.backend.as_ref();
        let system = self.system_prompt.as_str();
        let user = effective.as_str();
        let raw_decision = match self
            .decision_policy
            .run(move |candidate| async move { backend.complete(system, user, &candidate).await })
            .await
        {
            Ok(text) => text,
            Err(NovaError::AllProvidersExhausted { attempts }) => {
                warn!(target: "orchestrator", attempts, "Decision call exhausted all candidates");
                deliver(sink, SERVICE_UNAVAILABLE_MESSAGE).await?;
                return Ok(TurnOutcome::Unavailable);
            }
            Err(e) => return Err(e),
        };

        match Decision::classify(&raw_decision) {
            Decision::ToolCall { tool, query } => {
                info!(target: "orchestrator", tool = %tool, query = %query, "Decision requested a tool");
                let reply = self.dispatcher.invoke(&tool, &query).await;

                // First turn of the two-step visualization protocol: hand
                // the gathered data back instead of finishing the turn.
                if reply.source == Some(ToolKind::Search)
                    && context.is_empty()
                    && wants_visualization(original)
                {
                    let envelope = json!({
                        "type": "continue",
                        "prompt": original,
                        "context": reply.body,
                    });
                    deliver(sink, &envelope.to_string()).await?;
                    return Ok(TurnOutcome::AwaitingContext);
                }

                deliver(sink, &reply.body).await?;
                Ok(TurnOutcome::ToolServed { tool: reply.source })
            }

            Decision::Visualization(spec) => {
                info!(target: "orchestrator", kind = %spec.kind.as_str(), "Delivering visualization document");
                deliver(sink, &spec.payload.to_string()).await?;
                Ok(TurnOutcome::Visualized { kind: spec.kind })
            }

            Decision::Prose(_) => {
                // DIRECT_ANSWER: re-answer with full streaming over the
                // model axis.
                debug!(target: "orchestrator", "Decision is prose; streaming direct answer");
                match self
                    .stream_policy
                    .run_stream(backend, system, user, sink)
                    .await
                {
                    Ok(chunks) => Ok(TurnOutcome::Streamed { chunks }),
                    Err(NovaError::AllProvidersExhausted { attempts }) => {
                        warn!(target: "orchestrator", attempts, "Streaming exhausted all candidates");
                        deliver(sink, SERVICE_UNAVAILABLE_MESSAGE).await?;
                        Ok(TurnOutcome::Unavailable)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }
}

fn wants_visualization(prompt: &str) -> bool {
    let lower = prompt.to_lowercase();
    CHART_CUES.iter().any(|cue| lower.contains(cue))
}

async fn deliver(sink: &mut dyn ChunkSink, text: &str) -> Result<()> {
    sink.accept(StreamChunk::new(text))
        .await
        .map_err(|_| NovaError::ClientGone)
}

//! Turn orchestration: decision classification and the per-turn state
//! machine (decide, then dispatch a tool, stream an answer, or emit a
//! visualization document).

mod decision;
mod orchestrator;

pub use decision::{Decision, VisualizationSpec, VizKind};
pub use orchestrator::{Orchestrator, TurnOutcome, SERVICE_UNAVAILABLE_MESSAGE};

use serde::Deserialize;

/// One inbound user turn. Immutable; discarded once the turn completes.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub prompt: String,
    /// Present only on the second turn of the two-step visualization
    /// protocol, carrying the gathered tool data.
    #[serde(default)]
    pub context: Option<String>,
}

impl ChatTurn {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: None,
        }
    }

    pub fn with_context(prompt: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: Some(context.into()),
        }
    }
}

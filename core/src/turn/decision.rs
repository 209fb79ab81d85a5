//! Classification of the decision-call response.
//!
//! The raw text is decoded exactly once, at the DECIDING boundary;
//! downstream code matches on the variant instead of re-probing JSON keys.

use serde_json::Value;

/// Terminal artifact of the two-step visualization protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationSpec {
    pub kind: VizKind,
    /// The full decision object; relayed to the client verbatim.
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VizKind {
    Chart,
    Table,
}

impl VizKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VizKind::Chart => "chart",
            VizKind::Table => "table",
        }
    }
}

/// Outcome of the decision call.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// A `tool` key was present: route through the dispatcher.
    ToolCall { tool: String, query: String },
    /// A recognized `type` key was present: relay as a single document.
    Visualization(VisualizationSpec),
    /// Anything else is a direct answer cue.
    Prose(String),
}

impl Decision {
    /// Classify a raw decision response.
    ///
    /// Tie-break: syntactically valid JSON without a recognized key (or
    /// with an unrecognized `type` value) is plain prose, preserving
    /// maximal non-tool-using behavior.
    pub fn classify(raw: &str) -> Decision {
        let Ok(value) = serde_json::from_str::<Value>(raw.trim()) else {
            return Decision::Prose(raw.to_string());
        };
        let Some(object) = value.as_object() else {
            return Decision::Prose(raw.to_string());
        };

        if let Some(tool) = object.get("tool").and_then(Value::as_str) {
            let query = object
                .get("query")
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Decision::ToolCall {
                tool: tool.to_string(),
                query: query.to_string(),
            };
        }

        if let Some(kind) = object.get("type").and_then(Value::as_str) {
            let kind = match kind {
                "chart" => VizKind::Chart,
                "table" => VizKind::Table,
                _ => return Decision::Prose(raw.to_string()),
            };
            return Decision::Visualization(VisualizationSpec {
                kind,
                payload: value.clone(),
            });
        }

        Decision::Prose(raw.to_string())
    }
}

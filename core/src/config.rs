//! Relay configuration: provider endpoint, ordered credentials and models,
//! enabled tool set. Defaults come from the environment; an optional TOML
//! file overlays them.

use crate::llm::Candidate;
use crate::tools::ToolKind;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// OpenAI-compatible base URL, e.g. `https://openrouter.ai/api/v1`.
    pub base_url: String,
    /// Ordered model list; the first entry is the primary model.
    pub models: Vec<String>,
    /// Ordered API keys; the first entry is the primary key.
    pub api_keys: Vec<String>,
    pub request_timeout_ms: u64,
    /// Optional attribution headers forwarded to the provider.
    pub referer: Option<String>,
    pub app_title: Option<String>,
    /// Authoritative tool set; the decision prompt and the dispatcher both
    /// derive from it.
    pub enabled_tools: Vec<ToolKind>,
    pub cache_ttl_secs: u64,
    /// Listen address for the inbound HTTP surface.
    pub bind_addr: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("NOVA_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string()),
            models: std::env::var("NOVA_MODELS")
                .ok()
                .map(|s| parse_list(&s))
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| {
                    vec!["mistralai/mistral-small-3.2-24b-instruct:free".to_string()]
                }),
            api_keys: std::env::var("NOVA_API_KEYS")
                .ok()
                .map(|s| parse_list(&s))
                .or_else(|| std::env::var("OPENROUTER_KEY").ok().map(|k| vec![k]))
                .unwrap_or_default()
                .into_iter()
                .filter(|k| !k.is_empty())
                .collect(),
            request_timeout_ms: std::env::var("NOVA_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30_000),
            referer: std::env::var("NOVA_HTTP_REFERER").ok().filter(|s| !s.is_empty()),
            app_title: std::env::var("NOVA_APP_TITLE").ok().filter(|s| !s.is_empty()),
            enabled_tools: std::env::var("NOVA_TOOLS")
                .ok()
                .map(|s| parse_tools(&parse_list(&s)))
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| ToolKind::ALL.to_vec()),
            cache_ttl_secs: std::env::var("NOVA_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(3600),
            bind_addr: std::env::var("NOVA_BIND")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "127.0.0.1:8080".to_string()),
        }
    }
}

impl RelayConfig {
    /// Load configuration from a TOML file (path via NOVA_CONFIG or ./nova.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let default = Self::default();
        let path = std::env::var("NOVA_CONFIG").unwrap_or_else(|_| "nova.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match toml::from_str::<RelayToml>(&s) {
                Ok(t) => t.overlay(default),
                Err(e) => {
                    warn!(target: "config", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                warn!(target: "config", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }

    /// Candidate list for the decision call: every key, primary first,
    /// against the primary model.
    pub fn decision_candidates(&self) -> Vec<Candidate> {
        let Some(model) = self.models.first() else {
            return Vec::new();
        };
        self.api_keys
            .iter()
            .map(|key| Candidate {
                model: model.clone(),
                api_key: key.clone(),
            })
            .collect()
    }

    /// Candidate list for the streamed answer: every model, primary first,
    /// against the primary key.
    pub fn stream_candidates(&self) -> Vec<Candidate> {
        let Some(key) = self.api_keys.first() else {
            return Vec::new();
        };
        self.models
            .iter()
            .map(|model| Candidate {
                model: model.clone(),
                api_key: key.clone(),
            })
            .collect()
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_tools(names: &[String]) -> Vec<ToolKind> {
    let mut tools = Vec::new();
    for name in names {
        match ToolKind::parse(name) {
            Some(kind) if !tools.contains(&kind) => tools.push(kind),
            Some(_) => {}
            None => warn!(target: "config", tool = %name, "Ignoring unknown tool name"),
        }
    }
    tools
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct RelayToml {
    pub base_url: Option<String>,
    pub models: Option<Vec<String>>,
    pub api_keys: Option<Vec<String>>,
    pub request_timeout_ms: Option<u64>,
    pub referer: Option<String>,
    pub app_title: Option<String>,
    pub tools: Option<Vec<String>>,
    pub cache_ttl_secs: Option<u64>,
    pub bind_addr: Option<String>,
}

impl RelayToml {
    fn overlay(self, mut base: RelayConfig) -> RelayConfig {
        if let Some(x) = self.base_url {
            base.base_url = x;
        }
        if let Some(x) = self.models {
            if !x.is_empty() {
                base.models = x;
            }
        }
        if let Some(x) = self.api_keys {
            if !x.is_empty() {
                base.api_keys = x;
            }
        }
        if let Some(x) = self.request_timeout_ms {
            base.request_timeout_ms = x;
        }
        if let Some(x) = self.referer {
            base.referer = Some(x);
        }
        if let Some(x) = self.app_title {
            base.app_title = Some(x);
        }
        if let Some(x) = self.tools {
            let parsed = parse_tools(&x);
            if !parsed.is_empty() {
                base.enabled_tools = parsed;
            }
        }
        if let Some(x) = self.cache_ttl_secs {
            base.cache_ttl_secs = x;
        }
        if let Some(x) = self.bind_addr {
            base.bind_addr = x;
        }
        base
    }
}

use async_trait::async_trait;
use nova_core::{ToolAdapter, ToolDispatcher, ToolKind, ToolReply};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records invocations instead of hitting any network.
struct EchoAdapter {
    kind: ToolKind,
    calls: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Option<String>>>,
}

impl EchoAdapter {
    fn new(kind: ToolKind) -> (Arc<Self>, Arc<AtomicUsize>, Arc<Mutex<Option<String>>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let last_query = Arc::new(Mutex::new(None));
        let adapter = Arc::new(Self {
            kind,
            calls: Arc::clone(&calls),
            last_query: Arc::clone(&last_query),
        });
        (adapter, calls, last_query)
    }
}

#[async_trait]
impl ToolAdapter for EchoAdapter {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    async fn fetch(&self, query: &str) -> ToolReply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.to_string());
        ToolReply::from_adapter(self.kind, format!("{} results for {query}", self.kind))
    }
}

fn dispatcher_with_wiki_and_search() -> (
    ToolDispatcher,
    Arc<AtomicUsize>,
    Arc<Mutex<Option<String>>>,
    Arc<AtomicUsize>,
) {
    let (wiki, wiki_calls, wiki_query) = EchoAdapter::new(ToolKind::Wikipedia);
    let (search, search_calls, _) = EchoAdapter::new(ToolKind::Search);
    let dispatcher = ToolDispatcher::with_adapters(vec![wiki, search]);
    (dispatcher, wiki_calls, wiki_query, search_calls)
}

#[tokio::test]
async fn unknown_command_returns_hint_without_contacting_adapters() {
    let (dispatcher, wiki_calls, _, search_calls) = dispatcher_with_wiki_and_search();

    let reply = dispatcher.dispatch("!weather Oslo").await;
    assert!(reply.body.starts_with("Unknown command: `!weather`."));
    assert!(reply.body.contains("`!wiki`, `!search`"));
    assert_eq!(reply.source, None);
    assert_eq!(wiki_calls.load(Ordering::SeqCst), 0);
    assert_eq!(search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_query_returns_usage_hint() {
    let (dispatcher, wiki_calls, _, _) = dispatcher_with_wiki_and_search();

    for raw in ["!wiki", "!wiki   "] {
        let reply = dispatcher.dispatch(raw).await;
        assert!(reply.body.contains("Please provide a search term"));
        assert_eq!(reply.source, None);
    }
    assert_eq!(wiki_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn command_routes_to_adapter_with_query() {
    let (dispatcher, wiki_calls, wiki_query, _) = dispatcher_with_wiki_and_search();

    let reply = dispatcher.dispatch("!wiki Turing").await;
    assert_eq!(reply.source, Some(ToolKind::Wikipedia));
    assert_eq!(reply.body, "wikipedia results for Turing");
    assert_eq!(wiki_calls.load(Ordering::SeqCst), 1);
    assert_eq!(wiki_query.lock().unwrap().as_deref(), Some("Turing"));
}

#[tokio::test]
async fn command_lookup_is_case_insensitive_and_aliased() {
    let (dispatcher, wiki_calls, _, _) = dispatcher_with_wiki_and_search();

    dispatcher.dispatch("!WiKi Turing").await;
    dispatcher.dispatch("!wikipedia Turing").await;
    assert_eq!(wiki_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn query_splits_at_first_whitespace_run_only() {
    let (dispatcher, _, wiki_query, _) = dispatcher_with_wiki_and_search();

    dispatcher.dispatch("!wiki Alan  Turing").await;
    assert_eq!(wiki_query.lock().unwrap().as_deref(), Some("Alan  Turing"));
}

#[tokio::test]
async fn invoke_rejects_unknown_tool_names() {
    let (dispatcher, wiki_calls, _, _) = dispatcher_with_wiki_and_search();

    let reply = dispatcher.invoke("sculptor", "marble").await;
    assert!(reply.body.starts_with("Unknown command:"));
    assert_eq!(reply.source, None);
    assert_eq!(wiki_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invoke_with_empty_query_returns_usage_hint() {
    let (dispatcher, wiki_calls, _, _) = dispatcher_with_wiki_and_search();

    let reply = dispatcher.invoke("wiki", "   ").await;
    assert!(reply.body.contains("Please provide a search term"));
    assert_eq!(wiki_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disabled_tool_is_reported_as_unknown() {
    // Only wikipedia registered; `map` parses but is not enabled.
    let (wiki, _, _) = EchoAdapter::new(ToolKind::Wikipedia);
    let dispatcher = ToolDispatcher::with_adapters(vec![wiki]);

    let reply = dispatcher.dispatch("!map Oslo").await;
    assert!(reply.body.starts_with("Unknown command: `!map`."));
    assert!(reply.body.contains("`!wiki`"));
}

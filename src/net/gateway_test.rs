use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::session::{MemoryStorage, SessionPhase, TokenStorage};
use crate::test_helpers::{ScriptedTransport, TOKEN_KEY, network_down, ok_json, status, user};

struct Fixture {
    gateway: ApiGateway,
    store: Arc<SessionStore>,
    storage: Arc<MemoryStorage>,
    transport: Arc<ScriptedTransport>,
    events: tokio::sync::broadcast::Receiver<SessionEvent>,
}

fn fixture(token: Option<&str>, transport: ScriptedTransport) -> Fixture {
    let storage = Arc::new(match token {
        Some(t) => MemoryStorage::with_entry(TOKEN_KEY, t),
        None => MemoryStorage::new(),
    });
    let store = Arc::new(SessionStore::open(Box::new(Arc::clone(&storage)), TOKEN_KEY));
    fixture_with_store(store, storage, transport)
}

fn fixture_with_store(store: Arc<SessionStore>, storage: Arc<MemoryStorage>, transport: ScriptedTransport) -> Fixture {
    let transport = Arc::new(transport);
    let bus = EventBus::new(16);
    let events = bus.subscribe();
    let gateway = ApiGateway::new(Arc::clone(&store), transport.clone(), bus, "/");
    Fixture { gateway, store, storage, transport, events }
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

// =============================================================================
// merge_headers
// =============================================================================

#[test]
fn merge_defaults_to_json_content_type() {
    let headers = merge_headers(&[], None);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    assert!(headers.get(AUTHORIZATION).is_none());
}

#[test]
fn merge_caller_header_wins_case_insensitively() {
    let caller = vec![("content-TYPE".to_owned(), "application/x-www-form-urlencoded".to_owned())];
    let headers = merge_headers(&caller, None);
    assert_eq!(headers[CONTENT_TYPE], "application/x-www-form-urlencoded");
    assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
}

#[test]
fn merge_attaches_bearer_token() {
    let headers = merge_headers(&[], Some("tok123"));
    assert_eq!(headers[AUTHORIZATION], "Bearer tok123");
    assert!(headers[AUTHORIZATION].is_sensitive());
}

#[test]
fn merge_token_overrides_caller_authorization() {
    let caller = vec![("Authorization".to_owned(), "Basic abc".to_owned())];
    let headers = merge_headers(&caller, Some("tok"));
    assert_eq!(headers[AUTHORIZATION], "Bearer tok");
}

#[test]
fn merge_skips_invalid_headers() {
    let caller = vec![
        ("bad header".to_owned(), "x".to_owned()),
        ("X-Ok".to_owned(), "yes".to_owned()),
        ("X-Bad-Value".to_owned(), "line\nbreak".to_owned()),
    ];
    let headers = merge_headers(&caller, None);
    assert_eq!(headers["x-ok"], "yes");
    assert!(headers.get("x-bad-value").is_none());
    assert_eq!(headers.len(), 2);
}

#[test]
fn merge_drops_unencodable_token() {
    let headers = merge_headers(&[], Some("bad\ntoken"));
    assert!(headers.get(AUTHORIZATION).is_none());
}

// =============================================================================
// request
// =============================================================================

#[tokio::test]
async fn request_attaches_token_and_path() {
    let mut f = fixture(Some("tok123"), ScriptedTransport::new(vec![ok_json(200, json!([]))]));

    let resp = f.gateway.request("/api/v1/posts", RequestOptions::get()).await.unwrap();

    assert_eq!(resp.status(), 200);
    let sent = f.transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].path, "/api/v1/posts");
    assert_eq!(sent[0].method, reqwest::Method::GET);
    assert_eq!(sent[0].headers[AUTHORIZATION], "Bearer tok123");
    assert!(drain(&mut f.events).is_empty());
}

#[tokio::test]
async fn request_without_token_sends_no_authorization() {
    let f = fixture(None, ScriptedTransport::new(vec![status(200)]));
    f.gateway.request("/api/v1/posts", RequestOptions::get()).await.unwrap();
    assert!(f.transport.requests()[0].headers.get(AUTHORIZATION).is_none());
}

#[tokio::test]
async fn non_401_errors_are_returned_as_is() {
    let mut f = fixture(
        Some("tok"),
        ScriptedTransport::new(vec![
            ok_json(404, json!({"detail": "Post not found"})),
            status(500),
            status(403),
        ]),
    );

    for expected in [404, 500, 403] {
        let resp = f.gateway.request("/x", RequestOptions::get()).await.unwrap();
        assert_eq!(resp.status(), expected);
    }
    assert_eq!(f.store.token().as_deref(), Some("tok"));
    assert!(drain(&mut f.events).is_empty());
    assert_eq!(f.transport.requests().len(), 3);
}

#[tokio::test]
async fn network_failure_is_distinct_and_keeps_session() {
    let f = fixture(Some("tok"), ScriptedTransport::new(vec![network_down()]));
    let err = f.gateway.request("/x", RequestOptions::get()).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(f.store.token().as_deref(), Some("tok"));
}

#[tokio::test]
async fn unauthorized_tears_down_then_fails() {
    let mut f = fixture(
        Some("tok"),
        ScriptedTransport::new(vec![ok_json(401, json!({"detail": "Could not validate credentials"}))]),
    );
    f.store.set_user(user(1, "alice"));
    let _ = drain(&mut f.events);

    let err = f.gateway.request("/api/v1/bookmarks", RequestOptions::get()).await.unwrap_err();

    assert_eq!(err, ApiError::Unauthorized { detail: Some("Could not validate credentials".into()) });
    assert_eq!(f.store.phase(), SessionPhase::Guest);
    assert_eq!(f.store.user(), None);
    assert_eq!(f.storage.load(TOKEN_KEY).unwrap(), None);
    assert_eq!(
        drain(&mut f.events),
        [SessionEvent::Navigation(NavView::Guest), SessionEvent::Redirect("/".into())]
    );
}

#[tokio::test]
async fn unauthorized_for_superseded_token_keeps_newer_session() {
    let storage = Arc::new(MemoryStorage::with_entry(TOKEN_KEY, "old"));
    let store = Arc::new(SessionStore::open(Box::new(Arc::clone(&storage)), TOKEN_KEY));
    let hook_store = Arc::clone(&store);
    let transport =
        ScriptedTransport::new(vec![status(401)]).with_hook(move |_| hook_store.set_token("new"));
    let mut f = fixture_with_store(store, storage, transport);

    let err = f.gateway.request("/x", RequestOptions::get()).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(f.store.token().as_deref(), Some("new"));
    assert_eq!(f.storage.load(TOKEN_KEY).unwrap().as_deref(), Some("new"));
    assert!(drain(&mut f.events).is_empty());
    assert_eq!(f.transport.requests()[0].headers[AUTHORIZATION], "Bearer old");
}

#[tokio::test]
async fn anonymous_request_skips_bearer_and_keeps_session_on_401() {
    let mut f = fixture(
        Some("tok"),
        ScriptedTransport::new(vec![ok_json(401, json!({"detail": "Incorrect username or password"}))]),
    );
    f.store.set_user(user(1, "alice"));

    let resp = f
        .gateway
        .request("/api/v1/auth/login", RequestOptions::post_form([("username", "alice")]).anonymous())
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    assert!(f.transport.requests()[0].headers.get(AUTHORIZATION).is_none());
    assert_eq!(f.store.phase(), SessionPhase::Authenticated);
    assert_eq!(f.storage.load(TOKEN_KEY).unwrap().as_deref(), Some("tok"));
    assert!(drain(&mut f.events).is_empty());
}

// =============================================================================
// terminate_session
// =============================================================================

#[tokio::test]
async fn terminate_session_is_idempotent() {
    let mut f = fixture(Some("tok"), ScriptedTransport::new(vec![]));

    f.gateway.terminate_session();
    let first = (f.store.session(), f.storage.load(TOKEN_KEY).unwrap());
    f.gateway.terminate_session();
    let second = (f.store.session(), f.storage.load(TOKEN_KEY).unwrap());

    assert_eq!(first, second);
    assert_eq!(f.store.phase(), SessionPhase::Guest);
    let events = drain(&mut f.events);
    assert_eq!(events.len(), 4);
    assert_eq!(events[1], SessionEvent::Redirect("/".into()));
    assert_eq!(f.transport.remaining(), 0);
}

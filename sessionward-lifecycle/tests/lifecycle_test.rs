//! End-to-end lifecycle tests over the native store and in-memory handler

use serde_json::json;
use sessionward_core::{
    ExecutionMode, FixedClock, RequestContext, SessionConfig, SessionRecords, METADATA_KEY,
};
use sessionward_lifecycle::{Collaborators, CookieOptionsResolver, SessionLifecycleManager};
use sessionward_store::{
    MemorySessionHandler, NativeSessionStore, SqliteSessionHandler, WriteSafeSessionHandler,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::{Arc, Mutex};

const COOKIE: &str = "SESStest";
const NOW: i64 = 1_700_000_000;

struct Harness {
    handler: WriteSafeSessionHandler<MemorySessionHandler>,
    legacy_reports: Arc<Mutex<Vec<Vec<String>>>>,
}

impl Harness {
    fn new() -> Self {
        Self {
            handler: WriteSafeSessionHandler::new(MemorySessionHandler::new()),
            legacy_reports: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn collaborators(&self, records: Arc<dyn SessionRecords>) -> Collaborators {
        let resolver = CookieOptionsResolver::new(SessionConfig {
            cookie_name: Some(COOKIE.to_string()),
            ..SessionConfig::default()
        });
        let reports = self.legacy_reports.clone();

        Collaborators::new(Arc::new(resolver), records)
            .with_clock(Arc::new(FixedClock(NOW)))
            .with_write_safety(Arc::new(self.handler.clone()))
            .with_legacy_keys_hook(Arc::new(move |keys: &[String]| {
                reports.lock().unwrap().push(keys.to_vec());
            }))
    }

    fn manager(&self, request: RequestContext) -> SessionLifecycleManager {
        self.manager_in(request, ExecutionMode::Interactive)
    }

    fn manager_in(&self, request: RequestContext, mode: ExecutionMode) -> SessionLifecycleManager {
        let store = NativeSessionStore::new(self.handler.clone());
        let collaborators = self
            .collaborators(Arc::new(self.handler.clone()))
            .with_mode(mode);
        SessionLifecycleManager::new(request, Box::new(store), collaborators)
    }

    /// Run one request that stores `uid`, returning the issued session id
    async fn login(&self, uid: i64) -> String {
        let mut manager = self.manager(anonymous_request());
        manager.start().await;
        manager.attributes().set("uid", uid);
        manager.save().await.unwrap();
        manager.id().unwrap().to_string()
    }
}

fn anonymous_request() -> RequestContext {
    RequestContext::new("example.com", false)
}

fn request_with_session(sid: &str) -> RequestContext {
    anonymous_request().with_cookie(COOKIE, sid)
}

#[tokio::test]
async fn test_anonymous_request_starts_lazily_without_cookie() {
    let harness = Harness::new();
    let mut manager = harness.manager(anonymous_request());

    assert!(!manager.start().await);
    assert!(manager.is_started_lazily());
    assert!(!manager.is_started());
    assert!(manager.payload().is_empty());

    manager.save().await.unwrap();

    assert!(manager.take_outgoing_cookies().is_empty());
    assert!(harness.handler.inner().is_empty().await);
    assert!(!manager.is_started_lazily());
}

#[tokio::test]
async fn test_written_lazy_session_is_persisted_and_stays_started() {
    let harness = Harness::new();
    let mut manager = harness.manager(anonymous_request());

    assert!(!manager.start().await);
    manager.attributes().set("uid", 7);
    manager.save().await.unwrap();

    assert!(manager.is_active());
    assert!(manager.start().await);
    assert!(manager.is_started());

    let sid = manager.id().unwrap().to_string();
    let cookies = manager.take_outgoing_cookies();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name, COOKIE);
    assert_eq!(cookies[0].value, sid);
    assert_eq!(harness.handler.inner().uid_of(&sid).await, Some(7));
}

#[tokio::test]
async fn test_request_with_session_cookie_starts_eagerly() {
    let harness = Harness::new();
    let sid = harness.login(3).await;

    let mut manager = harness.manager(request_with_session(&sid));
    let started = manager.start().await;

    assert!(started);
    assert_eq!(started, manager.is_active());
    assert_eq!(manager.id(), Some(sid.as_str()));
    assert_eq!(manager.attribute("uid"), Some(&json!(3)));
    // The client already holds this id
    assert!(manager.take_outgoing_cookies().is_empty());
}

#[tokio::test]
async fn test_unknown_cookie_gets_fresh_id() {
    let harness = Harness::new();
    let forged = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    let mut manager = harness.manager(request_with_session(forged));

    assert!(manager.start().await);
    assert_ne!(manager.id(), Some(forged));
    assert_eq!(manager.take_outgoing_cookies().len(), 1);
}

#[tokio::test]
async fn test_obsolete_session_is_destroyed_on_save() {
    let harness = Harness::new();
    let sid = harness.login(5).await;

    let mut manager = harness.manager(request_with_session(&sid));
    assert!(manager.start().await);
    manager.attributes().clear();
    manager.flashes().take_all();

    assert!(manager.is_session_obsolete());
    assert!(manager.payload().contains_key(METADATA_KEY));
    manager.save().await.unwrap();

    assert!(!manager.is_active());
    assert!(!harness.handler.inner().contains(&sid).await);

    let cookies = manager.take_outgoing_cookies();
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].is_removal());
    assert_eq!(cookies[0].expires, Some(NOW - 3600));
    assert!(!manager.request().has_cookie(COOKIE));
}

#[tokio::test]
async fn test_second_save_of_obsolete_session_does_nothing() {
    let harness = Harness::new();
    let mut manager = harness.manager(anonymous_request());
    manager.start().await;

    manager.save().await.unwrap();
    manager.save().await.unwrap();

    assert!(!manager.is_active());
    assert!(manager.id().is_none());
    assert!(harness.handler.inner().is_empty().await);
    assert!(manager.take_outgoing_cookies().is_empty());
}

#[tokio::test]
async fn test_regenerate_without_active_store_only_stamps_metadata() {
    let harness = Harness::new();
    let mut manager = harness.manager(anonymous_request());
    manager.start().await;

    assert!(!manager.regenerate(Some(600)).await);

    assert!(manager.id().is_none());
    assert!(!manager.is_active());
    assert_eq!(manager.metadata().created(), NOW);
    assert_eq!(manager.metadata().lifetime(), 600);
    assert!(manager.metadata().needs_new_id());
    assert!(manager.take_outgoing_cookies().is_empty());
}

#[tokio::test]
async fn test_regenerate_destroys_previous_id() {
    let harness = Harness::new();
    let sid = harness.login(9).await;

    let mut manager = harness.manager(request_with_session(&sid));
    manager.start().await;
    assert!(manager.regenerate(None).await);
    manager.save().await.unwrap();

    let new_sid = manager.id().unwrap().to_string();
    assert_ne!(new_sid, sid);
    assert!(!harness.handler.inner().contains(&sid).await);
    assert_eq!(harness.handler.inner().uid_of(&new_sid).await, Some(9));

    let cookies = manager.take_outgoing_cookies();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].value, new_sid);
}

#[tokio::test]
async fn test_destroy_after_headers_sent_skips_cookie() {
    let harness = Harness::new();
    let sid = harness.login(1).await;

    let mut manager = harness.manager(request_with_session(&sid));
    manager.start().await;
    manager.request_mut().mark_headers_sent();

    manager.destroy().await;

    assert!(!manager.is_active());
    assert!(!harness.handler.inner().contains(&sid).await);
    assert!(manager.take_outgoing_cookies().is_empty());
    // Still visible: the removal could not be sent
    assert!(manager.request().has_cookie(COOKIE));
}

#[tokio::test]
async fn test_destroy_withdraws_cookie_of_new_session() {
    let harness = Harness::new();
    let mut manager = harness.manager(anonymous_request());
    manager.start().await;
    manager.attributes().set("uid", 2);
    assert!(manager.force_start().await);
    assert_eq!(manager.request().outgoing_cookies().len(), 1);

    manager.destroy().await;
    manager.save().await.unwrap();

    assert!(manager.take_outgoing_cookies().is_empty());
    assert!(harness.handler.inner().is_empty().await);
}

#[tokio::test]
async fn test_headless_mode_never_touches_store() {
    let harness = Harness::new();
    let sid = harness.login(4).await;

    let mut manager = harness.manager_in(request_with_session(&sid), ExecutionMode::Headless);
    assert!(!manager.start().await);
    manager.attributes().set("uid", 99);

    assert!(!manager.force_start().await);
    assert!(!manager.regenerate(None).await);
    manager.save().await.unwrap();
    manager.destroy().await;
    manager.delete_all_for_user(4).await;

    assert_eq!(harness.handler.inner().uid_of(&sid).await, Some(4));
    assert!(manager.take_outgoing_cookies().is_empty());
}

#[tokio::test]
async fn test_legacy_keys_are_reported_on_save() {
    let harness = Harness::new();
    let mut manager = harness.manager(anonymous_request());
    manager.start().await;

    manager.payload_mut().insert("zeta".to_string(), json!(1));
    manager.payload_mut().insert("alpha".to_string(), json!("x"));
    manager.attributes().set("fine", true);
    manager.save().await.unwrap();

    let reports = harness.legacy_reports.lock().unwrap();
    assert_eq!(*reports, vec![vec!["alpha".to_string(), "zeta".to_string()]]);
    // Still persisted: the report is a warning only
    assert_eq!(harness.handler.inner().len().await, 1);
}

#[tokio::test]
async fn test_delete_all_for_user() {
    let harness = Harness::new();
    let first = harness.login(42).await;
    let second = harness.login(42).await;
    let other = harness.login(7).await;

    let manager = harness.manager(anonymous_request());
    manager.delete_all_for_user(42).await;

    assert!(!harness.handler.inner().contains(&first).await);
    assert!(!harness.handler.inner().contains(&second).await);
    assert!(harness.handler.inner().contains(&other).await);
}

#[tokio::test]
async fn test_write_gate_blocks_destroy_and_delete() {
    let harness = Harness::new();
    let sid = harness.login(42).await;

    harness.handler.set_session_writable(false);

    let mut manager = harness.manager(request_with_session(&sid));
    manager.start().await;
    manager.destroy().await;
    manager.delete_all_for_user(42).await;

    assert!(manager.is_active());
    assert!(harness.handler.inner().contains(&sid).await);
    assert!(manager.take_outgoing_cookies().is_empty());
}

#[tokio::test]
async fn test_delete_all_for_user_without_sessions_table() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let records = SqliteSessionHandler::new(pool);
    assert!(records.delete_for_user(42).await.is_err());

    let harness = Harness::new();
    let store = NativeSessionStore::new(harness.handler.clone());
    let mut manager = SessionLifecycleManager::new(
        anonymous_request(),
        Box::new(store),
        harness.collaborators(Arc::new(records)),
    );
    manager.start().await;

    manager.delete_all_for_user(42).await;

    assert!(manager.is_started_lazily());
    assert!(manager.payload().is_empty());
}

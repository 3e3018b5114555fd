//! Core trait definitions

use crate::error::SessionResult;
use crate::payload::SessionPayload;
use crate::request::RequestContext;
use crate::types::SessionOptions;
use async_trait::async_trait;

/// Per-request handle on the native session store
///
/// The store owns the session identifier. Physically starting it replaces
/// whatever payload the caller held in memory with the persisted one.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Start the store, resuming `requested_id` when a record exists for it
    /// and issuing a fresh identifier otherwise. Returns the persisted payload.
    async fn start(
        &mut self,
        options: &SessionOptions,
        requested_id: Option<&str>,
    ) -> SessionResult<SessionPayload>;

    /// Persist the payload under the current identifier
    async fn save(&mut self, payload: &SessionPayload) -> SessionResult<()>;

    /// Swap the identifier, optionally destroying the record of the old one
    async fn regenerate_id(&mut self, destroy_old: bool) -> SessionResult<bool>;

    /// Invalidate the session entirely
    async fn destroy(&mut self) -> SessionResult<()>;

    fn is_active(&self) -> bool;

    fn id(&self) -> Option<&str>;
}

/// Persistence backend keyed by session identifier
#[async_trait]
pub trait SessionHandler: Send + Sync {
    /// 读取会话数据
    async fn read(&self, sid: &str) -> SessionResult<Option<String>>;

    /// 写入会话数据
    async fn write(&self, sid: &str, data: &str, uid: i64) -> SessionResult<()>;

    async fn destroy(&self, sid: &str) -> SessionResult<()>;

    /// Drop records idle for longer than `max_lifetime` seconds, returning how many
    async fn gc(&self, max_lifetime: u64) -> SessionResult<u64>;
}

/// Relational view of the session table
#[async_trait]
pub trait SessionRecords: Send + Sync {
    /// Delete every session owned by `uid`
    async fn delete_for_user(&self, uid: i64) -> SessionResult<u64>;
}

/// Negotiates session cookie options for a request
pub trait SessionOptionsResolver: Send + Sync {
    fn options(&self, request: &RequestContext) -> SessionOptions;

    /// Whether the request carries a session cookie worth resuming
    fn has_session(&self, request: &RequestContext) -> bool;
}

/// Whether session writes are currently permitted at all
pub trait WriteSafety: Send + Sync {
    fn is_session_writable(&self) -> bool;
}

/// Writes are always allowed
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysWritable;

impl WriteSafety for AlwaysWritable {
    fn is_session_writable(&self) -> bool {
        true
    }
}

/// Source of the request time, in unix seconds
pub trait Clock: Send + Sync {
    fn request_time(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn request_time(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock frozen at one instant, typically the moment a request arrived
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl FixedClock {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp())
    }
}

impl Clock for FixedClock {
    fn request_time(&self) -> i64 {
        self.0
    }
}

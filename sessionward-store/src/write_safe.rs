//! Write gate around a session handler

use async_trait::async_trait;
use sessionward_core::{SessionHandler, SessionRecords, SessionResult, WriteSafety};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Wraps a handler and drops writes while session writes are disabled
///
/// Clones share the same flag, so the handle given to the lifecycle manager
/// as its [`WriteSafety`] oracle sees toggles made anywhere else.
#[derive(Debug, Clone)]
pub struct WriteSafeSessionHandler<H> {
    inner: H,
    writable: Arc<AtomicBool>,
}

impl<H> WriteSafeSessionHandler<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            writable: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_session_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: Send + Sync> WriteSafety for WriteSafeSessionHandler<H> {
    fn is_session_writable(&self) -> bool {
        self.writable.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<H: SessionHandler> SessionHandler for WriteSafeSessionHandler<H> {
    async fn read(&self, sid: &str) -> SessionResult<Option<String>> {
        self.inner.read(sid).await
    }

    async fn write(&self, sid: &str, data: &str, uid: i64) -> SessionResult<()> {
        if !self.is_session_writable() {
            debug!("Session writes disabled, skipping write");
            return Ok(());
        }
        self.inner.write(sid, data, uid).await
    }

    async fn destroy(&self, sid: &str) -> SessionResult<()> {
        self.inner.destroy(sid).await
    }

    async fn gc(&self, max_lifetime: u64) -> SessionResult<u64> {
        self.inner.gc(max_lifetime).await
    }
}

#[async_trait]
impl<H: SessionRecords> SessionRecords for WriteSafeSessionHandler<H> {
    async fn delete_for_user(&self, uid: i64) -> SessionResult<u64> {
        self.inner.delete_for_user(uid).await
    }
}

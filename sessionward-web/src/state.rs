//! Application state shared by every request

use crate::{WebConfig, WebResult};
use sessionward_core::{
    async_trait, FixedClock, RequestContext, SessionConfig, SessionHandler, SessionRecords,
    SessionResult,
};
use sessionward_lifecycle::{Collaborators, CookieOptionsResolver, SessionLifecycleManager};
use sessionward_store::{MemorySessionHandler, NativeSessionStore, WriteSafeSessionHandler};
use std::sync::Arc;
use tracing::{info, warn};

#[cfg(feature = "sqlite")]
use sessionward_store::SqliteSessionHandler;

/// Where session records live
#[derive(Debug, Clone)]
pub enum SessionBackend {
    Memory(MemorySessionHandler),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteSessionHandler),
}

impl SessionBackend {
    /// Open the backend for `database_url`, falling back to memory without one
    pub async fn open(database_url: Option<&str>) -> SessionResult<Self> {
        match database_url {
            #[cfg(feature = "sqlite")]
            Some(url) => Ok(Self::Sqlite(SqliteSessionHandler::connect(url).await?)),
            #[cfg(not(feature = "sqlite"))]
            Some(url) => {
                warn!(
                    "Built without sqlite support, ignoring database URL {} and keeping sessions in memory",
                    url
                );
                Ok(Self::Memory(MemorySessionHandler::new()))
            }
            None => Ok(Self::Memory(MemorySessionHandler::new())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => "sqlite",
        }
    }
}

#[async_trait]
impl SessionHandler for SessionBackend {
    async fn read(&self, sid: &str) -> SessionResult<Option<String>> {
        match self {
            Self::Memory(handler) => handler.read(sid).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(handler) => handler.read(sid).await,
        }
    }

    async fn write(&self, sid: &str, data: &str, uid: i64) -> SessionResult<()> {
        match self {
            Self::Memory(handler) => handler.write(sid, data, uid).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(handler) => handler.write(sid, data, uid).await,
        }
    }

    async fn destroy(&self, sid: &str) -> SessionResult<()> {
        match self {
            Self::Memory(handler) => handler.destroy(sid).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(handler) => handler.destroy(sid).await,
        }
    }

    async fn gc(&self, max_lifetime: u64) -> SessionResult<u64> {
        match self {
            Self::Memory(handler) => handler.gc(max_lifetime).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(handler) => handler.gc(max_lifetime).await,
        }
    }
}

#[async_trait]
impl SessionRecords for SessionBackend {
    async fn delete_for_user(&self, uid: i64) -> SessionResult<u64> {
        match self {
            Self::Memory(handler) => handler.delete_for_user(uid).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(handler) => handler.delete_for_user(uid).await,
        }
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    pub session_config: SessionConfig,
    /// Session persistence behind the write gate
    pub handler: WriteSafeSessionHandler<SessionBackend>,
    pub resolver: Arc<CookieOptionsResolver>,
}

impl AppState {
    /// Create application state, loading the session configuration and
    /// opening the session backend
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let session_config = match &config.session_config {
            Some(path) => SessionConfig::from_file(path)?,
            None => SessionConfig::default(),
        };
        let backend = SessionBackend::open(config.database_url.as_deref()).await?;

        info!(backend = backend.kind(), "Session backend ready");
        Ok(Self::with_backend(config, session_config, backend))
    }

    pub fn with_backend(
        config: WebConfig,
        session_config: SessionConfig,
        backend: SessionBackend,
    ) -> Self {
        let resolver = Arc::new(CookieOptionsResolver::new(session_config.clone()));
        Self {
            config,
            session_config,
            handler: WriteSafeSessionHandler::new(backend),
            resolver,
        }
    }

    /// Build the lifecycle manager for one request
    ///
    /// The clock is frozen here so every timestamp of the request agrees.
    pub fn session_manager(&self, request: RequestContext) -> SessionLifecycleManager {
        let collaborators = Collaborators::new(self.resolver.clone(), Arc::new(self.handler.clone()))
            .with_clock(Arc::new(FixedClock::now()))
            .with_write_safety(Arc::new(self.handler.clone()))
            .with_mode(self.session_config.execution_mode)
            .with_write_interval(self.session_config.write_interval);

        let store = NativeSessionStore::new(self.handler.clone());
        SessionLifecycleManager::new(request, Box::new(store), collaborators)
    }

    /// Drop session records idle for longer than the configured maximum
    pub async fn collect_garbage(&self) -> u64 {
        match self.handler.gc(self.session_config.gc_max_lifetime).await {
            Ok(removed) => {
                info!(removed, "Session garbage collection finished");
                removed
            }
            Err(e) => {
                warn!("Session garbage collection failed: {}", e);
                0
            }
        }
    }
}

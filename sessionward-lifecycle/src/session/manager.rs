//! Session Lifecycle Manager
//!
//! Decides when a request's session is started, persisted, regenerated or
//! destroyed. Anonymous visitors without a session cookie get a lazily
//! started, memory-only session: nothing reaches the store and no cookie is
//! issued until something is actually written, which keeps anonymous pages
//! cacheable by reverse proxies.

use super::bags::{AttributeBag, FlashBag};
use serde_json::Value;
use sessionward_core::{
    is_empty_value, AlwaysWritable, Clock, ExecutionMode, MetadataBag, RequestContext,
    SessionError, SessionOptions, SessionOptionsResolver, SessionPayload, SessionRecords,
    SessionResult, SessionState, SessionStore, SetCookie, SystemClock, WriteSafety,
    ATTRIBUTES_KEY, FLASHES_KEY, METADATA_KEY,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Receives the payload keys written around the typed bags
pub type LegacyKeysHook = Arc<dyn Fn(&[String]) + Send + Sync>;

/// Reports legacy keys as a deprecation warning
pub fn warn_legacy_keys() -> LegacyKeysHook {
    Arc::new(|keys: &[String]| {
        warn!(
            keys = %keys.join(", "),
            "Storing values directly in the session payload is deprecated, use the attribute bag instead"
        );
    })
}

/// Everything a manager consults besides the request and the store
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn SessionOptionsResolver>,
    pub records: Arc<dyn SessionRecords>,
    pub clock: Arc<dyn Clock>,
    pub write_safety: Arc<dyn WriteSafety>,
    pub mode: ExecutionMode,
    pub legacy_keys_hook: LegacyKeysHook,
    /// Minimum seconds between metadata `last_used` refreshes
    pub write_interval: u64,
    /// Bags registered on top of attributes and flashes
    pub extra_bags: Vec<String>,
}

impl Collaborators {
    pub fn new(
        resolver: Arc<dyn SessionOptionsResolver>,
        records: Arc<dyn SessionRecords>,
    ) -> Self {
        Self {
            resolver,
            records,
            clock: Arc::new(SystemClock),
            write_safety: Arc::new(AlwaysWritable),
            mode: ExecutionMode::Interactive,
            legacy_keys_hook: warn_legacy_keys(),
            write_interval: 180,
            extra_bags: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_write_safety(mut self, write_safety: Arc<dyn WriteSafety>) -> Self {
        self.write_safety = write_safety;
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_legacy_keys_hook(mut self, hook: LegacyKeysHook) -> Self {
        self.legacy_keys_hook = hook;
        self
    }

    pub fn with_write_interval(mut self, seconds: u64) -> Self {
        self.write_interval = seconds;
        self
    }

    pub fn with_bag(mut self, storage_key: impl Into<String>) -> Self {
        self.extra_bags.push(storage_key.into());
        self
    }
}

/// Per-request session lifecycle policy over a [`SessionStore`]
pub struct SessionLifecycleManager {
    request: RequestContext,
    store: Box<dyn SessionStore>,
    collaborators: Collaborators,
    state: SessionState,
    metadata: MetadataBag,
    bag_keys: Vec<String>,
    /// Payload as last read from or written to the store under the current id
    persisted: Option<SessionPayload>,
}

impl SessionLifecycleManager {
    pub fn new(
        request: RequestContext,
        store: Box<dyn SessionStore>,
        collaborators: Collaborators,
    ) -> Self {
        let mut bag_keys = vec![ATTRIBUTES_KEY.to_string(), FLASHES_KEY.to_string()];
        bag_keys.extend(collaborators.extra_bags.iter().cloned());

        Self {
            request,
            store,
            collaborators,
            state: SessionState::default(),
            metadata: MetadataBag::default(),
            bag_keys,
            persisted: None,
        }
    }

    fn is_headless(&self) -> bool {
        self.collaborators.mode.is_headless()
    }

    fn is_writable(&self) -> bool {
        self.collaborators.write_safety.is_session_writable()
    }

    fn request_time(&self) -> i64 {
        self.collaborators.clock.request_time()
    }

    /// Start the session for the current request
    ///
    /// Returns true only when the store was physically started; a lazily
    /// started session reports false until something forces it into existence.
    pub async fn start(&mut self) -> bool {
        if self.state.is_open() {
            return self.state.started;
        }

        self.state.options = self.collaborators.resolver.options(&self.request);
        self.state.closed = false;

        let mut result = false;
        if self.collaborators.resolver.has_session(&self.request) {
            result = self.force_start().await;
        }

        if !result {
            self.persisted = None;
            self.state.data = SessionPayload::new();
            self.load_metadata();
            self.state.started = false;
            self.state.started_lazily = true;
            debug!("Session started lazily");
        }

        result
    }

    /// Physically start the store, keeping data written to a lazy session
    pub async fn force_start(&mut self) -> bool {
        if self.is_headless() {
            return false;
        }

        // Starting the store replaces the in-memory payload with the persisted one
        let snapshot = if self.state.started_lazily {
            self.metadata.store_into(&mut self.state.data);
            Some(self.state.data.clone())
        } else {
            None
        };

        let requested = self
            .request
            .cookie(&self.state.options.cookie_name)
            .map(str::to_string);

        let loaded = match self
            .store
            .start(&self.state.options, requested.as_deref())
            .await
        {
            Ok(loaded) => loaded,
            Err(e) => {
                e.log();
                if let Some(snapshot) = snapshot {
                    self.state.data = snapshot;
                }
                return false;
            }
        };

        self.persisted = Some(loaded.clone());
        self.state.data = snapshot.unwrap_or(loaded);
        self.load_metadata();
        self.state.started = true;

        if self.metadata.needs_new_id() {
            if requested.is_some() && self.store.id() == requested.as_deref() {
                match self.store.regenerate_id(true).await {
                    Ok(_) => info!("Replaced resumed session id flagged for regeneration"),
                    Err(e) => e.log(),
                }
            }
            self.metadata.clear_new_id();
        }

        if self.store.id() != requested.as_deref() {
            // Nothing is stored under a new id yet
            self.persisted = None;
            self.queue_session_cookie();
        }

        debug!(resumed = requested.is_some(), "Session store started");
        self.store.is_active()
    }

    /// Persist the session, or destroy it when it holds nothing worth keeping
    pub async fn save(&mut self) -> SessionResult<()> {
        if self.is_headless() {
            return Ok(());
        }

        let result = self.persist().await;
        self.report_legacy_keys();
        self.state.started_lazily = false;
        result
    }

    async fn persist(&mut self) -> SessionResult<()> {
        if self.is_session_obsolete() {
            if self.store.is_active() {
                self.destroy().await;
            }
            return Ok(());
        }

        if !self.store.is_active() && !self.force_start().await {
            return Err(SessionError::inactive("save"));
        }

        self.metadata.store_into(&mut self.state.data);
        // Metadata only changes once per write interval, so read-mostly sessions skip the write
        if self.persisted.as_ref() == Some(&self.state.data) {
            debug!("Session unchanged, skipping write");
            return Ok(());
        }

        self.store.save(&self.state.data).await?;
        self.persisted = Some(self.state.data.clone());
        Ok(())
    }

    /// Issue a new session identifier; the old one is always destroyed
    ///
    /// Without an active store there is no identifier to swap yet: the
    /// metadata is restamped instead and false is returned.
    pub async fn regenerate(&mut self, lifetime: Option<u64>) -> bool {
        if self.is_headless() {
            return false;
        }

        let now = self.request_time();

        if !self.store.is_active() {
            let lifetime = lifetime.unwrap_or(self.state.options.cookie_lifetime);
            self.metadata.stamp_new(lifetime, now);
            return false;
        }

        if let Some(lifetime) = lifetime {
            self.state.options.cookie_lifetime = lifetime;
        }
        self.metadata
            .stamp_new(self.state.options.cookie_lifetime, now);

        match self.store.regenerate_id(true).await {
            Ok(true) => {
                self.persisted = None;
                self.metadata.clear_new_id();
                self.queue_session_cookie();
                true
            }
            Ok(false) => false,
            Err(e) => {
                e.log();
                false
            }
        }
    }

    /// Invalidate the session and tell the client to drop its cookie
    pub async fn destroy(&mut self) {
        if self.is_headless() {
            return;
        }
        if !self.is_writable() {
            debug!("Session writes disabled, not destroying session");
            return;
        }

        if let Err(e) = self.store.destroy().await {
            e.log();
        }

        let name = self.state.options.cookie_name.clone();
        self.request.discard_cookie(&name);
        // Set-Cookie can only be emitted before the headers go out
        if self.request.has_cookie(&name) && !self.request.headers_sent() {
            let removal = SetCookie::removal(&self.state.options, self.request_time());
            self.request.queue_cookie(removal);
            self.request.remove_cookie(&name);
        }

        self.persisted = None;
        self.state.data.clear();
        self.state.started = false;
        self.state.started_lazily = false;
        self.state.closed = true;
        info!("Session destroyed");
    }

    /// Best-effort removal of every stored session of a user
    pub async fn delete_all_for_user(&self, uid: i64) {
        if !self.is_writable() || self.is_headless() {
            return;
        }

        // The sessions table may not exist yet; nothing here may fail the caller
        match self.collaborators.records.delete_for_user(uid).await {
            Ok(deleted) => info!(uid, deleted, "Deleted user sessions"),
            Err(e) => debug!(uid, error = %e, "Ignoring failure while deleting user sessions"),
        }
    }

    /// True when, metadata and empty bags aside, the payload carries nothing
    pub fn is_session_obsolete(&self) -> bool {
        self.state.data.iter().all(|(key, value)| {
            if key == METADATA_KEY {
                true
            } else if self.bag_keys.contains(key) {
                is_empty_value(value)
            } else {
                false
            }
        })
    }

    fn legacy_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .state
            .data
            .keys()
            .filter(|key| *key != METADATA_KEY && !self.bag_keys.contains(*key))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    fn report_legacy_keys(&self) {
        let keys = self.legacy_keys();
        if !keys.is_empty() {
            (self.collaborators.legacy_keys_hook)(&keys);
        }
    }

    fn load_metadata(&mut self) {
        self.metadata = MetadataBag::initialize(
            &self.state.data,
            self.request_time(),
            self.collaborators.write_interval,
            self.state.options.cookie_lifetime,
        );
    }

    fn queue_session_cookie(&mut self) {
        let Some(id) = self.store.id() else {
            return;
        };
        let cookie = SetCookie::session(&self.state.options, id, self.request_time());
        if !self.request.queue_cookie(cookie) {
            warn!("Headers already sent, cannot issue the session cookie");
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.started
    }

    pub fn is_started_lazily(&self) -> bool {
        self.state.started_lazily
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed
    }

    /// Whether the underlying store is physically active
    pub fn is_active(&self) -> bool {
        self.store.is_active()
    }

    pub fn id(&self) -> Option<&str> {
        self.store.id()
    }

    pub fn name(&self) -> &str {
        &self.state.options.cookie_name
    }

    pub fn options(&self) -> &SessionOptions {
        &self.state.options
    }

    pub fn metadata(&self) -> &MetadataBag {
        &self.metadata
    }

    pub fn csrf_token_seed(&self) -> Option<&str> {
        self.metadata.csrf_token_seed()
    }

    pub fn set_csrf_token_seed(&mut self, seed: impl Into<String>) {
        self.metadata.set_csrf_token_seed(seed);
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.state
            .data
            .get(ATTRIBUTES_KEY)
            .and_then(Value::as_object)
            .and_then(|attributes| attributes.get(name))
    }

    pub fn attributes(&mut self) -> AttributeBag<'_> {
        AttributeBag::new(&mut self.state.data, ATTRIBUTES_KEY)
    }

    pub fn flashes(&mut self) -> FlashBag<'_> {
        FlashBag::new(&mut self.state.data, FLASHES_KEY)
    }

    pub fn payload(&self) -> &SessionPayload {
        &self.state.data
    }

    /// Raw payload access; keys written here outside a bag are reported on save
    pub fn payload_mut(&mut self) -> &mut SessionPayload {
        &mut self.state.data
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut RequestContext {
        &mut self.request
    }

    pub fn take_outgoing_cookies(&mut self) -> Vec<SetCookie> {
        self.request.take_outgoing_cookies()
    }
}

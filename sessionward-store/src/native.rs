//! Native session store
//!
//! One store handle lives for one request. It resumes the session named by
//! the request's cookie when the backend knows it and otherwise issues a
//! fresh identifier (strict mode: client-chosen ids are never adopted).

use crate::id::{generate_session_id, is_well_formed};
use async_trait::async_trait;
use serde_json::Value;
use sessionward_core::{
    owner_uid, SessionError, SessionHandler, SessionOptions, SessionPayload, SessionResult,
    SessionStore,
};
use tracing::{debug, info, warn};

pub struct NativeSessionStore<H> {
    handler: H,
    id: Option<String>,
    active: bool,
}

impl<H: SessionHandler> NativeSessionStore<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            id: None,
            active: false,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    async fn load(&self, sid: &str) -> SessionResult<Option<SessionPayload>> {
        let Some(raw) = self.handler.read(sid).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(payload)) => Ok(Some(payload)),
            Ok(_) | Err(_) => {
                warn!("Session record is not a JSON object, starting over");
                Ok(Some(SessionPayload::new()))
            }
        }
    }
}

#[async_trait]
impl<H: SessionHandler> SessionStore for NativeSessionStore<H> {
    async fn start(
        &mut self,
        _options: &SessionOptions,
        requested_id: Option<&str>,
    ) -> SessionResult<SessionPayload> {
        if self.active {
            if let Some(id) = self.id.clone() {
                return Ok(self.load(&id).await?.unwrap_or_default());
            }
        }

        if let Some(requested) = requested_id.filter(|sid| is_well_formed(sid)) {
            if let Some(payload) = self.load(requested).await? {
                debug!("Resumed existing session");
                self.id = Some(requested.to_string());
                self.active = true;
                return Ok(payload);
            }
            debug!("Unknown session id presented, issuing a new one");
        }

        self.id = Some(generate_session_id());
        self.active = true;
        Ok(SessionPayload::new())
    }

    async fn save(&mut self, payload: &SessionPayload) -> SessionResult<()> {
        let id = match (&self.id, self.active) {
            (Some(id), true) => id,
            _ => return Err(SessionError::inactive("save")),
        };

        let data = serde_json::to_string(payload)?;
        self.handler.write(id, &data, owner_uid(payload)).await
    }

    async fn regenerate_id(&mut self, destroy_old: bool) -> SessionResult<bool> {
        if !self.active {
            return Ok(false);
        }

        let new_id = generate_session_id();
        if let Some(old_id) = self.id.replace(new_id) {
            if destroy_old {
                self.handler.destroy(&old_id).await?;
            }
        }

        info!(destroy_old, "Session identifier regenerated");
        Ok(true)
    }

    async fn destroy(&mut self) -> SessionResult<()> {
        self.active = false;
        if let Some(id) = self.id.take() {
            self.handler.destroy(&id).await?;
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySessionHandler;
    use serde_json::json;
    use sessionward_core::ATTRIBUTES_KEY;

    fn payload_with_uid(uid: i64) -> SessionPayload {
        let mut payload = SessionPayload::new();
        payload.insert(ATTRIBUTES_KEY.to_string(), json!({ "uid": uid }));
        payload
    }

    #[tokio::test]
    async fn test_start_issues_new_id_for_unknown_cookie() {
        let mut store = NativeSessionStore::new(MemorySessionHandler::new());
        let presented = generate_session_id();

        let payload = store
            .start(&SessionOptions::default(), Some(&presented))
            .await
            .unwrap();

        assert!(payload.is_empty());
        assert!(store.is_active());
        assert_ne!(store.id(), Some(presented.as_str()));
    }

    #[tokio::test]
    async fn test_start_resumes_known_session() {
        let handler = MemorySessionHandler::new();
        let mut first = NativeSessionStore::new(handler.clone());
        first.start(&SessionOptions::default(), None).await.unwrap();
        first.save(&payload_with_uid(5)).await.unwrap();
        let sid = first.id().unwrap().to_string();

        let mut second = NativeSessionStore::new(handler.clone());
        let payload = second
            .start(&SessionOptions::default(), Some(&sid))
            .await
            .unwrap();

        assert_eq!(second.id(), Some(sid.as_str()));
        assert_eq!(owner_uid(&payload), 5);
        assert_eq!(handler.uid_of(&sid).await, Some(5));
    }

    #[tokio::test]
    async fn test_save_requires_active_store() {
        let mut store = NativeSessionStore::new(MemorySessionHandler::new());
        let result = store.save(&SessionPayload::new()).await;
        assert!(matches!(result, Err(SessionError::Inactive { .. })));
    }

    #[tokio::test]
    async fn test_regenerate_destroys_old_record() {
        let handler = MemorySessionHandler::new();
        let mut store = NativeSessionStore::new(handler.clone());

        assert!(!store.regenerate_id(true).await.unwrap());

        store.start(&SessionOptions::default(), None).await.unwrap();
        store.save(&payload_with_uid(1)).await.unwrap();
        let old = store.id().unwrap().to_string();

        assert!(store.regenerate_id(true).await.unwrap());
        assert_ne!(store.id(), Some(old.as_str()));
        assert!(!handler.contains(&old).await);
    }

    #[tokio::test]
    async fn test_destroy_forgets_id() {
        let handler = MemorySessionHandler::new();
        let mut store = NativeSessionStore::new(handler.clone());
        store.start(&SessionOptions::default(), None).await.unwrap();
        store.save(&payload_with_uid(1)).await.unwrap();

        store.destroy().await.unwrap();
        assert!(!store.is_active());
        assert!(store.id().is_none());
        assert!(handler.is_empty().await);
    }
}

//! Process-local session handler

use crate::id::hash_session_id;
use async_trait::async_trait;
use sessionward_core::{SessionHandler, SessionRecords, SessionResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct MemoryRecord {
    data: String,
    uid: i64,
    timestamp: i64,
}

/// Session handler backed by a shared in-memory map
#[derive(Debug, Clone, Default)]
pub struct MemorySessionHandler {
    records: Arc<RwLock<HashMap<String, MemoryRecord>>>,
}

impl MemorySessionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn contains(&self, sid: &str) -> bool {
        self.records
            .read()
            .await
            .contains_key(&hash_session_id(sid))
    }

    /// Owner recorded for a session
    pub async fn uid_of(&self, sid: &str) -> Option<i64> {
        self.records
            .read()
            .await
            .get(&hash_session_id(sid))
            .map(|record| record.uid)
    }

    /// Backdate a record, for exercising garbage collection
    pub async fn touch(&self, sid: &str, timestamp: i64) {
        if let Some(record) = self.records.write().await.get_mut(&hash_session_id(sid)) {
            record.timestamp = timestamp;
        }
    }
}

#[async_trait]
impl SessionHandler for MemorySessionHandler {
    async fn read(&self, sid: &str) -> SessionResult<Option<String>> {
        Ok(self
            .records
            .read()
            .await
            .get(&hash_session_id(sid))
            .map(|record| record.data.clone()))
    }

    async fn write(&self, sid: &str, data: &str, uid: i64) -> SessionResult<()> {
        let record = MemoryRecord {
            data: data.to_string(),
            uid,
            timestamp: chrono::Utc::now().timestamp(),
        };
        self.records
            .write()
            .await
            .insert(hash_session_id(sid), record);
        Ok(())
    }

    async fn destroy(&self, sid: &str) -> SessionResult<()> {
        self.records.write().await.remove(&hash_session_id(sid));
        Ok(())
    }

    async fn gc(&self, max_lifetime: u64) -> SessionResult<u64> {
        let cutoff = chrono::Utc::now().timestamp() - max_lifetime as i64;
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.timestamp >= cutoff);
        let removed = (before - records.len()) as u64;
        debug!("Garbage collected {} in-memory sessions", removed);
        Ok(removed)
    }
}

#[async_trait]
impl SessionRecords for MemorySessionHandler {
    async fn delete_for_user(&self, uid: i64) -> SessionResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.uid != uid);
        Ok((before - records.len()) as u64)
    }
}

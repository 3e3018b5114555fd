//! Session metadata record
//!
//! Persisted next to the session data under [`METADATA_KEY`]. Carries the
//! creation/last-use stamps, the cookie lifetime the session was issued with
//! and whether the session still needs a fresh identifier.

use crate::payload::{SessionPayload, METADATA_KEY};
use serde::{Deserialize, Serialize};
use tracing::warn;

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataBag {
    #[serde(rename = "c")]
    created: i64,
    #[serde(rename = "u")]
    last_used: i64,
    #[serde(rename = "l")]
    lifetime: u64,
    #[serde(rename = "n", default, skip_serializing_if = "is_false")]
    needs_new_id: bool,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    csrf_token_seed: Option<String>,
}

impl MetadataBag {
    /// Load the record from the payload, or stamp a new one when the payload has none
    ///
    /// `last_used` only moves when at least `update_threshold` seconds passed,
    /// so that read-mostly sessions are not rewritten on every request.
    pub fn initialize(
        payload: &SessionPayload,
        now: i64,
        update_threshold: u64,
        default_lifetime: u64,
    ) -> Self {
        match payload.get(METADATA_KEY) {
            Some(raw) => match serde_json::from_value::<MetadataBag>(raw.clone()) {
                Ok(mut bag) => {
                    if now - bag.last_used >= update_threshold as i64 {
                        bag.last_used = now;
                    }
                    bag
                }
                Err(e) => {
                    warn!("Discarding unreadable session metadata: {}", e);
                    Self::created_at(now, default_lifetime)
                }
            },
            None => Self::created_at(now, default_lifetime),
        }
    }

    fn created_at(now: i64, lifetime: u64) -> Self {
        Self {
            created: now,
            last_used: now,
            lifetime,
            needs_new_id: false,
            csrf_token_seed: None,
        }
    }

    /// Restamp the record as belonging to a brand new session
    ///
    /// The CSRF seed belongs to the old identity and is dropped.
    pub fn stamp_new(&mut self, lifetime: u64, now: i64) {
        self.created = now;
        self.last_used = now;
        self.lifetime = lifetime;
        self.needs_new_id = true;
        self.clear_csrf_token_seed();
    }

    /// The session now runs under a freshly issued identifier
    pub fn clear_new_id(&mut self) {
        self.needs_new_id = false;
    }

    pub fn needs_new_id(&self) -> bool {
        self.needs_new_id
    }

    pub fn created(&self) -> i64 {
        self.created
    }

    pub fn last_used(&self) -> i64 {
        self.last_used
    }

    pub fn lifetime(&self) -> u64 {
        self.lifetime
    }

    pub fn csrf_token_seed(&self) -> Option<&str> {
        self.csrf_token_seed.as_deref()
    }

    pub fn set_csrf_token_seed(&mut self, seed: impl Into<String>) {
        self.csrf_token_seed = Some(seed.into());
    }

    pub fn clear_csrf_token_seed(&mut self) {
        self.csrf_token_seed = None;
    }

    /// Write the record back into the payload
    pub fn store_into(&self, payload: &mut SessionPayload) {
        match serde_json::to_value(self) {
            Ok(value) => {
                payload.insert(METADATA_KEY.to_string(), value);
            }
            Err(e) => warn!("Failed to serialize session metadata: {}", e),
        }
    }
}

//! Sessionward Lifecycle - cookie-based session lifecycle management
//!
//! This crate holds the policy layered over a native session store:
//!
//! - Lazy start, so anonymous visitors never receive a session cookie
//! - Persist-or-destroy on save, depending on whether the session holds user data
//! - Regeneration that always destroys the previous identifier
//! - Best-effort purge of every session a user owns
//!
//! ## Architecture
//!
//! - **Core** (sessionward-core): shared types and collaborator traits
//! - **Store** (sessionward-store): native store and persistence backends
//! - **Lifecycle** (this crate): the policy
//! - **Presentation** (sessionward-web): HTTP integration

pub mod session;

pub use session::{
    warn_legacy_keys, AttributeBag, Collaborators, CookieOptionsResolver, FlashBag,
    LegacyKeysHook, SessionLifecycleManager,
};

//! Session Lifecycle Module
//!
//! Lazy-start session policy, typed bags and cookie option resolution.

pub mod bags;
pub mod manager;
pub mod resolver;

pub use bags::{AttributeBag, FlashBag};
pub use manager::{warn_legacy_keys, Collaborators, LegacyKeysHook, SessionLifecycleManager};
pub use resolver::CookieOptionsResolver;

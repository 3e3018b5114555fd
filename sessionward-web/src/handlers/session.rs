//! Demo endpoints driving the session lifecycle

use crate::{Session, WebError, WebResult};
use axum::{extract::Path, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sessionward_core::{owner_uid, UID_ATTRIBUTE};
use sessionward_lifecycle::SessionLifecycleManager;
use tracing::info;

const VISITS_ATTRIBUTE: &str = "visits";

/// What a client may learn about its own session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    /// Owner of the session, 0 when anonymous
    pub uid: i64,
    pub visits: u64,
    /// Whether the store was physically started for this request
    pub started: bool,
    pub started_lazily: bool,
    /// Status messages, shown once
    pub messages: Vec<Value>,
}

impl SessionView {
    fn of(manager: &SessionLifecycleManager, messages: Vec<Value>) -> Self {
        Self {
            uid: owner_uid(manager.payload()),
            visits: visits(manager),
            started: manager.is_started(),
            started_lazily: manager.is_started_lazily(),
            messages,
        }
    }
}

fn visits(manager: &SessionLifecycleManager) -> u64 {
    manager
        .attribute(VISITS_ATTRIBUTE)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Read-only view; anonymous visitors stay without a cookie
pub async fn show_session(session: Session) -> Json<SessionView> {
    let mut manager = session.lock().await;
    let messages = manager.flashes().take("status");
    Json(SessionView::of(&manager, messages))
}

/// Count a visit, which gives anonymous visitors a session
pub async fn record_visit(session: Session) -> Json<SessionView> {
    let mut manager = session.lock().await;
    let count = visits(&manager) + 1;
    manager.attributes().set(VISITS_ATTRIBUTE, count);
    Json(SessionView::of(&manager, Vec::new()))
}

pub async fn login(session: Session, Path(uid): Path<i64>) -> WebResult<Json<SessionView>> {
    if uid <= 0 {
        return Err(WebError::BadRequest(format!("Invalid user id {}", uid)));
    }

    let mut manager = session.lock().await;
    // A new identity never keeps the identifier of the old one
    manager.regenerate(None).await;
    manager.attributes().set(UID_ATTRIBUTE, uid);
    manager
        .flashes()
        .add("status", format!("Logged in as user {}", uid));

    info!(uid, "User logged in");
    Ok(Json(SessionView::of(&manager, Vec::new())))
}

pub async fn logout(session: Session) -> StatusCode {
    let mut manager = session.lock().await;
    let uid = owner_uid(manager.payload());
    manager.destroy().await;

    info!(uid, "User logged out");
    StatusCode::NO_CONTENT
}

/// Sign a user out everywhere. Only the user themselves may do this.
pub async fn delete_user_sessions(
    session: Session,
    Path(uid): Path<i64>,
) -> WebResult<StatusCode> {
    let mut manager = session.lock().await;
    let current = owner_uid(manager.payload());
    if current == 0 || current != uid {
        return Err(WebError::Forbidden(format!(
            "Not allowed to delete sessions of user {}",
            uid
        )));
    }

    manager.delete_all_for_user(uid).await;
    // The current session was among them; make sure save does not bring it back
    manager.destroy().await;
    Ok(StatusCode::NO_CONTENT)
}

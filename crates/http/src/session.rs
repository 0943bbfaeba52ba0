//! Cookie-identified sessions and their one-shot flash messages.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

pub const SESSION_COOKIE: &str = "classifieds_session";

/// Opaque session identifier stored in [`SESSION_COOKIE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    pub severity: Severity,
    pub message: String,
}

/// Session-scoped queue of messages, each read exactly once.
pub trait FlashStore: Send + Sync {
    fn push(&self, session: SessionId, message: FlashMessage);

    /// Remove and return everything queued for `session`, oldest first.
    fn drain(&self, session: SessionId) -> Vec<FlashMessage>;
}

/// In-process store; sessions are forgotten once drained.
///
/// A queue lives until its session renders a page again, so messages for a
/// session that never returns stay in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryFlashStore {
    queues: DashMap<SessionId, Vec<FlashMessage>>,
}

impl MemoryFlashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlashStore for MemoryFlashStore {
    fn push(&self, session: SessionId, message: FlashMessage) {
        self.queues.entry(session).or_default().push(message);
    }

    fn drain(&self, session: SessionId) -> Vec<FlashMessage> {
        self.queues
            .remove(&session)
            .map(|(_, messages)| messages)
            .unwrap_or_default()
    }
}

/// Handle to the current session's flash queue, extracted by handlers.
#[derive(Clone)]
pub struct Flash {
    session: SessionId,
    store: Arc<dyn FlashStore>,
}

impl Flash {
    pub fn new(session: SessionId, store: Arc<dyn FlashStore>) -> Self {
        Self { session, store }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Queue a message for the next render of this session.
    pub fn add(&self, severity: Severity, message: impl Into<String>) {
        self.store.push(
            self.session,
            FlashMessage {
                severity,
                message: message.into(),
            },
        );
    }

    pub fn success(&self, message: impl Into<String>) {
        self.add(Severity::Success, message);
    }

    pub fn drain(&self) -> Vec<FlashMessage> {
        self.store.drain(self.session)
    }
}

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Flash>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session layer is not installed")))
    }
}

/// Middleware resolving the session cookie, issuing one on first contact.
pub async fn session_middleware(
    State(store): State<Arc<dyn FlashStore>>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
        .map(SessionId);
    let session = existing.unwrap_or_default();

    request
        .extensions_mut()
        .insert(Flash::new(session, Arc::clone(&store)));

    let mut response = next.run(request).await;

    if existing.is_none() {
        let cookie = Cookie::build((SESSION_COOKIE, session.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode session cookie"),
        }
    }

    response
}

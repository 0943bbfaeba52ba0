//! Resolves the requesting [`Principal`] from a bearer token.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use classifieds_authz::{Principal, TokenCodec};

use crate::error::AppError;

/// Token verification shared with handlers through a request extension.
#[derive(Debug, Clone)]
pub struct Authenticator {
    codec: TokenCodec,
    cookie_name: String,
}

impl Authenticator {
    pub fn new(codec: TokenCodec, cookie_name: impl Into<String>) -> Self {
        Self {
            codec,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// `Authorization: Bearer` wins over the token cookie.
    fn token(&self, headers: &HeaderMap) -> Option<String> {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string());

        bearer.or_else(|| {
            CookieJar::from_headers(headers)
                .get(&self.cookie_name)
                .map(|cookie| cookie.value().to_string())
        })
    }

    /// Anonymous when no token is presented or the token is unusable.
    ///
    /// Pages that need a principal refuse anonymous requesters themselves.
    pub fn authenticate(&self, headers: &HeaderMap) -> Option<Principal> {
        let token = self.token(headers)?;

        match self.codec.verify(&token) {
            Ok(principal) => Some(principal),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unusable access token");
                None
            }
        }
    }
}

/// The requester, `None` when anonymous.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Principal>);

impl CurrentUser {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = parts
            .extensions
            .get::<Arc<Authenticator>>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("auth layer is not installed")))?;

        Ok(CurrentUser(authenticator.authenticate(&parts.headers)))
    }
}

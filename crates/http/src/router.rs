//! Router builder for the HTTP server

use std::{sync::Arc, time::Duration};

use axum::{middleware, Extension, Router};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use crate::{
    auth::Authenticator,
    session::{session_middleware, FlashStore},
    MakeRequestUuid,
};

/// Builder for constructing the main HTTP router.
///
/// Layers wrap the routes registered before them, so mount routes first.
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Mount a module's router under `/{module_name}`
    pub fn mount_module(mut self, module_name: &str, module_router: Router) -> Self {
        let path = format!("/{}", module_name);
        self.router = self.router.nest(&path, module_router);
        self
    }

    /// Resolve the session cookie and expose its flash queue to handlers
    pub fn with_sessions(mut self, store: Arc<dyn FlashStore>) -> Self {
        self.router = self
            .router
            .layer(middleware::from_fn_with_state(store, session_middleware));
        self
    }

    /// Make token verification available to the `CurrentUser` extractor
    pub fn with_auth(mut self, authenticator: Arc<Authenticator>) -> Self {
        self.router = self.router.layer(Extension(authenticator));
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Add request ID middleware; the ID is echoed back on the response
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        self
    }

    /// Add timeout middleware
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self
            .router
            .layer(TimeoutLayer::new(Duration::from_millis(timeout_ms)));
        self
    }

    /// Build the final router
    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::CurrentUser,
        session::{Flash, MemoryFlashStore, SESSION_COOKIE},
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        routing::get,
    };
    use classifieds_authz::TokenCodec;
    use tower::ServiceExt;

    fn app(router: Router) -> Router {
        RouterBuilder::new()
            .mount_module("test", router)
            .with_sessions(Arc::new(MemoryFlashStore::new()))
            .with_auth(Arc::new(Authenticator::new(
                TokenCodec::new("secret", 60),
                "classifieds_token",
            )))
            .with_request_id()
            .with_timeout(5000)
            .build()
    }

    #[tokio::test]
    async fn test_module_mounting() {
        let router = app(Router::new().route("/", get(|| async { "module" })));

        let response = router
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"module");
    }

    #[tokio::test]
    async fn first_visit_gets_a_session_cookie() {
        let router = app(Router::new().route("/", get(|| async { "ok" })));

        let response = router
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(cookie.starts_with(SESSION_COOKIE));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn flash_survives_until_next_request_of_same_session() {
        let router = app(
            Router::new()
                .route("/push", get(|flash: Flash| async move {
                    flash.success("done");
                    "queued"
                }))
                .route("/read", get(|flash: Flash| async move {
                    flash
                        .drain()
                        .into_iter()
                        .map(|m| m.message)
                        .collect::<Vec<_>>()
                        .join(",")
                })),
        );

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/test/push").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string();

        let read = |cookie: Option<String>| {
            let router = router.clone();
            async move {
                let mut request = Request::builder().uri("/test/read");
                if let Some(cookie) = cookie {
                    request = request.header(header::COOKIE, cookie);
                }
                let response = router.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
                let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
                String::from_utf8(body.to_vec()).unwrap()
            }
        };

        assert_eq!(read(None).await, "");
        assert_eq!(read(Some(cookie.clone())).await, "done");
        assert_eq!(read(Some(cookie)).await, "");
    }

    #[tokio::test]
    async fn current_user_is_anonymous_without_token() {
        let router = app(Router::new().route(
            "/",
            get(|user: CurrentUser| async move {
                if user.principal().is_some() { "user" } else { "anonymous" }
            }),
        ));

        let response = router
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"anonymous");
    }
}

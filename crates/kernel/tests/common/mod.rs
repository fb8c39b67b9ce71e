#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`TestApp`] wraps the REAL kernel router over a fresh in-memory menu
//! store, so every test starts from an empty navigation tree and needs no
//! external services.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use uuid::Uuid;

use wayfinder_kernel::{AppState, MemoryMenuStore, routes};
use wayfinder_test_utils::{TestMenu, TestViewer, superuser};

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Create a test application over an empty in-memory store.
    pub fn new() -> Self {
        let state = AppState::with_store(Arc::new(MemoryMenuStore::new()), "memory");

        // Must match main.rs, minus CORS
        let router = routes::router()
            .layer(tower_http::trace::TraceLayer::new_for_http())
            .with_state(state.clone());

        Self { router, state }
    }

    /// Send a request through the router.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request as `viewer`, with an optional JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        viewer: &TestViewer,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in viewer.headers() {
            builder = builder.header(name, value);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.request(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// GET as `viewer`.
    pub async fn get(&self, uri: &str, viewer: &TestViewer) -> (StatusCode, JsonValue) {
        self.send(Method::GET, uri, viewer, None).await
    }

    /// Create a menu through the admin API and return its id.
    ///
    /// # Panics
    ///
    /// Panics unless the API answers 201 Created.
    pub async fn create_menu(&self, menu: TestMenu) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/admin/menus",
                &superuser(),
                Some(menu.to_json()),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body["id"].as_str().unwrap().parse().unwrap()
    }
}

/// Read a response body as JSON. Empty bodies read as `null`.
pub async fn body_json(response: Response) -> JsonValue {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return JsonValue::Null;
    }
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

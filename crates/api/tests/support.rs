use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use slotwise_api::{router, AppContext};
use slotwise_domain::AppConfig;
use slotwise_infra::GoogleEndpoints;
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-battery";

/// Router over a throwaway database. Google points at a closed local port
/// and is left unconfigured.
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    router: Router,
    _temp_dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let mut config = AppConfig::default();
        config.database.path = temp_dir.path().join("api.db").display().to_string();
        config.database.pool_size = 4;
        config.auth.secret_key = "integration-secret".into();

        let endpoints = GoogleEndpoints::with_base("http://127.0.0.1:9");
        let ctx = AppContext::with_endpoints(config, endpoints).expect("context should build");
        let ctx = Arc::new(ctx);
        Self { router: router(Arc::clone(&ctx)), ctx, _temp_dir: temp_dir }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::DELETE, uri, token, None)).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(request(Method::POST, uri, token, Some(body))).await
    }

    pub async fn post_form(&self, uri: &str, form: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .expect("request should build");
        self.send(request).await
    }

    /// Register an account and return its profile plus a bearer token.
    pub async fn signed_in(&self, email: &str) -> (Value, String) {
        let registered = self
            .post_json(
                "/api/v1/auth/register",
                None,
                serde_json::json!({
                    "email": email,
                    "password": PASSWORD,
                    "full_name": "Test Host",
                }),
            )
            .await;
        assert_eq!(registered.status, StatusCode::CREATED, "register failed: {}", registered.body);

        let credentials = serde_json::json!({ "email": email, "password": PASSWORD });
        let login = self.post_json("/api/v1/auth/login", None, credentials).await;
        assert_eq!(login.status, StatusCode::OK, "login failed: {}", login.body);
        let token = login.body["access_token"]
            .as_str()
            .expect("token in login response")
            .to_string();
        (registered.body, token)
    }
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request should build")
}

//! Gateway tests: login, the session gate, and logout against an in-process
//! cache facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use tokengate_api::identity::{IdentityProvider, LoginGrant};
use tokengate_api::{AppState, AuthGate, GateRejection, build_app};
use tokengate_core::config::AppConfig;
use tokengate_core::config::session::SessionConfig;
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_core::traits::store::{RecordFields, SessionStore};
use tokengate_facade::dto::{
    DeleteRequest, DeleteResponse, InsertRequest, InsertResponse, LookupRequest, LookupResponse,
};
use tokengate_facade::{CacheFacade, RemoteCacheFacade, SessionFacade};
use tokengate_session::SessionCache;
use tokengate_store::memory::MemorySessionStore;

/// Accepts `alice`/`secret` and always issues token `abc` for user 42.
#[derive(Debug)]
struct StubIdentity;

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn login(&self, username: &str, password: &str) -> AppResult<LoginGrant> {
        if username == "alice" && password == "secret" {
            Ok(LoginGrant {
                user_id: 42,
                access_token: "abc".to_string(),
            })
        } else {
            Err(AppError::authentication("Invalid username or password"))
        }
    }
}

/// Facade that counts lookups and must never be called.
#[derive(Debug, Default)]
struct CountingFacade {
    lookups: AtomicUsize,
}

#[async_trait]
impl SessionFacade for CountingFacade {
    async fn insert(&self, _request: InsertRequest) -> AppResult<InsertResponse> {
        Ok(InsertResponse::ok())
    }
    async fn lookup(&self, _request: LookupRequest) -> AppResult<LookupResponse> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(LookupResponse::found(1, "nobody"))
    }
    async fn delete(&self, _request: DeleteRequest) -> AppResult<DeleteResponse> {
        Ok(DeleteResponse::ok())
    }
    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// Resolves every token but refuses writes without saying why.
#[derive(Debug)]
struct RefusingFacade;

#[async_trait]
impl SessionFacade for RefusingFacade {
    async fn insert(&self, _request: InsertRequest) -> AppResult<InsertResponse> {
        Ok(InsertResponse {
            success: false,
            error: None,
        })
    }
    async fn lookup(&self, _request: LookupRequest) -> AppResult<LookupResponse> {
        Ok(LookupResponse::found(42, "alice"))
    }
    async fn delete(&self, _request: DeleteRequest) -> AppResult<DeleteResponse> {
        Ok(DeleteResponse {
            success: false,
            error: None,
        })
    }
    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

fn embedded_app() -> (Router, MemorySessionStore) {
    let store = MemorySessionStore::new();
    let cache = SessionCache::new(Arc::new(store.clone()), &SessionConfig::default());
    let sessions: Arc<dyn SessionFacade> = Arc::new(CacheFacade::new(Arc::new(cache)));
    let state = AppState::new(AppConfig::default(), sessions, Arc::new(StubIdentity));
    (build_app(state), store)
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    let body = serde_json::json!({ "username": username, "password": password });
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn me_request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/auth/me");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_login_then_gated_request() {
    let (app, _) = embedded_app();

    let response = app.clone().oneshot(login_request("alice", "secret")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["access_token"], "abc");

    let response = app.clone().oneshot(me_request(Some("Bearer abc"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["user_id"], 42);
    assert_eq!(body["data"]["username"], "alice");

    let response = app.oneshot(me_request(Some("abc"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_token_rejected() {
    let (app, _) = embedded_app();
    app.clone().oneshot(login_request("alice", "secret")).await.unwrap();

    let response = app.oneshot(me_request(Some("xyz"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_credential_rejected() {
    let (app, _) = embedded_app();
    let response = app.clone().oneshot(me_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.oneshot(me_request(Some("Bearer "))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_store_outage_is_service_unavailable() {
    let (app, store) = embedded_app();
    app.clone().oneshot(login_request("alice", "secret")).await.unwrap();
    store.close().await.unwrap();

    let response = app.oneshot(me_request(Some("abc"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unreachable_cache_service_is_service_unavailable() {
    let remote = RemoteCacheFacade::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
    let state = AppState::new(AppConfig::default(), Arc::new(remote), Arc::new(StubIdentity));
    let app = build_app(state);

    let response = app.oneshot(me_request(Some("abc"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_repeated_token_login_conflicts() {
    let (app, _) = embedded_app();
    let first = app.clone().oneshot(login_request("alice", "secret")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(login_request("alice", "secret")).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_bad_credentials_and_blank_body() {
    let (app, store) = embedded_app();
    let response = app.clone().oneshot(login_request("alice", "wrong")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.oneshot(login_request("", "secret")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (app, _) = embedded_app();
    app.clone().oneshot(login_request("alice", "secret")).await.unwrap();

    let logout = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header(header::AUTHORIZATION, "Bearer abc")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(logout).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(me_request(Some("Bearer abc"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = embedded_app();
    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "ok");
}

#[tokio::test]
async fn test_missing_credential_skips_lookup() {
    let facade = Arc::new(CountingFacade::default());
    let gate = AuthGate::new(facade.clone());

    let rejection = gate
        .authenticate(&axum::http::HeaderMap::new())
        .await
        .unwrap_err();
    assert_eq!(rejection, GateRejection::MissingCredential);
    assert_eq!(facade.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_refusal_without_error_is_not_ok() {
    let state = AppState::new(AppConfig::default(), Arc::new(RefusingFacade), Arc::new(StubIdentity));
    let app = build_app(state);

    let response = app.clone().oneshot(login_request("alice", "secret")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let logout = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header(header::AUTHORIZATION, "Bearer abc")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(logout).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_corrupt_session_record_rejected() {
    let (app, store) = embedded_app();
    let mut fields = RecordFields::new();
    fields.insert("user_id".to_string(), "not-a-number".to_string());
    fields.insert("username".to_string(), "ghost".to_string());
    store.write("session:corrupt", &fields).await.unwrap();

    let response = app.oneshot(me_request(Some("Bearer corrupt"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_lowercase_scheme_accepted() {
    let (app, _) = embedded_app();
    app.clone().oneshot(login_request("alice", "secret")).await.unwrap();

    let response = app.clone().oneshot(me_request(Some("bearer abc"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(me_request(Some("Bearer"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

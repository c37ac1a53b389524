//! End-to-end tests over a real HTTP server.

mod helpers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use authwire_auth::token::{MemoryTokenStorage, TokenLifetimes};
use authwire_core::error::ErrorKind;
use authwire_core::types::{RequestSpec, TokenPair, UserRole};
use authwire_http::{ReqwestTransport, SessionManager};

use helpers::{PASSWORD, RecordingNavigator, test_config, test_user};

#[derive(Default)]
struct ServerState {
    refreshes: AtomicUsize,
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    if body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid credentials" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "accessToken": "a1",
            "refreshToken": "r1",
            "user": test_user(UserRole::Customer),
        })),
    )
}

async fn refresh(State(state): State<Arc<ServerState>>, Json(body): Json<Value>) -> impl IntoResponse {
    state.refreshes.fetch_add(1, Ordering::SeqCst);
    if body["refreshToken"] != "r1" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid refresh token" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": { "accessToken": "a2" } })),
    )
}

async fn posts(headers: HeaderMap) -> impl IntoResponse {
    match bearer(&headers) {
        Some("a2") => (StatusCode::OK, Json(json!({ "items": [1, 2, 3] }))),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Token expired" })),
        ),
    }
}

async fn slow() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(2)).await;
    StatusCode::OK
}

async fn spawn_server() -> (SocketAddr, Arc<ServerState>) {
    let state = Arc::new(ServerState::default());
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/posts", get(posts))
        .route("/slow", get(slow))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn manager_for(addr: SocketAddr, transport: ReqwestTransport) -> SessionManager {
    let mut config = test_config();
    config.client.base_url = format!("http://{addr}");
    SessionManager::new(
        config,
        Arc::new(transport),
        Arc::new(MemoryTokenStorage::new(TokenLifetimes::default())),
        Arc::new(RecordingNavigator::default()),
    )
}

#[tokio::test]
async fn test_login_then_refresh_over_http() {
    let (addr, server) = spawn_server().await;
    let mut config = test_config();
    config.client.base_url = format!("http://{addr}");
    let manager = manager_for(addr, ReqwestTransport::new(&config.client).unwrap());

    let user = manager.login("linh@example.com", PASSWORD).await.unwrap();
    assert_eq!(user.role, UserRole::Customer);

    // The server only accepts a2, so the first attempt refreshes.
    let items: Value = manager.client().get_json("/posts").await.unwrap();
    assert_eq!(items, json!({ "items": [1, 2, 3] }));
    assert_eq!(server.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(manager.store().get(), Some(TokenPair::new("a2", "r1")));

    manager.request(RequestSpec::get("/posts")).await.unwrap();
    assert_eq!(server.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_wrong_password_over_http() {
    let (addr, _server) = spawn_server().await;
    let mut config = test_config();
    config.client.base_url = format!("http://{addr}");
    let manager = manager_for(addr, ReqwestTransport::new(&config.client).unwrap());

    let err = manager.login("linh@example.com", "nope").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert!(!manager.state().is_authenticated());
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let (addr, _server) = spawn_server().await;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let manager = manager_for(addr, ReqwestTransport::with_client(client));

    let err = manager
        .client()
        .send_anonymous(&RequestSpec::get("/slow"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Network);
}

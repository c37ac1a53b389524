//! Integration tests for login, logout, restore, and the guard.

mod helpers;

use std::sync::Arc;

use authwire_auth::guard::{GuardDecision, RedirectReason};
use authwire_auth::token::{FileTokenStorage, MemoryTokenStorage, TokenLifetimes};
use authwire_core::error::ErrorKind;
use authwire_core::events::{SessionEvent, TeardownReason};
use authwire_core::types::{Method, RequestSpec, Session, TokenPair, UserRole};
use authwire_http::manager::UserPatch;

use helpers::{MockApi, PASSWORD, RefreshReply, TestContext, test_user};

#[tokio::test]
async fn test_login_installs_session() {
    let api = MockApi::new(&["a1"]);
    api.set_user(test_user(UserRole::Provider));
    let ctx = TestContext::new(api.clone());

    let user = ctx.manager.login("linh@example.com", PASSWORD).await.unwrap();
    assert_eq!(user.role, UserRole::Provider);

    assert_eq!(ctx.manager.store().get(), Some(TokenPair::new("a1", "r1")));
    let snapshot = ctx.manager.state().snapshot();
    assert!(snapshot.authenticated);
    assert_eq!(snapshot.role(), Some(UserRole::Provider));

    let login = api.hits_to("/auth/login");
    assert_eq!(login.len(), 1);
    assert_eq!(login[0].method, Method::Post);
    assert_eq!(login[0].token, None);

    let response = ctx.manager.request(RequestSpec::get("/posts/mine")).await.unwrap();
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["token"], "a1");
}

#[tokio::test]
async fn test_login_accepts_flat_payload() {
    let api = MockApi::new(&["a1"]);
    api.use_flat_login();
    let ctx = TestContext::new(api);

    let user = ctx.manager.login("linh@example.com", PASSWORD).await.unwrap();
    assert_eq!(user.id, "u-100");
    assert!(ctx.manager.state().is_authenticated());
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let api = MockApi::new(&["a1"]);
    let ctx = TestContext::new(api);

    let err = ctx
        .manager
        .login("linh@example.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert!(err.message.contains("Invalid credentials"));
    assert!(ctx.manager.store().get().is_none());
    assert_eq!(ctx.manager.coordinator().stats().refreshes_started, 0);
}

#[tokio::test]
async fn test_login_requires_credentials() {
    let ctx = TestContext::new(MockApi::new(&[]));

    let err = ctx.manager.login("  ", PASSWORD).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(ctx.manager.store().get().is_none());
}

#[tokio::test]
async fn test_logout_clears_session_and_notifies_server() {
    let api = MockApi::new(&["a1"]);
    let ctx = TestContext::signed_in(api.clone(), "a1", "r1").await;
    let mut events = ctx.manager.state().events();

    assert!(ctx.manager.logout().await.unwrap());

    assert!(ctx.manager.store().get().is_none());
    assert!(!ctx.manager.state().is_authenticated());
    assert!(matches!(
        events.try_recv().unwrap(),
        SessionEvent::Cleared {
            reason: TeardownReason::Logout,
            ..
        }
    ));

    let logout = api.hits_to("/auth/logout");
    assert_eq!(logout.len(), 1);
    assert_eq!(logout[0].token.as_deref(), Some("a1"));

    // Nothing left to end.
    assert!(!ctx.manager.logout().await.unwrap());
    assert_eq!(api.hits_to("/auth/logout").len(), 1);
}

#[tokio::test]
async fn test_request_after_logout_is_auth_expired() {
    let api = MockApi::new(&["a1"]);
    let ctx = TestContext::signed_in(api.clone(), "a1", "r1").await;
    ctx.manager.logout().await.unwrap();

    let err = ctx
        .manager
        .request(RequestSpec::get("/client/bookings"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AuthExpired);
    assert_eq!(api.refresh_calls(), 0);
}

#[tokio::test]
async fn test_restore_with_nothing_persisted() {
    let ctx = TestContext::new(MockApi::new(&[]));

    assert_eq!(ctx.manager.restore().await.unwrap(), None);
    assert!(!ctx.manager.state().is_authenticated());
}

#[tokio::test]
async fn test_restore_refreshes_expired_access_token() {
    // Only a refreshed token is accepted, so /auth/me must go through the refresh.
    let api = MockApi::new(&[]);
    let mut stale_user = test_user(UserRole::Customer);
    stale_user.full_name = None;
    let storage = Arc::new(MemoryTokenStorage::with_session(
        TokenLifetimes::default(),
        &Session::new(TokenPair::new("a1", "r1"), Some(stale_user)),
    ));
    let ctx = TestContext::with_storage(api.clone(), storage.clone());

    let user = ctx.manager.restore().await.unwrap().unwrap();
    assert_eq!(user.full_name.as_deref(), Some("Linh Tran"));

    assert_eq!(api.refresh_calls(), 1);
    assert_eq!(ctx.manager.store().get(), Some(TokenPair::new("a2", "r1")));
    let record = storage.record().unwrap();
    assert_eq!(record.access_token, "a2");
    assert_eq!(
        record.user.and_then(|u| u.full_name).as_deref(),
        Some("Linh Tran")
    );
}

#[tokio::test]
async fn test_restore_with_dead_refresh_token() {
    let api = MockApi::new(&[]);
    api.set_refresh_reply(RefreshReply::Status(401));
    let storage = Arc::new(MemoryTokenStorage::with_session(
        TokenLifetimes::default(),
        &Session::new(TokenPair::new("a1", "r1"), None),
    ));
    let ctx = TestContext::with_storage(api.clone(), storage.clone());

    assert_eq!(ctx.manager.restore().await.unwrap(), None);
    assert!(ctx.manager.store().get().is_none());
    assert!(storage.record().is_none());
    assert_eq!(ctx.navigator.routes(), vec!["/auth/login".to_string()]);
}

#[tokio::test]
async fn test_file_backend_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let api = MockApi::new(&["a1"]);

    let first = TestContext::with_storage(
        api.clone(),
        Arc::new(FileTokenStorage::new(&path, TokenLifetimes::default(), false)),
    );
    first.manager.login("linh@example.com", PASSWORD).await.unwrap();
    assert!(path.exists());

    let second = TestContext::with_storage(
        api.clone(),
        Arc::new(FileTokenStorage::new(&path, TokenLifetimes::default(), false)),
    );
    let user = second.manager.restore().await.unwrap().unwrap();
    assert_eq!(user.email, "linh@example.com");
    assert_eq!(second.manager.store().get(), Some(TokenPair::new("a1", "r1")));
    assert_eq!(api.refresh_calls(), 0);

    second.manager.logout().await.unwrap();
    assert!(!path.exists());
}

#[tokio::test]
async fn test_guard_follows_session() {
    let api = MockApi::new(&["a1"]);
    let ctx = TestContext::new(api);
    let guard = ctx.manager.guard().clone();

    assert_eq!(
        guard.admit("/client/bookings"),
        GuardDecision::Redirect {
            to: "/auth/login".to_string(),
            reason: RedirectReason::Unauthenticated,
        }
    );
    assert!(guard.admit("/posts/123").is_admitted());

    ctx.manager.login("linh@example.com", PASSWORD).await.unwrap();
    assert!(guard.admit("/client/bookings").is_admitted());
    assert_eq!(
        guard.admit("/admin/users"),
        GuardDecision::Redirect {
            to: "/auth/login".to_string(),
            reason: RedirectReason::Forbidden,
        }
    );

    ctx.manager.logout().await.unwrap();
    assert!(!guard.admit("/client/bookings").is_admitted());
}

#[tokio::test]
async fn test_update_user_merges_patch() {
    let api = MockApi::new(&["a1"]);
    let ctx = TestContext::signed_in(api, "a1", "r1").await;

    let user = ctx
        .manager
        .update_user(UserPatch {
            full_name: Some("Tran Thi Linh".to_string()),
            ..UserPatch::default()
        })
        .await
        .unwrap();
    assert_eq!(user.full_name.as_deref(), Some("Tran Thi Linh"));
    assert_eq!(user.email, "linh@example.com");

    let snapshot = ctx.manager.state().snapshot();
    assert_eq!(
        snapshot.user.and_then(|u| u.full_name).as_deref(),
        Some("Tran Thi Linh")
    );
    // Tokens are untouched.
    assert_eq!(ctx.manager.store().get(), Some(TokenPair::new("a1", "r1")));
}

#[tokio::test]
async fn test_update_user_without_session() {
    let ctx = TestContext::new(MockApi::new(&[]));

    let err = ctx.manager.update_user(UserPatch::default()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AuthExpired);
}

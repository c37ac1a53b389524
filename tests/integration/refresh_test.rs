//! Integration tests for the refresh lifecycle.

mod helpers;

use authwire_auth::refresh::RefreshState;
use authwire_core::error::ErrorKind;
use authwire_core::events::{SessionEvent, TeardownReason};
use authwire_core::result::AppResult;
use authwire_core::types::{ApiResponse, RequestSpec, TokenPair};
use tokio::task::JoinHandle;

use helpers::{MockApi, RefreshReply, TestContext, spawn_queued, wait_until};

/// Fires `paths` with the expired token and queues each behind the held refresh.
async fn queue_requests(ctx: &TestContext, paths: &[&str]) -> Vec<JoinHandle<AppResult<ApiResponse>>> {
    let mut handles = Vec::new();
    for (n, path) in paths.iter().enumerate() {
        let manager = ctx.manager.clone();
        let spec = RequestSpec::get(*path);
        handles.push(spawn_queued(ctx, n + 1, async move { manager.request(spec).await }).await);
    }
    handles
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let api = MockApi::new(&[]);
    api.hold_refresh();
    let ctx = TestContext::signed_in(api.clone(), "a1", "r1").await;

    let handles = queue_requests(&ctx, &["/posts/a", "/posts/b", "/posts/c"]).await;
    assert_eq!(ctx.manager.coordinator().state(), RefreshState::Refreshing);
    let probe = api.clone();
    wait_until(move || probe.refresh_calls() == 1).await;

    api.release_refresh();
    for (handle, path) in handles.into_iter().zip(["/posts/a", "/posts/b", "/posts/c"]) {
        let response = handle.await.unwrap().unwrap();
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["path"], path);
        assert_eq!(body["token"], "a2");
    }

    assert_eq!(api.refresh_calls(), 1);
    assert_eq!(
        api.refresh_bodies(),
        vec![serde_json::json!({ "refreshToken": "r1" })]
    );

    // Three rejected first attempts, then three replays in enqueue order.
    let hits: Vec<(String, Option<String>)> = api
        .hits()
        .into_iter()
        .map(|h| (h.path, h.token))
        .collect();
    let a1 = Some("a1".to_string());
    let a2 = Some("a2".to_string());
    assert_eq!(
        hits,
        vec![
            ("/posts/a".to_string(), a1.clone()),
            ("/posts/b".to_string(), a1.clone()),
            ("/posts/c".to_string(), a1),
            ("/posts/a".to_string(), a2.clone()),
            ("/posts/b".to_string(), a2.clone()),
            ("/posts/c".to_string(), a2),
        ]
    );

    assert_eq!(ctx.manager.store().get(), Some(TokenPair::new("a2", "r1")));
    assert_eq!(ctx.manager.coordinator().state(), RefreshState::Idle);
    assert!(ctx.navigator.routes().is_empty());
}

#[tokio::test]
async fn test_refresh_failure_rejects_queue_and_tears_down_once() {
    let api = MockApi::new(&[]);
    api.hold_refresh();
    api.set_refresh_reply(RefreshReply::Status(401));
    let ctx = TestContext::signed_in(api.clone(), "a1", "r1").await;
    let mut events = ctx.manager.state().events();

    let handles = queue_requests(&ctx, &["/posts/a", "/posts/b", "/posts/c"]).await;
    api.release_refresh();

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err.kind, ErrorKind::RefreshFailed);
    }

    assert!(ctx.manager.store().get().is_none());
    assert!(!ctx.manager.state().is_authenticated());
    assert_eq!(ctx.navigator.routes(), vec!["/auth/login".to_string()]);
    assert_eq!(ctx.manager.coordinator().stats().refreshes_failed, 1);

    let mut cleared = 0;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Cleared { reason, .. } = event {
            assert_eq!(reason, TeardownReason::RefreshFailed);
            cleared += 1;
        }
    }
    assert_eq!(cleared, 1);

    // No further refresh until a new login.
    let err = ctx
        .manager
        .request(RequestSpec::get("/posts/d"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AuthExpired);
    assert_eq!(api.refresh_calls(), 1);
}

#[tokio::test]
async fn test_request_after_refresh_uses_new_token_directly() {
    let api = MockApi::new(&[]);
    let ctx = TestContext::signed_in(api.clone(), "a1", "r1").await;

    ctx.manager.request(RequestSpec::get("/posts/a")).await.unwrap();
    assert_eq!(api.refresh_calls(), 1);

    let response = ctx.manager.request(RequestSpec::get("/posts/d")).await.unwrap();
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["token"], "a2");

    let hits = api.hits_to("/posts/d");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].token.as_deref(), Some("a2"));
    assert_eq!(hits[0].status, 200);
    assert_eq!(api.refresh_calls(), 1);
    assert_eq!(ctx.manager.coordinator().pending(), 0);
}

#[tokio::test]
async fn test_second_unauthorized_is_retry_exhausted() {
    let api = MockApi::new(&[]);
    api.reject_all();
    let ctx = TestContext::signed_in(api.clone(), "a1", "r1").await;

    let err = ctx
        .manager
        .request(RequestSpec::get("/admin/reports"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RetryExhausted);
    assert_eq!(api.refresh_calls(), 1);
    assert_eq!(api.hits_to("/admin/reports").len(), 2);

    // The session survives a per-request failure.
    assert_eq!(ctx.manager.store().get(), Some(TokenPair::new("a2", "r1")));
    assert!(ctx.navigator.routes().is_empty());
}

#[tokio::test]
async fn test_logout_during_refresh_discards_result() {
    let api = MockApi::new(&[]);
    api.hold_refresh();
    let ctx = TestContext::signed_in(api.clone(), "a1", "r1").await;

    let handles = queue_requests(&ctx, &["/posts/a", "/posts/b"]).await;
    assert!(ctx.manager.logout().await.unwrap());

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthExpired);
    }

    api.release_refresh();
    let coordinator = ctx.manager.coordinator().clone();
    wait_until(move || coordinator.stats().refreshes_discarded == 1).await;

    assert!(ctx.manager.store().get().is_none());
    assert!(ctx.navigator.routes().is_empty());
    // Only the first attempts reached the API; nothing was replayed.
    assert!(api.hits().iter().all(|h| h.token.as_deref() != Some("a2")));
}

#[tokio::test]
async fn test_logout_while_replaying_stops_the_rest() {
    let api = MockApi::new(&[]);
    api.hold_refresh();
    api.hold_authorized("/posts/a");
    let ctx = TestContext::signed_in(api.clone(), "a1", "r1").await;

    let handles = queue_requests(&ctx, &["/posts/a", "/posts/b", "/posts/c"]).await;
    api.release_refresh();

    // The first replay is on the wire when the user logs out.
    let held = api.clone();
    wait_until(move || held.held_calls() == 1).await;
    assert!(ctx.manager.logout().await.unwrap());
    api.release_held();

    let mut results = handles.into_iter();
    let first = results.next().unwrap().await.unwrap().unwrap();
    assert_eq!(first.status, 200);
    for handle in results {
        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthExpired);
    }

    let replayed: Vec<String> = api
        .hits()
        .into_iter()
        .filter(|h| h.token.as_deref() == Some("a2") && h.path != "/auth/logout")
        .map(|h| h.path)
        .collect();
    assert_eq!(replayed, vec!["/posts/a".to_string()]);
    assert!(ctx.manager.store().get().is_none());
    assert_eq!(ctx.manager.coordinator().stats().requests_rejected, 2);
}

#[tokio::test]
async fn test_rotated_refresh_token_is_persisted() {
    let api = MockApi::new(&[]);
    api.set_refresh_reply(RefreshReply::Grant {
        access: "a2".to_string(),
        refresh: Some("r2".to_string()),
    });
    let ctx = TestContext::signed_in(api.clone(), "a1", "r1").await;
    let mut events = ctx.manager.state().events();

    ctx.manager.request(RequestSpec::get("/posts/a")).await.unwrap();

    assert_eq!(ctx.manager.store().get(), Some(TokenPair::new("a2", "r2")));
    assert!(matches!(
        events.try_recv().unwrap(),
        SessionEvent::Refreshed { rotated: true, .. }
    ));
}

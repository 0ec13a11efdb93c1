mod common;

use axum::http::StatusCode;
use axum_test::TestServer;

#[tokio::test]
async fn health_reports_ok() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server.get("/health").await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<serde_json::Value>()["status"], "ok");
}

#[tokio::test]
async fn login_returns_session_id() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/api/login")
        .json(&serde_json::json!({ "username": "  alice  " }))
        .await;

    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    let session_id = body["sessionId"].as_str().unwrap();
    assert!(session_id.starts_with("ses_"));
    assert_eq!(body["username"], "alice");
    assert_eq!(state.sessions.lookup(session_id).as_deref(), Some("alice"));
}

#[tokio::test]
async fn login_rejects_blank_username() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    for body in [
        serde_json::json!({ "username": "" }),
        serde_json::json!({ "username": "   " }),
        serde_json::json!({}),
    ] {
        let resp = server.post("/api/login").json(&body).await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let err: serde_json::Value = resp.json();
        assert_eq!(err["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(err["error"]["details"][0]["field"], "username");
    }

    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn same_name_logs_in_twice_with_distinct_sessions() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let a: serde_json::Value = server
        .post("/api/login")
        .json(&serde_json::json!({ "username": "alice" }))
        .await
        .json();
    let b: serde_json::Value = server
        .post("/api/login")
        .json(&serde_json::json!({ "username": "alice" }))
        .await
        .json();

    assert_ne!(a["sessionId"], b["sessionId"]);
    assert_eq!(state.sessions.len(), 2);
}

#[tokio::test]
async fn logout_is_idempotent() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let login: serde_json::Value = server
        .post("/api/login")
        .json(&serde_json::json!({ "username": "alice" }))
        .await
        .json();
    let session_id = login["sessionId"].as_str().unwrap().to_string();

    for _ in 0..2 {
        server
            .post("/api/logout")
            .json(&serde_json::json!({ "sessionId": session_id }))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
    assert!(state.sessions.lookup(&session_id).is_none());

    // A discarded session no longer supplies an author name.
    let resp = server
        .post("/api/comments")
        .json(&serde_json::json!({ "comment": "hi", "sessionId": session_id }))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

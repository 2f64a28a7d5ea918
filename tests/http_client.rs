//! REST client against a local mock server.

mod common;

use axum::http::Method;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use common::{json_reply, login_reply, mock_http, text_reply, user_json};
use mattermost_sdk::error::ApiError;
use mattermost_sdk::prelude::*;

fn bearer_client(base: &str) -> Client {
    Client::new(ClientOptions::builder(base).token("T").build().unwrap())
}

// ─── Authentication ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_sent_on_get_me() {
    let (base, rec) = mock_http(|_| json_reply(200, user_json("u1", "alice"))).await;
    let client = bearer_client(&base);

    let me = client.users().get_me().await.unwrap().into_result().unwrap();
    assert_eq!(me.username, "alice");

    let seen = rec.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, Method::GET);
    assert_eq!(seen[0].path, "/api/v4/users/me");
    assert_eq!(seen[0].header("authorization"), Some("Bearer T"));
}

#[tokio::test]
async fn test_login_happens_once_before_first_call() {
    let (base, rec) = mock_http(|seen| {
        if seen.path == "/api/v4/users/login" {
            login_reply("ABC", user_json("u1", "bot"))
        } else {
            json_reply(200, user_json("u1", "bot"))
        }
    })
    .await;
    let client = Client::new(
        ClientOptions::builder(&base)
            .login("bot", "pw")
            .build()
            .unwrap(),
    );

    client.users().get_me().await.unwrap();
    client.users().get_me().await.unwrap();

    let seen = rec.requests();
    let paths: Vec<_> = seen.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(
        paths,
        ["/api/v4/users/login", "/api/v4/users/me", "/api/v4/users/me"]
    );

    let login = &seen[0];
    assert_eq!(login.method, Method::POST);
    assert!(login.header("authorization").is_none());
    let body = login.json();
    assert_eq!(body["login_id"], "bot");
    assert_eq!(body["password"], "pw");

    assert_eq!(seen[1].header("authorization"), Some("Bearer ABC"));
    assert_eq!(seen[2].header("authorization"), Some("Bearer ABC"));

    let current = client.auth().current_user().await.unwrap();
    assert_eq!(current.id, "u1");
}

#[tokio::test]
async fn test_login_without_token_header_fails() {
    let (base, _rec) = mock_http(|_| json_reply(200, user_json("u1", "bot"))).await;
    let client = Client::new(
        ClientOptions::builder(&base)
            .login("bot", "pw")
            .build()
            .unwrap(),
    );

    let err = client.users().get_me().await.unwrap_err();
    assert!(matches!(err, ApiError::Authentication(_)));
    assert!(!client.auth().is_authenticated().await);
}

#[tokio::test]
async fn test_rejected_login_maps_status() {
    let (base, _rec) = mock_http(|_| {
        json_reply(
            401,
            json!({"id": "api.user.login.invalid_credentials", "message": "Enter a valid email or username and/or password.", "status_code": 401}),
        )
    })
    .await;
    let client = Client::new(
        ClientOptions::builder(&base)
            .login("bot", "wrong")
            .build()
            .unwrap(),
    );

    let err = assert_err!(client.auth().authenticate().await);
    assert_eq!(err.kind(), ErrorKind::NoAccessTokenProvided);
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_logout_clears_token() {
    let (base, rec) = mock_http(|seen| match seen.path.as_str() {
        "/api/v4/users/login" => login_reply("ABC", user_json("u1", "bot")),
        _ => json_reply(200, json!({"status": "OK"})),
    })
    .await;
    let client = Client::new(
        ClientOptions::builder(&base)
            .login("bot", "pw")
            .build()
            .unwrap(),
    );

    assert_ok!(client.auth().authenticate().await);
    assert_eq!(client.auth().active_token().await.as_deref(), Some("ABC"));

    assert_ok!(client.auth().logout().await);
    assert!(client.auth().active_token().await.is_none());
    assert!(client.auth().current_user().await.is_none());

    let seen = rec.requests();
    let logout = seen.last().unwrap();
    assert_eq!(logout.path, "/api/v4/users/logout");
    assert_eq!(logout.header("authorization"), Some("Bearer ABC"));
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_json_error_body() {
    let (base, _rec) = mock_http(|_| {
        json_reply(
            401,
            json!({"id": "api.context.session_expired.app_error", "message": "Invalid or expired session, please login again.", "status_code": 401}),
        )
    })
    .await;
    let client = bearer_client(&base);

    let err = client.users().get_me().await.unwrap_err();
    assert!(matches!(err, ApiError::NoAccessTokenProvided(_)));
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.message(), "Invalid or expired session, please login again.");
    let server = err.details().unwrap().server_error().unwrap();
    assert_eq!(server.id, "api.context.session_expired.app_error");
}

#[tokio::test]
async fn test_text_error_body() {
    let (base, _rec) = mock_http(|_| text_reply(429, "slow down")).await;
    let client = bearer_client(&base);

    let err = client.users().get_me().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TooManyRequests);
    assert_eq!(err.message(), "slow down");
    assert!(err.detail().is_none());
}

#[tokio::test]
async fn test_status_table() {
    let cases = [
        (400, ErrorKind::InvalidOrMissingParameters),
        (403, ErrorKind::NotEnoughPermissions),
        (404, ErrorKind::ResourceNotFound),
        (405, ErrorKind::MethodNotAllowed),
        (413, ErrorKind::ContentTooLarge),
        (500, ErrorKind::InternalServerError),
        (501, ErrorKind::FeatureDisabled),
        (402, ErrorKind::GenericApiError),
        (418, ErrorKind::GenericApiError),
        (502, ErrorKind::GenericApiError),
    ];
    for (status, kind) in cases {
        let (base, _rec) = mock_http(move |_| json_reply(status, json!({"message": "nope"}))).await;
        let err = bearer_client(&base)
            .channels()
            .get("c1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), kind, "status {}", status);
        assert_eq!(err.status(), Some(status));
    }
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unset_body_fields_are_omitted() {
    let (base, rec) = mock_http(|_| {
        json_reply(201, json!({"id": "p1", "channel_id": "c1", "message": "hi"}))
    })
    .await;
    let client = bearer_client(&base);

    let post = client
        .posts()
        .create(&CreatePost::new("c1", "hi"))
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(post.id, "p1");

    let body = rec.requests()[0].json();
    assert_eq!(body, json!({"channel_id": "c1", "message": "hi"}));
}

#[tokio::test]
async fn test_unset_query_params_are_omitted() {
    let (base, rec) = mock_http(|_| json_reply(200, json!({"order": [], "posts": {}}))).await;
    let client = bearer_client(&base);

    let params = ChannelPostsParams {
        per_page: Some(10),
        ..Default::default()
    };
    client.posts().for_channel("c1", &params).await.unwrap();
    client.system().ping(None).await.unwrap();
    client.system().ping(Some(true)).await.unwrap();

    let seen = rec.requests();
    assert_eq!(seen[0].path, "/api/v4/channels/c1/posts");
    assert_eq!(seen[0].query.as_deref(), Some("per_page=10"));
    assert_eq!(seen[1].query, None);
    assert_eq!(seen[2].query.as_deref(), Some("get_server_status=true"));
}

#[tokio::test]
async fn test_path_segments_are_encoded() {
    let (base, rec) = mock_http(|_| json_reply(200, user_json("u1", "a b"))).await;
    bearer_client(&base)
        .users()
        .get_by_username("a b")
        .await
        .unwrap();
    assert_eq!(rec.requests()[0].path, "/api/v4/users/username/a%20b");
}

#[tokio::test]
async fn test_multipart_upload() {
    let (base, rec) = mock_http(|_| {
        json_reply(
            201,
            json!({"file_infos": [{"id": "f1", "name": "a.txt"}], "client_ids": []}),
        )
    })
    .await;
    let client = bearer_client(&base);

    let uploaded = client
        .files()
        .upload("c1", "a.txt", "text/plain", b"hello".to_vec())
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(uploaded.file_ids(), ["f1"]);

    let seen = &rec.requests()[0];
    assert_eq!(seen.path, "/api/v4/files");
    assert!(seen
        .header("content-type")
        .unwrap()
        .starts_with("multipart/form-data"));
    let body = seen.body_text();
    assert!(body.contains(r#"name="channel_id""#));
    assert!(body.contains(r#"name="files"; filename="a.txt""#));
    assert!(body.contains("hello"));
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unexpected_success_status_is_raw() {
    let (base, _rec) = mock_http(|_| json_reply(202, json!({"queued": true}))).await;
    let response = bearer_client(&base).users().get_me().await.unwrap();

    assert!(!response.is_parsed());
    let raw = response.raw().unwrap();
    assert_eq!(raw.status(), 202);
    assert_eq!(raw.json::<serde_json::Value>().unwrap()["queued"], true);
}

#[tokio::test]
async fn test_skip_response_parsing() {
    let (base, _rec) = mock_http(|_| json_reply(200, user_json("u1", "alice"))).await;
    let client = Client::new(
        ClientOptions::builder(&base)
            .token("T")
            .skip_response_parsing(true)
            .build()
            .unwrap(),
    );

    let response = client.users().get_me().await.unwrap();
    let raw = response.raw().unwrap();
    assert_eq!(raw.status(), 200);
    assert!(raw.text().contains("alice"));
}

#[tokio::test]
async fn test_raw_verbs() {
    let (base, rec) = mock_http(|_| json_reply(200, json!({"status": "OK"}))).await;
    let client = bearer_client(&base);

    let raw = client
        .api()
        .put(
            "/users/u1/active",
            RequestParts::new().json(&json!({"active": false})).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(raw.status(), 200);

    let raw = client
        .api()
        .options("/users", RequestParts::new())
        .await
        .unwrap();
    assert_eq!(raw.status(), 200);

    let seen = rec.requests();
    assert_eq!(seen[0].method, Method::PUT);
    assert_eq!(seen[0].json(), json!({"active": false}));
    assert_eq!(seen[1].method, Method::OPTIONS);
    assert_eq!(seen[1].path, "/api/v4/users");
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_reuses_one_pool() {
    let (base, rec) = mock_http(|_| json_reply(200, user_json("u1", "alice"))).await;
    let client = bearer_client(&base);

    let session = client.session().unwrap();
    session.users().get_me().await.unwrap();
    session.users().get_me().await.unwrap();
    assert!(session.close());
    assert!(!session.close());

    client.users().get_me().await.unwrap();
    client.users().get_me().await.unwrap();

    let seen = rec.requests();
    assert_eq!(seen[0].peer, seen[1].peer);
    assert_ne!(seen[2].peer, seen[3].peer);
}

#[tokio::test]
async fn test_closed_session_refuses_requests() {
    let (base, rec) = mock_http(|_| json_reply(200, user_json("u1", "alice"))).await;
    let client = bearer_client(&base);

    let session = client.session().unwrap();
    session.close();
    let err = assert_err!(session.users().get_me().await);
    assert!(matches!(err, ApiError::TransportClosed));
    assert!(rec.requests().is_empty());
}

#[tokio::test]
async fn test_session_closes_when_scope_exits_with_error() {
    let (base, rec) = mock_http(|_| json_reply(404, json!({"message": "gone"}))).await;
    let client = bearer_client(&base);

    let mut pool = None;
    let outcome: ApiResult<()> = async {
        let session = client.session()?;
        pool = Some(session.transport().clone());
        session.users().get_me().await?;
        Ok(())
    }
    .await;

    let err = assert_err!(outcome);
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    let pool = pool.unwrap();
    assert!(pool.is_closed());
    assert!(!pool.close());
    assert_eq!(rec.requests().len(), 1);
}

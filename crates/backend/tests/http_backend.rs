//! Integration tests for the REST + WebSocket backend client.

use std::time::Duration;

use chatline_backend::{field, or, BackendClient, BackendError, ChangeKind, HttpBackendClient};
use chatline_config::BackendConfig;
use futures_util::{SinkExt, StreamExt};
use httpmock::prelude::*;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message as Frame;

fn config_for(server: &MockServer, api_key: Option<&str>) -> BackendConfig {
    BackendConfig {
        base_url: server.url("/api"),
        realtime_url: "ws://127.0.0.1:9/realtime".to_string(),
        api_key: api_key.map(str::to_string),
        request_timeout_seconds: 2,
    }
}

#[tokio::test]
async fn insert_posts_record_with_bearer_key() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/data/chats")
                .header("Authorization", "Bearer test-key")
                .json_body(json!({"id": "c1", "from": "u1", "to": "u2"}));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"id": "c1", "objectId": "srv-1"}));
        })
        .await;

    let client = HttpBackendClient::new(&config_for(&server, Some("test-key"))).unwrap();
    let response = client
        .insert("chats", json!({"id": "c1", "from": "u1", "to": "u2"}))
        .await
        .expect("insert should reach the server");

    mock.assert_async().await;
    assert!(response.is_success());
    assert_eq!(response.data.unwrap()["objectId"], "srv-1");
}

#[tokio::test]
async fn non_success_status_is_returned_not_raised() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/data/messages");
            then.status(403).body("forbidden");
        })
        .await;

    let client = HttpBackendClient::new(&config_for(&server, None)).unwrap();
    let response = client
        .insert("messages", json!({"id": "m1"}))
        .await
        .expect("status responses are not transport errors");

    assert_eq!(response.status, 403);
    assert!(!response.is_success());
    assert_eq!(response.data, Some(Value::String("forbidden".to_string())));
}

#[tokio::test]
async fn query_sends_where_clause_and_wraps_array_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/data/chats")
                .query_param("where", "from = 'u1' OR to = 'u1' OR to = 'ALL'");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!([{"id": "c1"}, {"id": "c2"}]));
        })
        .await;

    let client = HttpBackendClient::new(&config_for(&server, None)).unwrap();
    let predicate = or([
        field("from").eq("u1"),
        field("to").eq("u1"),
        field("to").eq("ALL"),
    ]);
    let response = client.query_where("chats", &predicate).await.unwrap();

    mock.assert_async().await;
    let rows = response.result_records().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["id"], "c2");
}

#[tokio::test]
async fn update_where_puts_patch_to_bulk_endpoint() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/api/data/bulk/messages")
                .query_param("where", "id = 'm1'")
                .json_body(json!({"id": "m1", "read": true}));
            then.status(200).json_body(json!(1));
        })
        .await;

    let client = HttpBackendClient::new(&config_for(&server, None)).unwrap();
    let response = client
        .update_where("messages", &field("id").eq("m1"), json!({"id": "m1", "read": true}))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(response.is_success());
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let config = BackendConfig {
        base_url: "http://127.0.0.1:9/api".to_string(),
        request_timeout_seconds: 1,
        ..BackendConfig::default()
    };
    let client = HttpBackendClient::new(&config).unwrap();

    let err = client
        .query_where("users", &field("id").ne("u1"))
        .await
        .expect_err("nothing listens on the discard port");

    assert!(matches!(err, BackendError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn subscribe_forwards_change_frames() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let (request_tx, request_rx) = oneshot::channel::<Value>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();

        if let Some(Ok(Frame::Text(text))) = socket.next().await {
            let _ = request_tx.send(serde_json::from_str(&text).unwrap());
        }

        socket
            .send(Frame::Text("{\"type\":\"subscribed\"}".to_string()))
            .await
            .unwrap();
        socket
            .send(Frame::Text(
                json!({
                    "kind": "created",
                    "collection": "messages",
                    "record": {"id": "m1", "chatId": "c1"}
                })
                .to_string(),
            ))
            .await
            .unwrap();

        while socket.next().await.is_some() {}
    });

    let config = BackendConfig {
        realtime_url: format!("ws://{}/realtime", address),
        ..BackendConfig::default()
    };
    let client = HttpBackendClient::new(&config).unwrap();
    let mut subscription = client
        .subscribe("messages", Some(field("chatId").eq("c1")))
        .await
        .expect("subscription should open");

    let request = request_rx.await.unwrap();
    assert_eq!(request["type"], "subscribe");
    assert_eq!(request["collection"], "messages");
    assert_eq!(request["predicate"]["condition"]["value"], "c1");

    let event = tokio::time::timeout(Duration::from_secs(2), subscription.next())
        .await
        .expect("event should arrive")
        .expect("stream should be open");
    assert_eq!(event.kind, ChangeKind::Created);
    assert_eq!(event.record["id"], "m1");
    assert_eq!(subscription.collection(), "messages");

    subscription.unsubscribe();
}

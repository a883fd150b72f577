//! Dispatch chain against a mock HTTP backend.

mod integration;

use agent_portal::dispatch::{DispatchEvent, StatusState, LABEL_DISPATCH_ERROR};
use agent_portal::{AttachmentSource, Configuration, InMemoryFile, MessageRole};
use async_trait::async_trait;
use chrono::SecondsFormat;
use integration::mock_server::{MockServerFixture, ENDPOINT};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_live_request_shape_and_messages_reply() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", ENDPOINT)
        .match_header("content-type", "application/json")
        .match_header("authorization", "Bearer secret")
        .match_header("x-trace", "abc")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"input": "hello", "temperature": 0.7})),
            Matcher::Regex(r#""name":"a.txt""#.to_string()),
            Matcher::Regex(r#""type":"text/plain""#.to_string()),
            Matcher::Regex(r#""base64":"aGk=""#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"messages":[{"role":"user","content":"hello"},{"role":"assistant","content":"X"}]}"#)
        .create_async()
        .await;

    let (portal, observer) = fixture.orchestrator(fixture.live_config());
    portal.stage_file(Arc::new(InMemoryFile::new("a.txt", b"hi".to_vec())));
    let handle = portal.send("hello").expect("dispatch");
    let placeholder_id = handle.placeholder_id().to_string();
    let reply = handle.settled().await;

    mock.assert_async().await;
    assert_eq!(reply.content, "X");
    assert_eq!(reply.role, MessageRole::Assistant);
    assert!(!reply.is_error);

    let settled: Vec<_> = observer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            DispatchEvent::Settled { placeholder_id, message } => Some((placeholder_id, message)),
            _ => None,
        })
        .collect();
    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].0, placeholder_id);
    assert_eq!(settled[0].1.content, "X");
    assert_eq!(
        observer.statuses().last(),
        Some(&(StatusState::Idle, "ready".to_string()))
    );
}

#[tokio::test]
async fn test_payload_timestamp_is_user_message_creation_time() {
    let mut fixture = MockServerFixture::new().await;
    // Echo the request body back so the reply carries the payload as sent.
    let mock = fixture
        .server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body_from_request(|request| request.body().cloned().unwrap_or_default())
        .create_async()
        .await;

    let (portal, _) = fixture.orchestrator(fixture.live_config());
    let reply = portal.send("stamp me").unwrap().settled().await;
    mock.assert_async().await;

    let sent: serde_json::Value = serde_json::from_str(&reply.content).expect("echoed payload");
    let user = portal
        .messages()
        .into_iter()
        .find(|m| m.role == MessageRole::User)
        .expect("user message");

    assert_eq!(sent["input"], "stamp me");
    assert_eq!(
        sent["timestamp"],
        user.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
}

#[tokio::test]
async fn test_server_error_becomes_error_message() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_text_response(500, "server error").await;

    let (portal, observer) = fixture.orchestrator(fixture.live_config());
    let reply = portal.send("hello").unwrap().settled().await;

    assert!(reply.is_error);
    assert!(reply.content.contains("server error"));
    let last = portal.messages().pop().unwrap();
    assert_eq!(last, reply);
    assert_eq!(portal.pending_count(), 0);
    assert_eq!(
        observer.statuses().last(),
        Some(&(StatusState::Idle, LABEL_DISPATCH_ERROR.to_string()))
    );
}

#[tokio::test]
async fn test_empty_error_body_reports_status() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_text_response(503, "").await;

    let (portal, _) = fixture.orchestrator(fixture.live_config());
    let reply = portal.send("hello").unwrap().settled().await;
    assert!(reply.is_error);
    assert!(reply.content.contains("HTTP 503"));
}

#[tokio::test]
async fn test_non_json_success_uses_parse_sentinel() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_text_response(200, "plain words").await;

    let (portal, _) = fixture.orchestrator(fixture.live_config());
    let reply = portal.send("hello").unwrap().settled().await;
    assert!(!reply.is_error);
    assert_eq!(reply.content, "(parse failed)");
}

#[tokio::test]
async fn test_generic_object_reply() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_json_response(200, r#"{"content":"direct"}"#).await;
    let (portal, _) = fixture.orchestrator(fixture.live_config());
    assert_eq!(portal.send("q").unwrap().settled().await.content, "direct");
}

#[tokio::test]
async fn test_empty_object_reply_is_pretty_printed() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_json_response(200, "{}").await;
    let (portal, _) = fixture.orchestrator(fixture.live_config());
    assert_eq!(portal.send("q").unwrap().settled().await.content, "{}");
}

#[tokio::test]
async fn test_get_omits_body() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", ENDPOINT)
        .match_body(Matcher::Exact(String::new()))
        .with_status(200)
        .with_body(r#""pong""#)
        .create_async()
        .await;

    let config = Configuration {
        method: "GET".into(),
        ..fixture.live_config()
    };
    let (portal, _) = fixture.orchestrator(config);
    let reply = portal.send("ping").unwrap().settled().await;

    mock.assert_async().await;
    assert_eq!(reply.content, "pong");
}

#[tokio::test]
async fn test_mock_mode_makes_no_request() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", ENDPOINT)
        .expect(0)
        .create_async()
        .await;

    let config = Configuration {
        mock_mode: true,
        ..fixture.live_config()
    };
    let (portal, _) = fixture.orchestrator(config);
    let reply = portal.send("hello").unwrap().settled().await;

    mock.assert_async().await;
    assert!(reply.content.contains("No additional material"));
}

#[tokio::test]
async fn test_empty_base_url_forces_mock() {
    let fixture = MockServerFixture::new().await;
    let config = Configuration {
        base_url: String::new(),
        ..fixture.live_config()
    };
    let (portal, _) = fixture.orchestrator(config);
    let reply = portal.send("hello").unwrap().settled().await;
    assert!(!reply.is_error);
    assert!(reply.content.contains("Instruction received"));
}

struct Unreadable;

#[async_trait]
impl AttachmentSource for Unreadable {
    fn name(&self) -> &str {
        "gone.bin"
    }
    fn size(&self) -> u64 {
        1
    }
    fn mime_type(&self) -> &str {
        "application/octet-stream"
    }
    fn last_modified(&self) -> Option<i64> {
        None
    }
    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, "file vanished"))
    }
}

#[tokio::test]
async fn test_attachment_failure_aborts_before_network() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", ENDPOINT)
        .expect(0)
        .create_async()
        .await;

    let (portal, _) = fixture.orchestrator(fixture.live_config());
    portal.stage_file(Arc::new(InMemoryFile::new("ok.txt", b"ok".to_vec())));
    portal.stage_file(Arc::new(Unreadable));
    let reply = portal.send("with files").unwrap().settled().await;

    mock.assert_async().await;
    assert!(reply.is_error);
    assert!(reply.content.contains("gone.bin"));
}

#[tokio::test]
async fn test_connection_refused_is_error() {
    let fixture = MockServerFixture::new().await;
    let config = Configuration {
        base_url: "http://127.0.0.1:1".into(),
        ..fixture.live_config()
    };
    let (portal, _) = fixture.orchestrator(config);
    let reply = portal.send("hello").unwrap().settled().await;
    assert!(reply.is_error);
    assert!(reply.content.starts_with("⚠️ dispatch failed:"));
}

#[tokio::test]
async fn test_concurrent_sends_settle_their_own_placeholders() {
    let mut fixture = MockServerFixture::new().await;
    let _first = fixture
        .server
        .mock("POST", ENDPOINT)
        .match_body(Matcher::PartialJson(json!({"input": "first"})))
        .with_status(200)
        .with_body(r#"{"content":"one"}"#)
        .create_async()
        .await;
    let _second = fixture
        .server
        .mock("POST", ENDPOINT)
        .match_body(Matcher::PartialJson(json!({"input": "second"})))
        .with_status(200)
        .with_body(r#"{"content":"two"}"#)
        .create_async()
        .await;

    let (portal, _) = fixture.orchestrator(fixture.live_config());
    let a = portal.send("first").unwrap();
    let b = portal.send("second").unwrap();
    assert_eq!(portal.pending_count(), 2);

    let (b_reply, a_reply) = (b.settled().await, a.settled().await);
    assert_eq!(a_reply.content, "one");
    assert_eq!(b_reply.content, "two");

    let contents: Vec<String> = portal
        .messages()
        .into_iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["first", "one", "second", "two"]);
}

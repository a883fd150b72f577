//! Configuration loading from remote documents.

use agent_portal::config::loader::LABEL_DEFAULTS;
use agent_portal::dispatch::{RecordingObserver, StatusState};
use agent_portal::{ConfigLoader, DispatchOrchestrator};
use mockito::Server;
use std::sync::Arc;

#[tokio::test]
async fn test_remote_json_document() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/config/app-config.json")
        .with_status(200)
        .with_body(r#"{"baseUrl":"http://backend","mock":false,"method":"patch","extraHeaders":"{\"X-A\":\"1\"}"}"#)
        .create_async()
        .await;

    let loaded = ConfigLoader::new()
        .with_source(format!("{}/config/app-config.json", server.url()))
        .with_env_overrides(false)
        .load()
        .await;

    assert!(!loaded.from_defaults);
    assert_eq!(loaded.label, "ready");
    assert_eq!(loaded.config.base_url, "http://backend");
    assert_eq!(loaded.config.method, "PATCH");
    assert_eq!(
        loaded.config.extra_headers.get("X-A"),
        Some(&Some("1".to_string()))
    );
}

#[tokio::test]
async fn test_remote_failure_falls_back_and_labels_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/config/app-config.json")
        .with_status(404)
        .create_async()
        .await;

    let loaded = ConfigLoader::new()
        .with_source(format!("{}/config/app-config.json", server.url()))
        .with_env_overrides(false)
        .load()
        .await;
    assert!(loaded.from_defaults);

    let observer = Arc::new(RecordingObserver::new());
    let portal = DispatchOrchestrator::builder()
        .loaded(loaded)
        .observer(observer.clone())
        .build()
        .unwrap();

    assert_eq!(
        observer.statuses(),
        vec![(StatusState::Idle, LABEL_DEFAULTS.to_string())]
    );
    // The default system prompt seeds the thread.
    assert_eq!(portal.message_count(), 1);
}

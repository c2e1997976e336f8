//! Integration tests for outbound-webhooks-core delivery against a live HTTP server

use outbound_webhooks_core::*;
use serde_json::json;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn next_notification(stream: &mut NotificationStream) -> Notification {
    tokio::time::timeout(Duration::from_secs(10), stream.recv())
        .await
        .expect("timed out waiting for notification")
        .expect("notifier closed")
}

async fn mount_ok(server: &MockServer, route: &str) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_trigger_delivers_envelope_with_auth_header() {
    let server = MockServer::start().await;
    mount_ok(&server, "/h").await;

    let webhooks = Webhooks::new().unwrap();
    let mut stream = webhooks.notifications();
    let sub = webhooks
        .add(
            SubscriptionRequest::new(format!("{}/h", server.uri()))
                .with_events(["user.create"])
                .with_tags(["A"]),
        )
        .await
        .unwrap();

    let summary = webhooks
        .trigger_by_event("user.create", json!({"userId": "u1"}), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.message, "Triggered 1 webhook(s)");
    assert_eq!(summary.subscription_ids, vec![sub.id.clone()]);

    let notification = next_notification(&mut stream).await;
    assert_eq!(notification.kind(), NotificationKind::Response);
    assert_eq!(notification.subscription_id(), sub.id);
    assert_eq!(notification.event(), "user.create");
    let response = notification.as_response().unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body.as_deref(), Some("ok"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    let auth = request.headers.get("authorization").unwrap().to_str().unwrap();
    assert_eq!(auth, format!("WH {}", sub.auth_token));
    assert_eq!(
        request.headers.get("x-webhook-id").unwrap().to_str().unwrap(),
        sub.id
    );

    let body: serde_json::Value = request.body_json().unwrap();
    assert_eq!(body["event"], "user.create");
    assert_eq!(body["webhookId"], sub.id.as_str());
    assert!(body["webhookSentAt"].is_string());
    assert_eq!(body["data"], json!({"userId": "u1"}));
}

#[tokio::test]
async fn test_no_auth_header_when_authentication_disabled() {
    let server = MockServer::start().await;
    mount_ok(&server, "/h").await;

    let webhooks = Webhooks::new().unwrap();
    let mut stream = webhooks.notifications();
    webhooks
        .add(
            SubscriptionRequest::new(format!("{}/h", server.uri()))
                .with_events(["e"])
                .with_authentication(false),
        )
        .await
        .unwrap();

    webhooks.trigger_by_event("e", json!(1), None).await.unwrap();
    next_notification(&mut stream).await;

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_custom_auth_scheme_is_sent() {
    let server = MockServer::start().await;
    mount_ok(&server, "/h").await;

    let config = WebhooksConfig::builder().auth_scheme("Bearer").build();
    let webhooks = Webhooks::builder().config(config).build().unwrap();
    let mut stream = webhooks.notifications();
    let sub = webhooks
        .add(SubscriptionRequest::new(format!("{}/h", server.uri())).with_events(["e"]))
        .await
        .unwrap();

    webhooks.trigger_by_event("e", json!({}), None).await.unwrap();
    next_notification(&mut stream).await;

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
    assert_eq!(auth, format!("Bearer {}", sub.auth_token));
}

#[tokio::test]
async fn test_server_errors_are_responses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let webhooks = Webhooks::new().unwrap();
    let mut stream = webhooks.notifications();
    webhooks
        .add(SubscriptionRequest::new(server.uri()).with_events(["e"]))
        .await
        .unwrap();

    webhooks.trigger_by_event("e", json!({}), None).await.unwrap();
    let notification = next_notification(&mut stream).await;

    assert_eq!(notification.kind(), NotificationKind::Response);
    assert_eq!(notification.as_response().unwrap().status, 500);
}

#[tokio::test]
async fn test_redirects_are_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/h"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/elsewhere"))
        .mount(&server)
        .await;
    mount_ok(&server, "/elsewhere").await;

    let webhooks = Webhooks::new().unwrap();
    let mut stream = webhooks.notifications();
    webhooks
        .add(SubscriptionRequest::new(format!("{}/h", server.uri())).with_events(["e"]))
        .await
        .unwrap();

    webhooks.trigger_by_event("e", json!({}), None).await.unwrap();
    let notification = next_notification(&mut stream).await;

    assert_eq!(notification.as_response().unwrap().status, 302);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/h");
}

#[tokio::test]
async fn test_timeout_is_error_notification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = WebhooksConfig::builder()
        .timeout(Duration::from_millis(200))
        .build();
    let webhooks = Webhooks::builder().config(config).build().unwrap();
    let mut stream = webhooks.notifications();
    webhooks
        .add(SubscriptionRequest::new(server.uri()).with_events(["e"]))
        .await
        .unwrap();

    webhooks.trigger_by_event("e", json!({}), None).await.unwrap();
    let notification = next_notification(&mut stream).await;

    assert_eq!(notification.kind(), NotificationKind::Error);
    assert!(matches!(
        notification.as_error().unwrap().error,
        DeliveryError::Timeout(_)
    ));
}

#[tokio::test]
async fn test_trigger_returns_before_delivery_completes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_millis(800)))
        .mount(&server)
        .await;

    let webhooks = Webhooks::new().unwrap();
    let mut stream = webhooks.notifications();
    webhooks
        .add(SubscriptionRequest::new(server.uri()).with_events(["e"]))
        .await
        .unwrap();

    let started = Instant::now();
    let summary = webhooks.trigger_by_event("e", json!({}), None).await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(summary.unwrap().count(), 1);

    let notification = next_notification(&mut stream).await;
    assert_eq!(notification.as_response().unwrap().status, 204);
    assert!(started.elapsed() >= Duration::from_millis(800));
}

#[tokio::test]
async fn test_tag_filter_limits_deliveries() {
    let server = MockServer::start().await;
    mount_ok(&server, "/tagged").await;
    mount_ok(&server, "/untagged").await;

    let webhooks = Webhooks::new().unwrap();
    let mut stream = webhooks.notifications();
    let tagged = webhooks
        .add(
            SubscriptionRequest::new(format!("{}/tagged", server.uri()))
                .with_events(["x"])
                .with_tags(["A"]),
        )
        .await
        .unwrap();
    webhooks
        .add(SubscriptionRequest::new(format!("{}/untagged", server.uri())).with_events(["x"]))
        .await
        .unwrap();

    let summary = webhooks
        .trigger_by_event("x", json!({}), Some("A"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.subscription_ids, vec![tagged.id.clone()]);

    let notification = next_notification(&mut stream).await;
    assert_eq!(notification.subscription_id(), tagged.id);

    // nothing else should arrive
    let extra = tokio::time::timeout(Duration::from_millis(300), stream.recv()).await;
    assert!(extra.is_err());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/tagged");
}

#[tokio::test]
async fn test_fan_out_reports_every_delivery() {
    let server = MockServer::start().await;
    mount_ok(&server, "/ok").await;

    let webhooks = Webhooks::new().unwrap();
    let mut stream = webhooks.notifications();

    let mut expected = HashSet::new();
    for _ in 0..3 {
        let sub = webhooks
            .add(SubscriptionRequest::new(format!("{}/ok", server.uri())).with_events(["e"]))
            .await
            .unwrap();
        expected.insert(sub.id);
    }
    // one subscription whose endpoint refuses connections
    let broken = webhooks
        .add(SubscriptionRequest::new("http://127.0.0.1:1/hook").with_events(["e"]))
        .await
        .unwrap();
    expected.insert(broken.id.clone());

    let summary = webhooks
        .trigger_by_event("e", json!({"batch": true}), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.count(), 4);

    let mut seen = HashSet::new();
    for _ in 0..4 {
        let notification = next_notification(&mut stream).await;
        if notification.subscription_id() == broken.id {
            assert_eq!(notification.kind(), NotificationKind::Error);
        } else {
            assert_eq!(notification.kind(), NotificationKind::Response);
        }
        seen.insert(notification.subscription_id().to_string());
    }
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_response_body_is_truncated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a".repeat(100)))
        .mount(&server)
        .await;

    let config = WebhooksConfig::builder().max_response_body(16).build();
    let webhooks = Webhooks::builder().config(config).build().unwrap();
    let mut stream = webhooks.notifications();
    webhooks
        .add(SubscriptionRequest::new(server.uri()).with_events(["e"]))
        .await
        .unwrap();

    webhooks.trigger_by_event("e", json!({}), None).await.unwrap();
    let notification = next_notification(&mut stream).await;

    let body = notification.as_response().unwrap().body.clone().unwrap();
    assert_eq!(body.len(), 16);
    assert!(body.ends_with("..."));
}

#[tokio::test]
async fn test_on_notification_handler() {
    let server = MockServer::start().await;
    mount_ok(&server, "/h").await;

    let webhooks = Webhooks::new().unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let _listener = webhooks.on_notification(NotificationKind::Response, move |n| {
        let _ = tx.send(n.subscription_id().to_string());
    });

    let sub = webhooks
        .add(SubscriptionRequest::new(format!("{}/h", server.uri())).with_events(["e"]))
        .await
        .unwrap();
    webhooks.trigger_by_event("e", json!({}), None).await.unwrap();

    let id = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(id, sub.id);
}

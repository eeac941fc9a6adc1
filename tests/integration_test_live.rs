mod common;

use axum::{body::Body, http::{header, Request, StatusCode}};
use common::TestApp;
use futures::StreamExt;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, Message},
};
use tower::ServiceExt;

fn text_payload(frame: Message) -> Value {
    match frame {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {:?}", other),
    }
}

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_live_route_checks_read_access_before_upgrading() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let stranger = app.sign_in("stranger@x.com").await;
    let event = app.create_event(&alice.token, "Board Dinner", "PRIVATE").await;
    let uri = format!("/api/v1/events/{}/live", event["id"].as_str().unwrap());

    let (status, body) = app.request("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(app.request("GET", &uri, Some(&stranger.token), None).await.0, StatusCode::FORBIDDEN);
    assert_eq!(app.request("GET", "/api/v1/events/missing/live", None, None).await.0, StatusCode::NOT_FOUND);

    // Allowed, but a plain request cannot be upgraded.
    let req = Request::builder()
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", alice.token))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(req).await.unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(app.state.realtime.subscriber_count(event["id"].as_str().unwrap()), 0);
}

#[tokio::test]
async fn test_live_socket_receives_event_messages() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let bob = app.sign_in("bob@x.com").await;
    let event = app.create_event(&alice.token, "Board Dinner", "PRIVATE").await;
    let event_id = event["id"].as_str().unwrap().to_string();
    app.request(
        "POST",
        &format!("/api/v1/events/{}/invitations", event_id),
        Some(&alice.token),
        Some(json!({ "user_id": bob.user.id })),
    )
    .await;

    let addr = serve(&app).await;
    let mut request = format!("ws://{}/api/v1/events/{}/live", addr, event_id).into_client_request().unwrap();
    request
        .headers_mut()
        .insert("authorization", format!("Bearer {}", bob.token).parse().unwrap());
    let (mut socket, response) = connect_async(request).await.unwrap();
    assert_eq!(response.status().as_u16(), 101);
    assert_eq!(app.state.realtime.subscriber_count(&event_id), 1);

    let (status, _) = app
        .request(
            "POST",
            &format!("/api/v1/events/{}/announcements", event_id),
            Some(&alice.token),
            Some(json!({ "title": "Doors open", "message": "Come on in" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let frame = timeout(Duration::from_secs(2), socket.next()).await.unwrap().unwrap().unwrap();
    let payload = text_payload(frame);
    assert_eq!(payload["type"], "announcement");
    assert_eq!(payload["event_id"], event_id.as_str());
    assert_eq!(payload["announcement"]["title"], "Doors open");
}

#[tokio::test]
async fn test_anonymous_subscriber_on_a_public_event() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let event = app.create_event(&alice.token, "Open Day", "PUBLIC").await;
    let event_id = event["id"].as_str().unwrap().to_string();

    let addr = serve(&app).await;
    let (mut socket, _) = connect_async(format!("ws://{}/api/v1/events/{}/live", addr, event_id)).await.unwrap();

    app.request("PATCH", &format!("/api/v1/events/{}", event_id), Some(&alice.token), Some(json!({ "name": "Open Day II" })))
        .await;

    let frame = timeout(Duration::from_secs(2), socket.next()).await.unwrap().unwrap().unwrap();
    let payload = text_payload(frame);
    assert_eq!(payload["type"], "event_updated");
    assert_eq!(payload["event"]["name"], "Open Day II");
}

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_private_event_needs_an_invitation() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let bob = app.sign_in("bob@x.com").await;
    let e1 = app.create_event(&alice.token, "Board Dinner", "PRIVATE").await;
    let e1_id = id_of(&e1);
    let uri = format!("/api/v1/events/{}", e1_id);

    assert_eq!(app.request("GET", &uri, Some(&bob.token), None).await.0, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request("POST", "/api/v1/guest-events/join", Some(&bob.token), Some(json!({ "event_id": e1_id })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Bob is not the owner and cannot invite himself either.
    let (status, _) = app
        .request("POST", &format!("{}/invitations", uri), Some(&bob.token), Some(json!({ "user_id": bob.user.id })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request("POST", &format!("{}/invitations", uri), Some(&alice.token), Some(json!({ "email": "BOB@x.com" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "INVITED");
    assert_eq!(body["data"]["user_id"], bob.user.id.as_str());
    assert!(body["data"]["joined_at"].is_null());

    // Any membership, whatever its status, opens the event.
    let (status, body) = app.request("GET", &uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Board Dinner");
}

#[tokio::test]
async fn test_owner_cannot_self_join_a_private_event() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let e1 = app.create_event(&alice.token, "Board Dinner", "PRIVATE").await;

    let (status, body) = app
        .request("POST", "/api/v1/guest-events/join", Some(&alice.token), Some(json!({ "short_code": e1["short_code"] })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_anonymous_join_by_short_code_provisions_a_guest() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let e2 = app.create_event(&alice.token, "Open Day", "PUBLIC").await;
    let code = e2["short_code"].as_str().unwrap().to_lowercase();

    let payload = json!({ "short_code": code, "email": "carol@x.com", "name": "Carol" });
    let (status, first) = app.request("POST", "/api/v1/guest-events/join", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let membership = &first["data"]["membership"];
    assert_eq!(membership["status"], "JOINED");
    assert!(!membership["joined_at"].is_null());
    assert_eq!(first["data"]["event"]["id"], e2["id"]);

    let (status, second) = app.request("POST", "/api/v1/guest-events/join", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    let again = &second["data"]["membership"];
    assert_eq!(again["id"], membership["id"]);
    assert_eq!(again["joined_at"], membership["joined_at"]);
    assert_eq!(again["updated_at"], membership["updated_at"]);

    // Carol later signs in with a real identity and finds the same account.
    let carol = app.sign_in("carol@x.com").await;
    assert_eq!(carol.user.id, membership["user_id"].as_str().unwrap());
    let (_, mine) = app.request("GET", "/api/v1/guest-events/mine", Some(&carol.token), None).await;
    let mine = mine["data"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["event"]["name"], "Open Day");
}

#[tokio::test]
async fn test_join_is_idempotent_and_keeps_escalated_status() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let bob = app.sign_in("bob@x.com").await;
    let event = app.create_event(&alice.token, "Soft Launch", "UNLISTED").await;
    let event_id = id_of(&event);
    let join = json!({ "event_id": event_id });

    let (_, first) = app.request("POST", "/api/v1/guest-events/join", Some(&bob.token), Some(join.clone())).await;
    let (_, second) = app.request("POST", "/api/v1/guest-events/join", Some(&bob.token), Some(join.clone())).await;
    assert_eq!(first["data"]["membership"]["id"], second["data"]["membership"]["id"]);
    assert_eq!(first["data"]["membership"]["joined_at"], second["data"]["membership"]["joined_at"]);

    let status_uri = format!("/api/v1/guest-events/{}/{}/status", bob.user.id, event_id);
    let (status, checked_in) = app
        .request("PATCH", &status_uri, Some(&alice.token), Some(json!({ "status": "CHECKED_IN" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checked_in["data"]["status"], "CHECKED_IN");
    assert!(!checked_in["data"]["checked_in_at"].is_null());

    // Joining again never demotes.
    let (_, third) = app.request("POST", "/api/v1/guest-events/join", Some(&bob.token), Some(join)).await;
    assert_eq!(third["data"]["membership"]["status"], "CHECKED_IN");
    assert_eq!(third["data"]["membership"]["joined_at"], first["data"]["membership"]["joined_at"]);

    let history = app.state.guest_service.membership_history(&bob.user.id, &event_id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_authenticated_join_ignores_a_foreign_user_id() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let bob = app.sign_in("bob@x.com").await;
    let dave = app.sign_in("dave@x.com").await;
    let event = app.create_event(&alice.token, "Open Day", "PUBLIC").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/guest-events/join",
            Some(&bob.token),
            Some(json!({ "event_id": event["id"], "user_id": dave.user.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["membership"]["user_id"], bob.user.id.as_str());

    let (_, mine) = app.request("GET", "/api/v1/guest-events/mine", Some(&dave.token), None).await;
    assert!(mine["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_check_in_from_invited_leaves_joined_at_empty() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let bob = app.sign_in("bob@x.com").await;
    let e1 = app.create_event(&alice.token, "Board Dinner", "PRIVATE").await;
    let e1_id = id_of(&e1);

    app.request(
        "POST",
        &format!("/api/v1/events/{}/invitations", e1_id),
        Some(&alice.token),
        Some(json!({ "user_id": bob.user.id })),
    )
    .await;

    let status_uri = format!("/api/v1/guest-events/{}/{}/status", bob.user.id, e1_id);
    let (status, body) = app
        .request("PATCH", &status_uri, Some(&alice.token), Some(json!({ "status": "CHECKED_IN" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "CHECKED_IN");
    assert!(!body["data"]["checked_in_at"].is_null());
    assert!(body["data"]["joined_at"].is_null());
    let checked_in_at = body["data"]["checked_in_at"].clone();

    // Moving back does not clear the check-in timestamp.
    let (_, body) = app
        .request("PATCH", &status_uri, Some(&alice.token), Some(json!({ "status": "JOINED" })))
        .await;
    assert_eq!(body["data"]["status"], "JOINED");
    assert!(!body["data"]["joined_at"].is_null());
    assert_eq!(body["data"]["checked_in_at"], checked_in_at);

    let (status, _) = app
        .request("PATCH", &status_uri, Some(&alice.token), Some(json!({ "status": "ARRIVED" })))
        .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_leave_then_rejoin_creates_a_new_row() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let bob = app.sign_in("bob@x.com").await;
    let event = app.create_event(&alice.token, "Open Day", "PUBLIC").await;
    let event_id = id_of(&event);
    let join = json!({ "event_id": event_id });

    let (_, first) = app.request("POST", "/api/v1/guest-events/join", Some(&bob.token), Some(join.clone())).await;
    let original_id = first["data"]["membership"]["id"].as_str().unwrap().to_string();

    let status_uri = format!("/api/v1/guest-events/{}/{}/status", bob.user.id, event_id);
    app.request("PATCH", &status_uri, Some(&alice.token), Some(json!({ "status": "CHECKED_IN" }))).await;

    let leave_uri = format!("/api/v1/guest-events/{}", event_id);
    assert_eq!(app.request("DELETE", &leave_uri, Some(&bob.token), None).await.0, StatusCode::OK);
    assert_eq!(app.request("DELETE", &leave_uri, Some(&bob.token), None).await.0, StatusCode::NOT_FOUND);

    let (status, second) = app.request("POST", "/api/v1/guest-events/join", Some(&bob.token), Some(join)).await;
    assert_eq!(status, StatusCode::CREATED);
    let rejoined = &second["data"]["membership"];
    assert_eq!(rejoined["status"], "JOINED");
    assert!(rejoined["checked_in_at"].is_null());
    assert_ne!(rejoined["id"].as_str().unwrap(), original_id);

    let history = app.state.guest_service.membership_history(&bob.user.id, &event_id).await.unwrap();
    assert_eq!(history.len(), 2);
    let original = history.iter().find(|g| g.id == original_id).unwrap();
    assert!(original.deleted_at.is_some());
    assert_eq!(original.status.as_str(), "CHECKED_IN");
    assert_eq!(history.iter().filter(|g| g.is_active()).count(), 1);
}

#[tokio::test]
async fn test_membership_operations_without_a_row() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let bob = app.sign_in("bob@x.com").await;
    let event = app.create_event(&alice.token, "Open Day", "PUBLIC").await;
    let event_id = id_of(&event);

    let status_uri = format!("/api/v1/guest-events/{}/{}/status", bob.user.id, event_id);
    let (status, body) = app
        .request("PATCH", &status_uri, Some(&alice.token), Some(json!({ "status": "JOINED" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = app.request("PATCH", &status_uri, None, Some(json!({ "status": "JOINED" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request("DELETE", &format!("/api/v1/guest-events/{}", event_id), Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_join_request_validation() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let event = app.create_event(&alice.token, "Open Day", "PUBLIC").await;

    let (status, _) = app.request("POST", "/api/v1/guest-events/join", None, Some(json!({ "email": "x@x.com" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.request("POST", "/api/v1/guest-events/join", None, Some(json!({ "event_id": event["id"] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request("POST", "/api/v1/guest-events/join", None, Some(json!({ "short_code": "NOPE2345", "email": "x@x.com" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request("POST", "/api/v1/guest-events/join", None, Some(json!({ "event_id": event["id"], "user_id": "missing" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.request("DELETE", &format!("/api/v1/events/{}", id_of(&event)), Some(&alice.token), None).await;
    let (status, _) = app
        .request("POST", "/api/v1/guest-events/join", None, Some(json!({ "event_id": event["id"], "email": "x@x.com" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_guest_list_follows_read_access() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let bob = app.sign_in("bob@x.com").await;
    let stranger = app.sign_in("stranger@x.com").await;
    let e1 = app.create_event(&alice.token, "Board Dinner", "PRIVATE").await;
    let uri = format!("/api/v1/events/{}/guests", id_of(&e1));

    app.request(
        "POST",
        &format!("/api/v1/events/{}/invitations", id_of(&e1)),
        Some(&alice.token),
        Some(json!({ "email": bob.user.email })),
    )
    .await;

    assert_eq!(app.request("GET", &uri, None, None).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(app.request("GET", &uri, Some(&stranger.token), None).await.0, StatusCode::FORBIDDEN);

    let (status, body) = app.request("GET", &uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let guests = body["data"].as_array().unwrap();
    assert_eq!(guests.len(), 1);
    assert_eq!(guests[0]["user_email"], "bob@x.com");
    assert_eq!(guests[0]["status"], "INVITED");
}

#[tokio::test]
async fn test_anonymous_join_with_only_a_name() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let event = app.create_event(&alice.token, "Open Day", "PUBLIC").await;
    let payload = json!({ "short_code": event["short_code"], "name": "Carol" });

    let (status, first) = app.request("POST", "/api/v1/guest-events/join", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let membership = &first["data"]["membership"];
    assert_eq!(membership["status"], "JOINED");

    let guest = app.state.identity.get(membership["user_id"].as_str().unwrap()).await.unwrap();
    assert_eq!(guest.name.as_deref(), Some("Carol"));
    assert!(guest.email.is_none());

    // Without an email there is nothing to match on, so a second join is a second guest.
    let (status, second) = app.request("POST", "/api/v1/guest-events/join", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(second["data"]["membership"]["user_id"], membership["user_id"]);

    let (_, guests) = app.request("GET", &format!("/api/v1/events/{}/guests", id_of(&event)), None, None).await;
    assert_eq!(guests["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_leaving_a_private_event_revokes_access() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let bob = app.sign_in("bob@x.com").await;
    let e1 = app.create_event(&alice.token, "Board Dinner", "PRIVATE").await;
    let e1_id = id_of(&e1);
    let uri = format!("/api/v1/events/{}", e1_id);

    app.request("POST", &format!("{}/invitations", uri), Some(&alice.token), Some(json!({ "user_id": bob.user.id })))
        .await;
    assert_eq!(app.request("GET", &uri, Some(&bob.token), None).await.0, StatusCode::OK);
    let (_, listed) = app.request("GET", "/api/v1/events", Some(&bob.token), None).await;
    assert!(listed["data"].as_array().unwrap().iter().any(|e| e["id"] == e1_id.as_str()));

    let (status, _) = app.request("DELETE", &format!("/api/v1/guest-events/{}", e1_id), Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.request("GET", &uri, Some(&bob.token), None).await.0, StatusCode::FORBIDDEN);
    let (status, listed) = app.request("GET", "/api/v1/events", Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed["data"].as_array().unwrap().iter().all(|e| e["id"] != e1_id.as_str()));
}

#[tokio::test]
async fn test_membership_changes_on_a_deleted_event_are_not_found() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@x.com").await;
    let bob = app.sign_in("bob@x.com").await;
    let event = app.create_event(&alice.token, "Open Day", "PUBLIC").await;
    let event_id = id_of(&event);

    app.request("POST", "/api/v1/guest-events/join", Some(&bob.token), Some(json!({ "event_id": event_id }))).await;
    let (status, _) = app.request("DELETE", &format!("/api/v1/events/{}", event_id), Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let status_uri = format!("/api/v1/guest-events/{}/{}/status", bob.user.id, event_id);
    let (status, body) = app
        .request("PATCH", &status_uri, Some(&alice.token), Some(json!({ "status": "CHECKED_IN" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Event not found");

    let (status, _) = app.request("DELETE", &format!("/api/v1/guest-events/{}", event_id), Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The membership row itself was left untouched.
    let history = app.state.guest_service.membership_history(&bob.user.id, &event_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].is_active());
    assert_eq!(history[0].status.as_str(), "JOINED");
}

use serde_json::{json, Value};
use uuid::Uuid;

use crate::helpers::spawn_app;

#[tokio::test]
async fn every_bookmark_endpoint_requires_a_session() {
    let app = spawn_app().await;
    let some_id = Uuid::new_v4().to_string();

    let responses = vec![
        app.get("/api/bookmarks", None).await,
        app.post_bookmark(None, &json!({ "url": "https://example.com", "title": "Example" }))
            .await,
        app.delete_bookmark(None, &some_id).await,
        app.get("/api/bookmarks", Some("not-a-jwt")).await,
        app.delete_bookmark(Some("not-a-jwt"), &some_id).await,
        app.get("/api/bookmarks?token=a&token=b", None).await,
    ];

    for response in responses {
        assert_eq!(response.status().as_u16(), 401);
        let body: Value = response.json().await.expect("error body");
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }
}

#[tokio::test]
async fn create_echoes_input_and_sets_owner() {
    let app = spawn_app().await;
    let user_id = Uuid::new_v4();
    let token = app.signed_jwt(user_id);

    let response = app
        .post_bookmark(
            Some(&token),
            &json!({ "url": "https://example.com", "title": "Example" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("bookmark body");
    assert_eq!(body["userId"], user_id.to_string());
    assert_eq!(body["url"], "https://example.com");
    assert_eq!(body["title"], "Example");
    assert!(Uuid::parse_str(body["id"].as_str().expect("id string")).is_ok());
    assert!(body["createdAt"].is_string());
    assert!(body["updatedAt"].is_string());
}

#[tokio::test]
async fn create_rejects_missing_fields() {
    let app = spawn_app().await;
    let token = app.signed_jwt(Uuid::new_v4());

    let bodies = vec![
        json!({ "url": "https://example.com" }),
        json!({ "title": "Example" }),
        json!({ "url": "", "title": "Example" }),
        json!({ "url": "https://example.com", "title": "" }),
        json!({ "url": 42, "title": "Example" }),
        json!([]),
    ];

    for body in bodies {
        let response = app.post_bookmark(Some(&token), &body).await;
        assert_eq!(response.status().as_u16(), 400, "body {body} was accepted");
        let error: Value = response.json().await.expect("error body");
        assert_eq!(error["error"], "URL and title are required");
    }

    assert!(app.list_bookmarks(&token).await.is_empty());
}

#[tokio::test]
async fn create_rejects_a_body_that_is_not_json() {
    let app = spawn_app().await;
    let token = app.signed_jwt(Uuid::new_v4());

    let response = app
        .api_client
        .post(format!("{}/api/bookmarks", app.address))
        .bearer_auth(&token)
        .header("Content-Type", "application/json")
        .body("url=https://example.com")
        .send()
        .await
        .expect("request executed");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn list_is_newest_first_and_scoped_to_owner() {
    let app = spawn_app().await;
    let token = app.signed_jwt(Uuid::new_v4());
    let other_token = app.signed_jwt(Uuid::new_v4());

    let first = app.create_bookmark(&token, "https://one.example", "One").await;
    let second = app.create_bookmark(&token, "https://two.example", "Two").await;
    app.create_bookmark(&other_token, "https://three.example", "Three")
        .await;

    assert!(first.created_at <= second.created_at);
    let listed = app.list_bookmarks(&token).await;
    assert_eq!(listed, vec![second, first]);
}

#[tokio::test]
async fn owner_can_delete_bookmark() {
    let app = spawn_app().await;
    let token = app.signed_jwt(Uuid::new_v4());
    let bookmark = app.create_bookmark(&token, "https://example.com", "Example").await;

    let response = app
        .delete_bookmark(Some(&token), &bookmark.id.to_string())
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("delete body");
    assert_eq!(body, json!({ "success": true }));
    assert!(app.list_bookmarks(&token).await.is_empty());

    let again = app
        .delete_bookmark(Some(&token), &bookmark.id.to_string())
        .await;
    assert_eq!(again.status().as_u16(), 404);
}

#[tokio::test]
async fn deleting_someone_elses_bookmark_is_forbidden() {
    let app = spawn_app().await;
    let owner_token = app.signed_jwt(Uuid::new_v4());
    let intruder_token = app.signed_jwt(Uuid::new_v4());
    let bookmark = app
        .create_bookmark(&owner_token, "https://example.com", "Example")
        .await;

    let response = app
        .delete_bookmark(Some(&intruder_token), &bookmark.id.to_string())
        .await;

    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body, json!({ "error": "Forbidden" }));
    assert_eq!(app.list_bookmarks(&owner_token).await, vec![bookmark]);
}

#[tokio::test]
async fn deleting_unknown_bookmark_is_not_found() {
    let app = spawn_app().await;
    let token = app.signed_jwt(Uuid::new_v4());

    for id in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let response = app.delete_bookmark(Some(&token), &id).await;
        assert_eq!(response.status().as_u16(), 404);
        let body: Value = response.json().await.expect("error body");
        assert_eq!(body, json!({ "error": "Bookmark not found" }));
    }
}

#[tokio::test]
async fn token_may_be_passed_as_query_parameter() {
    let app = spawn_app().await;
    let user_id = Uuid::new_v4();
    let token = app.signed_jwt(user_id);

    let response = app
        .get(&format!("/api/session?token={}", token), None)
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("session body");
    assert_eq!(body["id"], user_id.to_string());
    assert_eq!(body["email"], format!("{}@example.com", user_id));
}

#[tokio::test]
async fn root_is_public() {
    let app = spawn_app().await;

    let response = app.get("/", None).await;

    assert_eq!(response.status().as_u16(), 200);
}

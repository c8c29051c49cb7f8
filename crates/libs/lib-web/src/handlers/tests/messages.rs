//! Message history and the send pipeline.

use super::*;

fn send(token: &str, conversation_id: &str, content: &str) -> Request<Body> {
    json_request(
        Method::POST,
        "/api/messages",
        Some(token),
        json!({ "conversationId": conversation_id, "content": content }),
    )
}

fn history(token: &str, conversation_id: &str) -> Request<Body> {
    get_request(&format!("/api/messages?conversationId={conversation_id}"), Some(token))
}

#[tokio::test]
async fn test_hi_gets_scripted_reply() {
    let app = test_app().await;
    let alice = app.sign_in("a@x.com", "Alice").await;
    let conversation_id = app.assistant_conversation_id(&alice).await;

    let (status, body) = app.send(send(&alice.token, &conversation_id, "hi")).await;

    assert_eq!(status, StatusCode::CREATED);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "hi");
    assert_eq!(messages[0]["author"]["id"], alice.id.as_str());
    assert_eq!(messages[1]["content"], "Cracoufrat!");
    assert_eq!(messages[1]["author"]["email"], "assistant@cracouchat.local");
    assert_eq!(messages[1]["author"]["name"], "Cracoufrat Assistant");

    // External ids are UUIDs, never the internal row number.
    assert_eq!(messages[0]["id"].as_str().unwrap().len(), 36);
    assert!(messages[0]["timestamp"].as_str().unwrap().ends_with('Z'));

    let (status, listed) = app.send(history(&alice.token, &conversation_id)).await;
    assert_eq!(status, StatusCode::OK);
    let contents: Vec<&str> = listed["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["hi", "Cracoufrat!"]);
    assert_eq!(listed["messages"][0]["id"], messages[0]["id"]);
}

#[tokio::test]
async fn test_blank_content_rejected_without_insert() {
    let app = test_app().await;
    let alice = app.sign_in("a@x.com", "Alice").await;
    let conversation_id = app.assistant_conversation_id(&alice).await;

    for content in ["", "   "] {
        let (status, body) = app.send(send(&alice.token, &conversation_id, content)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "InvalidInput");
    }

    let missing_content = json_request(
        Method::POST,
        "/api/messages",
        Some(&alice.token),
        json!({ "conversationId": conversation_id }),
    );
    let (status, _) = app.send(missing_content).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let too_long = "x".repeat(10_001);
    let (status, _) = app.send(send(&alice.token, &conversation_id, &too_long)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.count("messages").await, 0);
}

#[tokio::test]
async fn test_missing_conversation_id_is_400() {
    let app = test_app().await;
    let alice = app.sign_in("a@x.com", "Alice").await;

    let (status, body) = app.send(get_request("/api/messages", Some(&alice.token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conversationId is required");

    let (status, _) = app
        .send(json_request(
            Method::POST,
            "/api/messages",
            Some(&alice.token),
            json!({ "content": "hi" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_query_is_json_400() {
    let app = test_app().await;
    let alice = app.sign_in("a@x.com", "Alice").await;

    let request = get_request(
        "/api/messages?conversationId=a&conversationId=b",
        Some(&alice.token),
    );
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Invalid query string");
    assert_eq!(body["code"], "InvalidInput");
}

#[tokio::test]
async fn test_non_participant_sees_not_found() {
    let app = test_app().await;
    let alice = app.sign_in("a@x.com", "Alice").await;
    let mallory = app.sign_in("m@x.com", "Mallory").await;
    let conversation_id = app.assistant_conversation_id(&alice).await;

    let (status, body) = app.send(history(&mallory.token, &conversation_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Conversation not found");

    let (status, missing) = app.send(history(&mallory.token, "does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing, body);

    let (status, _) = app.send(send(&mallory.token, &conversation_id, "let me in")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.count("messages").await, 0);
}

#[tokio::test]
async fn test_direct_conversation_gets_reply_for_each_human_message() {
    let app = test_app().await;
    let alice = app.sign_in("a@x.com", "Alice").await;
    let bob = app.sign_in("b@x.com", "Bob").await;

    let (_, conversation) = app
        .send(json_request(
            Method::POST,
            "/api/conversations",
            Some(&alice.token),
            json!({ "participantEmail": "b@x.com" }),
        ))
        .await;
    let conversation_id = conversation["id"].as_str().unwrap();

    let (_, first) = app.send(send(&alice.token, conversation_id, "hello bob")).await;
    let (_, second) = app.send(send(&bob.token, conversation_id, "hi alice")).await;

    assert_eq!(first["messages"].as_array().unwrap().len(), 2);
    assert_eq!(second["messages"].as_array().unwrap().len(), 2);
    assert_eq!(second["messages"][0]["author"]["id"], bob.id.as_str());

    let (_, listed) = app.send(history(&bob.token, conversation_id)).await;
    let contents: Vec<&str> = listed["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["hello bob", "Cracoufrat!", "hi alice", "Cracoufrat!"]);
}

#[tokio::test]
async fn test_messages_require_session() {
    let app = test_app().await;

    let (status, _) = app.send(get_request("/api/messages?conversationId=c1", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = json_request(
        Method::POST,
        "/api/messages",
        None,
        json!({ "conversationId": "c1", "content": "hi" }),
    );
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

mod support;

use std::time::Duration;

use serde_json::json;

use support::{roster_names, TestServer, WsClient};

async fn join(server: &TestServer, name: &str) -> WsClient {
    let mut client = server.connect().await;
    client
        .emit("join", json!({ "name": name, "avatar": format!("/img/{name}.png") }))
        .await;
    let roster = client.expect_event("update-user-list").await;
    assert!(roster_names(&roster).iter().any(|n| n == name));
    client
}

#[tokio::test]
async fn second_join_is_announced_to_others_only() {
    let server = TestServer::start().await;
    let mut alice = join(&server, "Alice").await;
    let mut bob = server.connect().await;
    bob.emit("join", json!({ "name": "Bob", "avatar": "/img/bob.png" }))
        .await;

    let connected = alice.next_event().await;
    assert_eq!(connected["event"], "user-connected");
    assert_eq!(connected["data"]["name"], "Bob");
    assert_eq!(connected["data"]["avatar"], "/img/bob.png");
    let roster = alice.next_event().await;
    assert_eq!(roster_names(&roster), vec!["Alice", "Bob"]);

    // Bob 只收到名单，不会收到自己的上线通知
    let roster = bob.next_event().await;
    assert_eq!(roster_names(&roster), vec!["Alice", "Bob"]);
    bob.expect_silence().await;
    alice.expect_silence().await;

    let entry = roster["data"]
        .as_object()
        .expect("roster object")
        .iter()
        .find(|(_, entry)| entry["name"] == "Bob")
        .map(|(key, entry)| (key.clone(), entry.clone()))
        .expect("bob entry");
    assert_eq!(entry.1["socketId"], entry.0);
}

#[tokio::test]
async fn chat_message_reaches_everyone_including_sender() {
    let server = TestServer::start().await;
    let mut alice = join(&server, "Alice").await;
    let mut bob = join(&server, "Bob").await;
    alice.expect_event("update-user-list").await;

    alice.emit("chat-message", json!({ "message": "hi" })).await;

    for client in [&mut alice, &mut bob] {
        let event = client.next_event().await;
        assert_eq!(event["event"], "chat-message");
        assert_eq!(event["data"], json!({ "name": "Alice", "message": "hi" }));
    }
}

#[tokio::test]
async fn private_message_reaches_only_the_named_recipient() {
    let server = TestServer::start().await;
    let mut alice = join(&server, "Alice").await;
    let mut bob = join(&server, "Bob").await;
    let mut carol = join(&server, "Carol").await;
    alice.expect_event("update-user-list").await;
    alice.expect_event("update-user-list").await;
    bob.expect_event("update-user-list").await;

    alice
        .emit(
            "private-message",
            json!({ "toUserName": "Bob", "message": "psst" }),
        )
        .await;

    let event = bob.next_event().await;
    assert_eq!(event["event"], "private-message");
    assert_eq!(event["data"], json!({ "from": "Alice", "message": "psst" }));
    alice.expect_silence().await;
    carol.expect_silence().await;
}

#[tokio::test]
async fn private_message_to_unknown_name_is_dropped() {
    let server = TestServer::start().await;
    let mut alice = join(&server, "Alice").await;

    alice
        .emit(
            "private-message",
            json!({ "toUserName": "Nobody", "message": "hello?" }),
        )
        .await;
    alice.expect_silence().await;

    // 连接仍然可用
    alice.emit("chat-message", json!({ "message": "still here" })).await;
    let event = alice.expect_event("chat-message").await;
    assert_eq!(event["data"]["message"], "still here");
}

#[tokio::test]
async fn typing_is_not_echoed_to_sender() {
    let server = TestServer::start().await;
    let mut alice = join(&server, "Alice").await;
    let mut bob = join(&server, "Bob").await;
    alice.expect_event("update-user-list").await;

    alice.emit("typing", json!({ "name": "Alice" })).await;

    let event = bob.next_event().await;
    assert_eq!(event, json!({ "event": "typing", "data": { "name": "Alice" } }));
    alice.expect_silence().await;
}

#[tokio::test]
async fn file_message_is_relayed_to_everyone() {
    let server = TestServer::start().await;
    let mut alice = join(&server, "Alice").await;
    let mut bob = join(&server, "Bob").await;
    alice.expect_event("update-user-list").await;

    bob.emit(
        "file-message",
        json!({ "filePath": "/uploads/file-1-abc.png", "fileType": "image/png" }),
    )
    .await;

    for client in [&mut alice, &mut bob] {
        let event = client.next_event().await;
        assert_eq!(event["event"], "file-message");
        assert_eq!(event["data"]["filePath"], "/uploads/file-1-abc.png");
        assert_eq!(event["data"]["fileType"], "image/png");
    }
}

#[tokio::test]
async fn disconnect_announces_departure_and_shrinks_roster() {
    let server = TestServer::start().await;
    let mut alice = join(&server, "Alice").await;
    let bob = join(&server, "Bob").await;
    alice.expect_event("update-user-list").await;
    server.wait_for_participants(2).await;

    bob.close().await;

    let gone = alice.next_event().await;
    assert_eq!(gone["event"], "user-disconnected");
    assert_eq!(gone["data"]["name"], "Bob");
    let roster = alice.next_event().await;
    assert_eq!(roster_names(&roster), vec!["Alice"]);
    server.wait_for_participants(1).await;
}

#[tokio::test]
async fn disconnect_without_join_is_silent() {
    let server = TestServer::start().await;
    let mut alice = join(&server, "Alice").await;
    let lurker = server.connect().await;

    lurker.close().await;
    server.wait_for_open(1).await;
    alice.expect_silence().await;
    server.wait_for_participants(1).await;
}

#[tokio::test]
async fn unjoined_session_still_receives_broadcasts() {
    let server = TestServer::start().await;
    let mut lurker = server.connect().await;
    let mut alice = join(&server, "Alice").await;

    // 未加入的会话同样收到名单与上线通知
    let connected = lurker.next_event().await;
    assert_eq!(connected["event"], "user-connected");
    let roster = lurker.next_event().await;
    assert_eq!(roster_names(&roster), vec!["Alice"]);

    // 未加入的连接发出的聊天消息被丢弃
    lurker.emit("chat-message", json!({ "message": "anon" })).await;
    alice.expect_silence().await;
}

#[tokio::test]
async fn malformed_frames_keep_the_connection_open() {
    let server = TestServer::start().await;
    let mut alice = join(&server, "Alice").await;

    alice.send_raw("not json at all").await;
    alice.send_raw(r#"{"event":"teleport","data":{}}"#).await;
    alice.emit("join", json!({ "name": "   " })).await;
    alice.expect_silence().await;

    alice.emit("chat-message", json!({ "message": "ok" })).await;
    let event = alice.expect_event("chat-message").await;
    assert_eq!(event["data"], json!({ "name": "Alice", "message": "ok" }));
    server.wait_for_participants(1).await;
}

#[tokio::test]
async fn rejoin_renames_in_place() {
    let server = TestServer::start().await;
    let mut alice = join(&server, "Alice").await;

    alice.emit("join", json!({ "name": "Alicia" })).await;
    let roster = alice.expect_event("update-user-list").await;
    assert_eq!(roster_names(&roster), vec!["Alicia"]);
    assert!(alice
        .try_next_event(Duration::from_millis(200))
        .await
        .is_none());
    server.wait_for_participants(1).await;
}

//! Integration tests for the record / save / replay flow.
//!
//! Requires the server to be running on localhost:8000 with a database and
//! the default private list scope.

mod common;

use serde_json::{json, Value};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

async fn play(client: &reqwest::Client, token: &str, from: &str, to: &str) -> reqwest::Response {
    common::post(
        client,
        token,
        "/api/session/moves",
        Some(json!({ "from": from, "to": to })),
    )
    .await
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn record_save_and_replay() {
    let client = common::client();
    let (_, token) = common::register_fresh(&client, "rec").await;

    let resp = common::post(&client, &token, "/api/session/recording", None).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["view"], "record");

    for (from, to) in [("e2", "e4"), ("e7", "e5")] {
        assert_eq!(play(&client, &token, from, to).await.status(), 200);
    }

    // Queen blocked by its own pawn
    let resp = play(&client, &token, "d1", "d3").await;
    assert_eq!(resp.status(), 400, "Illegal move should be rejected");

    let resp = play(&client, &token, "g1", "f3").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"]["san"], "Nf3");
    assert_eq!(body["recording"]["moveCount"], 3);

    let resp = common::post(&client, &token, "/api/session/recording/stop", None).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["view"], "list");
    assert_eq!(body["recording"]["unsaved"], true);
    let final_fen = body["recording"]["fen"].as_str().unwrap().to_string();

    // Blank titles are refused and the recording stays saveable
    let resp = common::post(
        &client,
        &token,
        "/api/session/recording/save",
        Some(json!({ "title": "   " })),
    )
    .await;
    assert_eq!(resp.status(), 400);

    let resp = common::post(
        &client,
        &token,
        "/api/session/recording/save",
        Some(json!({ "title": "T" })),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let id = body["id"].as_i64().unwrap();
    assert_eq!(body["games"][0]["title"], "T");

    let resp = common::get(&client, &token, "/api/recordings").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["games"][0]["moveCount"], 3);

    let resp = common::get(&client, &token, &format!("/api/recordings/{id}/position?ply=0")).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["fen"], START_FEN);

    let resp = common::get(&client, &token, &format!("/api/recordings/{id}/position?ply=3")).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["fen"], final_fen);

    let resp = common::get(&client, &token, &format!("/api/recordings/{id}/position?ply=4")).await;
    assert_eq!(resp.status(), 400, "Ply past the end should be rejected");

    let resp = common::get(&client, &token, &format!("/api/recordings/{id}/pgn")).await;
    let pgn = resp.text().await.unwrap();
    assert!(pgn.contains("[Event \"T\"]"));
    assert!(pgn.contains("1. e4 e5 2. Nf3"));

    // Replay screen
    let resp = common::post(&client, &token, &format!("/api/session/replay/{id}"), None).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["view"], "replay");
    assert_eq!(body["replay"]["ply"], 0);
    assert_eq!(body["replay"]["total"], 3);

    let resp = common::post(&client, &token, "/api/session/replay/prev", None).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["replay"]["ply"], 0);

    for _ in 0..5 {
        common::post(&client, &token, "/api/session/replay/next", None).await;
    }
    let resp = common::get(&client, &token, "/api/session").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["replay"]["ply"], 3);
    assert_eq!(body["replay"]["fen"], final_fen);

    let resp = play(&client, &token, "b1", "c3").await;
    assert_eq!(resp.status(), 409, "Moves are refused on the replay screen");

    let resp = common::post(&client, &token, "/api/session/back", None).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["view"], "list");

    let resp = client
        .delete(common::url(&format!("/api/recordings/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let resp = common::get(&client, &token, &format!("/api/recordings/{id}")).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn checkmate_returns_to_list() {
    let client = common::client();
    let (_, token) = common::register_fresh(&client, "mate").await;

    common::post(&client, &token, "/api/session/recording", None).await;
    for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4")] {
        let resp = play(&client, &token, from, to).await;
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["view"], "record");
    }

    let resp = play(&client, &token, "d8", "h4").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"]["status"]["state"], "checkmate");
    assert_eq!(body["outcome"]["status"]["winner"], "black");
    assert_eq!(body["view"], "list");
    assert_eq!(body["recording"]["timer"]["running"], false);
    assert!(body["notices"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n["message"] == "Checkmate!"));
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn other_accounts_games_are_private() {
    let client = common::client();
    let (_, alice) = common::register_fresh(&client, "alice").await;
    let (_, bob) = common::register_fresh(&client, "bob").await;

    common::post(&client, &alice, "/api/session/recording", None).await;
    play(&client, &alice, "e2", "e4").await;
    let resp = common::post(
        &client,
        &alice,
        "/api/session/recording/save",
        Some(json!({ "title": "Mine" })),
    )
    .await;
    let body: Value = resp.json().await.unwrap();
    let id = body["id"].as_i64().unwrap();

    let resp = common::get(&client, &bob, &format!("/api/recordings/{id}")).await;
    assert_eq!(resp.status(), 404);

    let resp = client
        .delete(common::url(&format!("/api/recordings/{id}")))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = common::get(&client, &alice, &format!("/api/recordings/{id}")).await;
    assert_eq!(resp.status(), 200);
}

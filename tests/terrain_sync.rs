mod support;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::time::Duration;
use terrain_server::domain::{QuadBlock, WireNode};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

// 8x4 tiles of 10 px, bottom two rows solid.
fn ground_map() -> Value {
    let mut grid = vec![0u8; 16];
    grid.extend(vec![1u8; 16]);
    json!({
        "playerPositions": [{ "x": 5, "y": 5 }],
        "primitive": { "rowSize": 8, "columnSize": 4, "minTileSize": 10, "grid": grid }
    })
}

async fn create_lobby(map: Value) -> String {
    let base_url = support::ensure_server();
    let lobby_id = format!("sync-{}", uuid::Uuid::new_v4());
    let res = reqwest::Client::new()
        .post(format!("{base_url}/lobbies"))
        .json(&json!({ "lobby_id": lobby_id, "map": map }))
        .send()
        .await
        .expect("create lobby");
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    lobby_id
}

async fn fetch_terrain(lobby_id: &str) -> QuadBlock {
    let base_url = support::ensure_server();
    let res = reqwest::get(format!("{base_url}/lobbies/{lobby_id}/terrain"))
        .await
        .expect("get terrain");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let node: WireNode = res.json().await.expect("terrain json");
    QuadBlock::try_from(&node).expect("well-formed tree")
}

async fn next_json(ws: &mut Ws) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("message in time")
            .expect("stream open")
            .expect("websocket message");
        if msg.is_text() {
            return serde_json::from_str(msg.to_text().expect("text")).expect("server json");
        }
    }
}

async fn next_terrain(ws: &mut Ws) -> (u64, QuadBlock) {
    loop {
        let msg = next_json(ws).await;
        if msg["type"] == "TerrainSync" {
            let tick = msg["data"]["tick"].as_u64().expect("tick");
            let node: WireNode =
                serde_json::from_value(msg["data"]["root"].clone()).expect("root node");
            return (tick, QuadBlock::try_from(&node).expect("well-formed tree"));
        }
    }
}

async fn join(lobby_id: &str) -> Ws {
    let (mut ws, _) = connect_async(support::ws_url(lobby_id))
        .await
        .expect("websocket connect");
    ws.send(Message::text(
        json!({ "type": "Join", "data": { "display_name": "tester" } }).to_string(),
    ))
    .await
    .expect("send join");

    let identity = next_json(&mut ws).await;
    assert_eq!(identity["type"], "Identity");
    assert!(identity["data"]["player_id"].is_string());
    ws
}

#[tokio::test]
async fn test_lobby_serves_the_loaded_map() {
    let lobby_id = create_lobby(ground_map()).await;
    let root = fetch_terrain(&lobby_id).await;

    assert_eq!(root.filled_area(), 80.0 * 20.0);
    assert!(root.is_solid_at(5.0, 35.0));
    assert!(!root.is_solid_at(5.0, 5.0));
}

#[tokio::test]
async fn test_join_receives_full_snapshot() {
    let lobby_id = create_lobby(ground_map()).await;
    let mut ws = join(&lobby_id).await;

    let (_, root) = next_terrain(&mut ws).await;
    assert_eq!(root, fetch_terrain(&lobby_id).await);
}

#[tokio::test]
async fn test_explosion_is_broadcast_to_every_client() {
    let lobby_id = create_lobby(ground_map()).await;
    let mut shooter = join(&lobby_id).await;
    let mut watcher = join(&lobby_id).await;
    let (_, before) = next_terrain(&mut shooter).await;
    let (watcher_tick, _) = next_terrain(&mut watcher).await;

    shooter
        .send(Message::text(
            json!({ "type": "Explode", "data": { "x": 40, "y": 30, "radius": 5 } }).to_string(),
        ))
        .await
        .expect("send explode");

    let (_, after) = next_terrain(&mut shooter).await;
    assert!(after.filled_area() < before.filled_area());
    assert!(!after.is_solid_at(40.0, 30.0));
    assert!(after.is_solid_at(5.0, 35.0));

    let (tick, seen) = next_terrain(&mut watcher).await;
    assert!(tick > watcher_tick);
    assert_eq!(seen, after);

    // The HTTP view follows the latest broadcast.
    assert_eq!(fetch_terrain(&lobby_id).await, after);
}

#[tokio::test]
async fn test_resync_returns_current_terrain() {
    let lobby_id = create_lobby(ground_map()).await;
    let mut ws = join(&lobby_id).await;
    let (first_tick, root) = next_terrain(&mut ws).await;

    ws.send(Message::text(json!({ "type": "Resync" }).to_string()))
        .await
        .expect("send resync");

    let (tick, again) = next_terrain(&mut ws).await;
    assert!(tick > first_tick);
    assert_eq!(again, root);
}

#[tokio::test]
async fn test_unknown_lobby_is_refused() {
    let result = connect_async(support::ws_url("missing-lobby")).await;
    assert!(result.is_err());
}

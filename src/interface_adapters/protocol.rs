// Wire protocol DTOs for the public terrain WebSocket.

use crate::domain::wire::{TerrainSnapshot, WireNode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity for the connection after Join is accepted.
    Identity { player_id: String },
    // Full terrain tree; replaces whatever the client holds.
    TerrainSync(TerrainSyncDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Initial handshake message.
    Join(JoinPayload),
    // Explosion request at a world position.
    Explode(ExplodeDto),
    // Ask for a full snapshot, e.g. after rejecting a malformed one.
    Resync,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPayload {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplodeDto {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainSyncDto {
    pub tick: u64,
    pub root: Arc<WireNode>,
}

impl From<TerrainSnapshot> for TerrainSyncDto {
    fn from(snapshot: TerrainSnapshot) -> Self {
        Self {
            tick: snapshot.tick,
            root: snapshot.root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_messages_use_type_and_data() {
        let join: ClientMessage =
            serde_json::from_value(json!({ "type": "Join", "data": { "display_name": "ann" } }))
                .expect("join");
        assert!(matches!(join, ClientMessage::Join(JoinPayload { display_name }) if display_name == "ann"));

        let explode: ClientMessage =
            serde_json::from_value(json!({ "type": "Explode", "data": { "x": 10, "y": 20 } }))
                .expect("explode");
        assert!(matches!(
            explode,
            ClientMessage::Explode(ExplodeDto { radius: None, .. })
        ));

        let resync: ClientMessage =
            serde_json::from_value(json!({ "type": "Resync" })).expect("resync");
        assert!(matches!(resync, ClientMessage::Resync));
    }

    #[test]
    fn terrain_sync_carries_the_full_tree() {
        let root = WireNode {
            x: 0.0,
            y: 0.0,
            width: 16.0,
            height: 8.0,
            filled: true,
            children: Vec::new(),
        };
        let msg = ServerMessage::TerrainSync(TerrainSyncDto::from(TerrainSnapshot {
            tick: 42,
            root: Arc::new(root),
        }));

        assert_eq!(
            serde_json::to_value(&msg).expect("serialize"),
            json!({
                "type": "TerrainSync",
                "data": {
                    "tick": 42,
                    "root": {
                        "x": 0.0, "y": 0.0, "width": 16.0, "height": 8.0,
                        "filled": true, "children": []
                    }
                }
            })
        );
    }
}

// Use-case level inputs/outputs for the terrain loop.

use crate::domain::wire::TerrainSnapshot;
use axum::extract::ws::Utf8Bytes;

#[derive(Debug, Clone)]
pub enum GameEvent {
    Join { player_id: u64 },
    Leave { player_id: u64 },
    Explode {
        player_id: u64,
        x: f32,
        y: f32,
        radius: f32,
    },
    Resync { player_id: u64 },
}

/// Snapshot produced by the world loop. `target: None` goes to every peer.
#[derive(Debug, Clone)]
pub struct TerrainUpdate {
    pub target: Option<u64>,
    pub snapshot: TerrainSnapshot,
}

/// A `TerrainUpdate` serialized once and shared by every connection.
#[derive(Debug, Clone)]
pub struct TerrainFrame {
    pub target: Option<u64>,
    pub tick: u64,
    pub bytes: Utf8Bytes,
}

impl TerrainFrame {
    pub fn is_for(&self, player_id: u64) -> bool {
        self.target.is_none_or(|target| target == player_id)
    }
}

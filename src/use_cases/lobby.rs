// Lobby orchestration: one terrain world per lobby.

use crate::domain::ports::{PhysicsRegistry, SnapshotChannel};
use crate::domain::wire::{TerrainSnapshot, WireNode};
use crate::domain::TerrainMap;
use crate::use_cases::game::world_task;
use crate::use_cases::terrain::TerrainAuthority;
use crate::use_cases::world::TerrainWorld;
use crate::use_cases::{GameEvent, TerrainFrame, TerrainUpdate};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast, mpsc, watch};
use tracing::info;

/// Shared configuration for spawning lobby worlds.
#[derive(Debug, Clone)]
pub struct LobbySettings {
    /// Capacity for inbound player events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast terrain snapshots.
    pub terrain_broadcast_capacity: usize,
    /// Fixed tick interval for the terrain loop.
    pub tick_interval: Duration,
}

/// Errors returned by lobby registry operations.
#[derive(Debug)]
pub enum LobbyError {
    /// Lobby already exists and cannot be re-created.
    AlreadyExists,
}

/// Per-lobby channels.
#[derive(Debug, Clone)]
pub struct LobbyHandle {
    /// Identifier clients use to target this lobby.
    pub lobby_id: Arc<str>,
    /// Sender for events into the lobby world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    /// Snapshots as produced by the world task.
    pub update_tx: broadcast::Sender<TerrainUpdate>,
    /// Serialized snapshots shared by every connection.
    pub frame_tx: broadcast::Sender<TerrainFrame>,
    /// Latest serialized snapshot for lag recovery.
    pub latest_frame_tx: watch::Sender<Option<TerrainFrame>>,
    /// Latest broadcast tree, read by the HTTP terrain endpoint.
    pub terrain_tx: watch::Sender<Arc<WireNode>>,
}

/// `SnapshotChannel` backed by a lobby's broadcast and watch channels.
#[derive(Debug, Clone)]
pub struct LobbyChannel {
    update_tx: broadcast::Sender<TerrainUpdate>,
    terrain_tx: watch::Sender<Arc<WireNode>>,
}

impl SnapshotChannel for LobbyChannel {
    fn send_to_all(&self, snapshot: TerrainSnapshot) {
        self.terrain_tx.send_replace(snapshot.root.clone());
        // No receivers only means nobody is listening yet.
        let _ = self.update_tx.send(TerrainUpdate {
            target: None,
            snapshot,
        });
    }

    fn send_to(&self, peer: u64, snapshot: TerrainSnapshot) {
        let _ = self.update_tx.send(TerrainUpdate {
            target: Some(peer),
            snapshot,
        });
    }
}

/// Thread-safe registry for active lobbies.
#[derive(Debug)]
pub struct LobbyRegistry {
    /// Global settings applied to newly created lobbies.
    settings: LobbySettings,
    /// Map of lobby id to active handle.
    lobbies: RwLock<HashMap<String, LobbyHandle>>,
}

impl LobbyRegistry {
    /// Creates a new registry with the provided settings.
    pub fn new(settings: LobbySettings) -> Self {
        Self {
            settings,
            lobbies: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a new lobby over `map` and spawns its world task.
    pub async fn create_lobby<P>(
        &self,
        lobby_id: String,
        map: TerrainMap,
        physics: P,
    ) -> Result<LobbyHandle, LobbyError>
    where
        P: PhysicsRegistry + Send + 'static,
        P::Handle: Send,
    {
        let mut lobbies = self.lobbies.write().await;
        if lobbies.contains_key(&lobby_id) {
            return Err(LobbyError::AlreadyExists);
        }

        let authority = TerrainAuthority::new(map, physics);
        let initial = Arc::new(authority.snapshot());
        info!(
            lobby_id = %lobby_id,
            colliders = authority.collider_count(),
            leaves = authority.root().leaf_count(),
            "lobby terrain loaded"
        );

        // Channel wiring for the lobby world loop.
        let (input_tx, input_rx) = mpsc::channel::<GameEvent>(self.settings.input_channel_capacity);
        let (update_tx, _update_rx) =
            broadcast::channel::<TerrainUpdate>(self.settings.terrain_broadcast_capacity);
        let (frame_tx, _frame_rx) =
            broadcast::channel::<TerrainFrame>(self.settings.terrain_broadcast_capacity);
        let (latest_frame_tx, _latest_frame_rx) = watch::channel::<Option<TerrainFrame>>(None);
        let (terrain_tx, _terrain_rx) = watch::channel::<Arc<WireNode>>(initial);

        let channel = LobbyChannel {
            update_tx: update_tx.clone(),
            terrain_tx: terrain_tx.clone(),
        };

        // Spawn the authoritative world loop for this lobby.
        tokio::spawn(world_task(
            input_rx,
            TerrainWorld::new(authority),
            channel,
            self.settings.tick_interval,
        ));

        let lobby = LobbyHandle {
            lobby_id: Arc::from(lobby_id.clone()),
            input_tx,
            update_tx,
            frame_tx,
            latest_frame_tx,
            terrain_tx,
        };

        lobbies.insert(lobby_id, lobby.clone());
        Ok(lobby)
    }

    /// Returns a lobby handle for the provided id, if it exists.
    pub async fn get_lobby(&self, lobby_id: &str) -> Option<LobbyHandle> {
        let lobbies = self.lobbies.read().await;
        lobbies.get(lobby_id).cloned()
    }
}

use crate::domain::tuning::TerrainTuning;
use crate::use_cases::LobbyRegistry;
use std::sync::Arc;

pub struct AppState {
    // Active lobbies and their world tasks.
    pub lobby_registry: Arc<LobbyRegistry>,
    // Lobby joined when the client does not name one.
    pub default_lobby_id: Arc<str>,
    // Gameplay numbers used for new lobbies and explosion requests.
    pub tuning: TerrainTuning,
}

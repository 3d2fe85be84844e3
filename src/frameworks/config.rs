use std::{env, path::PathBuf, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("GAME_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

/// Map document loaded into the default lobby; the placeholder map when unset.
pub fn map_path() -> Option<PathBuf> {
    env::var("TERRAIN_MAP_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

pub fn min_block_size() -> f32 {
    env::var("TERRAIN_MIN_BLOCK_SIZE")
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(8.0)
}

pub fn probe_server_url() -> String {
    env::var("PROBE_SERVER_URL").unwrap_or_else(|_| format!("ws://127.0.0.1:{}/ws", http_port()))
}

pub fn probe_explosions() -> usize {
    env::var("PROBE_EXPLOSIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5)
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const TERRAIN_BROADCAST_CAPACITY: usize = 128;

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);

pub const DEFAULT_LOBBY_ID: &str = "default";

// Framework bootstrap for the terrain server runtime.

use crate::domain::tuning::TerrainTuning;
use crate::domain::TerrainMap;
use crate::frameworks::config;
use crate::interface_adapters::map_file::load_terrain_map;
use crate::interface_adapters::net::{
    create_lobby_handler, spawn_lobby_serializer, terrain_handler, ws_handler,
};
use crate::interface_adapters::physics::StaticBodies;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{LobbyRegistry, LobbySettings};

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

/// Loads `.env`, installs the tracing subscriber and the panic hook.
pub fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/lobbies", post(create_lobby_handler))
        .route("/lobbies/{lobby_id}/terrain", get(terrain_handler))
        .with_state(state)
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state().await?;
    let app = router(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn startup_map(tuning: &TerrainTuning) -> Result<TerrainMap> {
    let Some(path) = config::map_path() else {
        tracing::info!("no TERRAIN_MAP_PATH set; using placeholder terrain");
        return Ok(TerrainMap::placeholder(tuning));
    };

    let map = load_terrain_map(&path, tuning.min_block_size).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to load map");
        std::io::Error::other(format!("failed to load map {}: {e}", path.display()))
    })?;
    tracing::info!(
        path = %path.display(),
        min_block_size = map.min_block_size,
        spawn_points = map.player_positions.len(),
        "map loaded"
    );
    Ok(map)
}

async fn build_state() -> Result<Arc<AppState>> {
    let tuning = TerrainTuning {
        min_block_size: config::min_block_size(),
        ..TerrainTuning::default()
    };

    // Owns the set of active lobby world tasks.
    let lobby_registry = Arc::new(LobbyRegistry::new(LobbySettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        terrain_broadcast_capacity: config::TERRAIN_BROADCAST_CAPACITY,
        tick_interval: config::TICK_INTERVAL,
    }));

    let default_lobby = lobby_registry
        .create_lobby(
            config::DEFAULT_LOBBY_ID.to_string(),
            startup_map(&tuning)?,
            StaticBodies::default(),
        )
        .await
        .map_err(|e| std::io::Error::other(format!("default lobby: {e:?}")))?;
    spawn_lobby_serializer(&default_lobby);

    Ok(Arc::new(AppState {
        lobby_registry,
        default_lobby_id: Arc::from(config::DEFAULT_LOBBY_ID),
        tuning,
    }))
}

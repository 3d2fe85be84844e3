use crate::domain::{MapDocument, TerrainMap};
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::net::client::spawn_lobby_serializer;
use crate::interface_adapters::physics::StaticBodies;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_lobby_id;
use crate::use_cases::LobbyError;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, serde::Deserialize)]
pub struct LobbyInitRequest {
    // Generated when absent.
    #[serde(default)]
    lobby_id: Option<String>,
    // Map document in export format; the placeholder ground band otherwise.
    #[serde(default)]
    map: Option<MapDocument>,
}

#[derive(Debug, serde::Serialize)]
struct LobbyInitResponse {
    // The lobby id that was created.
    lobby_id: String,
}

pub async fn create_lobby_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LobbyInitRequest>,
) -> impl IntoResponse {
    let lobby_id = match payload.lobby_id {
        Some(id) => id.trim().to_string(),
        None => next_lobby_id(),
    };
    if lobby_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("lobby_id must not be blank")),
        )
            .into_response();
    }

    let map = match payload.map {
        Some(doc) => match TerrainMap::from_document(doc, state.tuning.min_block_size) {
            Ok(map) => map,
            Err(e) => {
                warn!(lobby_id = %lobby_id, error = %e, "rejected lobby map");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new(e.to_string())),
                )
                    .into_response();
            }
        },
        None => TerrainMap::placeholder(&state.tuning),
    };

    match state
        .lobby_registry
        .create_lobby(lobby_id.clone(), map, StaticBodies::default())
        .await
    {
        Ok(lobby) => {
            // Serializer first so clients can subscribe immediately.
            spawn_lobby_serializer(&lobby);
            info!(lobby_id = %lobby_id, "lobby created");
            (StatusCode::CREATED, Json(LobbyInitResponse { lobby_id })).into_response()
        }
        Err(LobbyError::AlreadyExists) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("lobby already exists")),
        )
            .into_response(),
    }
}

/// Latest broadcast terrain tree of a lobby.
pub async fn terrain_handler(
    State(state): State<Arc<AppState>>,
    Path(lobby_id): Path<String>,
) -> impl IntoResponse {
    match state.lobby_registry.get_lobby(&lobby_id).await {
        Some(lobby) => {
            let root = lobby.terrain_tx.borrow().clone();
            (StatusCode::OK, Json(root)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("lobby not found")),
        )
            .into_response(),
    }
}

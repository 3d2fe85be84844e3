use crate::domain::tuning::TerrainTuning;
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{
    ClientMessage, ExplodeDto, ServerMessage, TerrainSyncDto,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_id;
use crate::use_cases::{GameEvent, LobbyHandle, TerrainFrame, TerrainUpdate};

use axum::{
    Error, Json,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    TerrainUpdatesClosed,
    JoinRequired,
    JoinTimeout,
    ClosedBeforeJoin,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct LobbyQuery {
    // The lobby id the client wants to join.
    #[serde(default)]
    lobby_id: Option<String>,
}

pub async fn terrain_serializer(
    mut update_rx: broadcast::Receiver<TerrainUpdate>,
    frame_tx: broadcast::Sender<TerrainFrame>,
    latest_frame_tx: watch::Sender<Option<TerrainFrame>>,
) {
    // Serialize each snapshot once and broadcast the shared bytes.
    loop {
        match update_rx.recv().await {
            Ok(update) => {
                let tick = update.snapshot.tick;
                let msg = ServerMessage::TerrainSync(TerrainSyncDto::from(update.snapshot));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize terrain snapshot");
                        continue;
                    }
                };

                let frame = TerrainFrame {
                    target: update.target,
                    tick,
                    bytes: Utf8Bytes::from(txt),
                };
                // Every snapshot is full state, so targeted ones are valid
                // lag recovery material too.
                latest_frame_tx.send_replace(Some(frame.clone()));
                let _ = frame_tx.send(frame);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "terrain serializer lagged; skipping to latest snapshot"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("terrain updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_lobby_serializer(lobby: &LobbyHandle) {
    tokio::spawn(terrain_serializer(
        lobby.update_tx.subscribe(),
        lobby.frame_tx.clone(),
        lobby.latest_frame_tx.clone(),
    ));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<LobbyQuery>,
) -> impl IntoResponse {
    let lobby_id = query
        .lobby_id
        .unwrap_or_else(|| state.default_lobby_id.to_string());

    let lobby = match state.lobby_registry.get_lobby(&lobby_id).await {
        Some(lobby) => lobby,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("lobby not found")),
            )
                .into_response();
        }
    };

    let tuning = state.tuning;
    ws.on_upgrade(move |socket| handle_socket(socket, lobby, tuning))
}

async fn handle_socket(socket: WebSocket, lobby: LobbyHandle, tuning: TerrainTuning) {
    let conn_id = next_id();
    let span = info_span!(
        "conn",
        conn_id,
        lobby_id = %lobby.lobby_id,
        player_id = tracing::field::Empty
    );
    serve_connection(socket, lobby, tuning).instrument(span).await
}

async fn serve_connection(mut socket: WebSocket, lobby: LobbyHandle, tuning: TerrainTuning) {
    let mut ctx = match bootstrap_connection(&mut socket, &lobby, tuning).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "bootstrap failed".into(),
                })))
                .await;
            let _ = socket.close().await;
            return;
        }
    };

    Span::current().record("player_id", ctx.player_id);
    info!(
        player_id = ctx.player_id,
        display_name = %ctx.display_name,
        "client connected"
    );

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    pub player_id: u64,
    pub display_name: String,
    pub tuning: TerrainTuning,
    pub input_tx: mpsc::Sender<GameEvent>,
    pub frame_rx: broadcast::Receiver<TerrainFrame>,
    pub latest_frame_rx: watch::Receiver<Option<TerrainFrame>>,
    // Count lag recovery snapshots sent to this client.
    pub lag_recovery_count: u64,
    // Newest tick forwarded; older frames are skipped.
    pub last_tick: u64,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    pub last_input_full_log: Instant,
    pub last_terrain_lag_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

#[derive(Debug)]
struct JoinHandshake {
    display_name: String,
    bytes_in: u64,
    msgs_in: u64,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    lobby: &LobbyHandle,
    tuning: TerrainTuning,
) -> Result<ConnCtx, NetError> {
    // Subscribe before any await so the snapshot answering Join is not missed.
    let frame_rx = lobby.frame_tx.subscribe();
    let latest_frame_rx = lobby.latest_frame_tx.subscribe();

    let join = match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(socket)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    let player_id = next_id();
    let identity_msg = ServerMessage::Identity {
        player_id: player_id.to_string(),
    };
    send_message(socket, &identity_msg).await?;

    // The world answers Join with a full snapshot addressed to this player.
    lobby
        .input_tx
        .send(GameEvent::Join { player_id })
        .await
        .map_err(|_| NetError::InputClosed)?;

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        display_name: join.display_name,
        tuning,
        input_tx: lobby.input_tx.clone(),
        frame_rx,
        latest_frame_rx,
        lag_recovery_count: 0,
        last_tick: 0,

        msgs_in: join.msgs_in,
        msgs_out: 0,
        bytes_in: join.bytes_in,
        bytes_out: 0,

        invalid_json: 0,

        last_input_full_log: now,
        last_terrain_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_DISPLAY_NAME_LEN: usize = 64;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

async fn read_join_handshake(socket: &mut WebSocket) -> Result<JoinHandshake, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        let message = incoming.map_err(NetError::Ws)?;
        match message {
            Message::Text(text) => {
                let bytes_in = text.len() as u64;
                let payload = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => payload,
                    Ok(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        return Err(NetError::JoinRequired);
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        return Err(NetError::JoinRequired);
                    }
                };

                let display_name: String = payload
                    .display_name
                    .trim()
                    .chars()
                    .take(MAX_DISPLAY_NAME_LEN)
                    .collect();

                return Ok(JoinHandshake {
                    display_name,
                    bytes_in,
                    msgs_in: 1,
                });
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// Rejects non-finite positions; fills in and clamps the radius.
fn sanitize_explosion(dto: ExplodeDto, tuning: &TerrainTuning) -> Option<(f32, f32, f32)> {
    if !dto.x.is_finite() || !dto.y.is_finite() {
        return None;
    }

    let radius = dto.radius.unwrap_or(tuning.explosion_radius);
    if !radius.is_finite() || radius <= 0.0 {
        return None;
    }

    Some((dto.x, dto.y, radius.min(tuning.max_explosion_radius)))
}

fn queue_event(
    player_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
    event: GameEvent,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match input_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            if should_log(last_input_full_log) {
                warn!(player_id, "input channel full; dropping event");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        tuning,
        input_tx,
        frame_rx,
        latest_frame_rx,
        lag_recovery_count,
        last_tick,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_input_full_log,
        last_terrain_lag_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    player_id,
                    tuning,
                    input_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_input_full_log,
                    last_invalid_input_log,
                    close_frame,
                ) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            frame = frame_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if !is_newer_for(&frame, player_id, *last_tick) {
                            false
                        } else {
                            *last_tick = frame.tick;
                            match forward_terrain_bytes(frame.bytes, socket, msgs_out, bytes_out).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_terrain_lag_log) {
                            warn!(missed = n, "terrain updates lagged; sending latest snapshot");
                        }

                        // Snapshots are full state: the newest one replaces
                        // everything that was skipped.
                        let latest = latest_frame_rx.borrow().clone();
                        match lag_recovery_frame(latest, *last_tick) {
                            None => false,
                            Some(latest) => {
                                // Frames still queued behind the lag are older
                                // than this one and get skipped.
                                *last_tick = latest.tick;
                                *lag_recovery_count += 1;
                                let bytes_len = latest.bytes.len();
                                let outcome = forward_terrain_bytes(
                                    latest.bytes,
                                    socket,
                                    msgs_out,
                                    bytes_out,
                                )
                                .await;
                                debug!(
                                    player_id,
                                    bytes = bytes_len,
                                    count = *lag_recovery_count,
                                    "sent lag recovery snapshot"
                                );
                                match outcome {
                                    LoopControl::Continue => false,
                                    LoopControl::Disconnect => true,
                                }
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::TerrainUpdatesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = input_tx
        .send(GameEvent::Leave { player_id })
        .await
        .map_err(|_| NetError::InputClosed)
    {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    debug!(
        player_id,
        msgs_in = *msgs_in,
        msgs_out = *msgs_out,
        bytes_in = *bytes_in,
        bytes_out = *bytes_out,
        invalid_json = *invalid_json,
        lag_recovery_count = *lag_recovery_count,
        "connection stats"
    );
    info!(player_id, "client disconnected");

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: u64,
    tuning: &TerrainTuning,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(_)) => {
                        if should_log(last_invalid_input_log) {
                            warn!(player_id, "duplicate join ignored");
                        }
                        Ok(LoopControl::Continue)
                    }
                    Ok(ClientMessage::Explode(dto)) => {
                        let Some((x, y, radius)) = sanitize_explosion(dto, tuning) else {
                            if should_log(last_invalid_input_log) {
                                warn!(player_id, "invalid explosion values; dropping");
                            }
                            return Ok(LoopControl::Continue);
                        };
                        queue_event(
                            player_id,
                            input_tx,
                            GameEvent::Explode {
                                player_id,
                                x,
                                y,
                                radius,
                            },
                            last_input_full_log,
                        )
                    }
                    Ok(ClientMessage::Resync) => queue_event(
                        player_id,
                        input_tx,
                        GameEvent::Resync { player_id },
                        last_input_full_log,
                    ),
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

// At most one frame per tick reaches a player, so equal ticks are duplicates.
fn is_newer_for(frame: &TerrainFrame, player_id: u64, last_tick: u64) -> bool {
    frame.is_for(player_id) && frame.tick > last_tick
}

// Any newer frame recovers a lagged client, whoever it was addressed to.
fn lag_recovery_frame(latest: Option<TerrainFrame>, last_tick: u64) -> Option<TerrainFrame> {
    latest.filter(|frame| frame.tick > last_tick)
}

async fn forward_terrain_bytes(
    frame: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = frame.len();
    match socket.send(Message::Text(frame)).await.map_err(NetError::Ws) {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send terrain snapshot");
            LoopControl::Disconnect
        }
    }
}

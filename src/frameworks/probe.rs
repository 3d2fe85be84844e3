// Headless terrain client: joins a lobby, mirrors its terrain in a replica
// and fires explosions at solid ground, checking the server's answers.

use crate::domain::tuning::TerrainTuning;
use crate::domain::{Region, TerrainMap};
use crate::interface_adapters::physics::StaticBodies;
use crate::interface_adapters::protocol::{ClientMessage, ExplodeDto, JoinPayload, ServerMessage};
use crate::interface_adapters::render::{HeadlessRenderer, HeadlessTile};
use crate::use_cases::TerrainReplica;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::{fmt, time::Duration};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

type ProbeReplica = TerrainReplica<StaticBodies, HeadlessRenderer, Vec<HeadlessTile>>;

const MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum ProbeError {
    Ws(tungstenite::Error),
    Json(serde_json::Error),
    Closed,
    Timeout,
    UnexpectedMessage,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Ws(e) => write!(f, "websocket error: {e}"),
            ProbeError::Json(e) => write!(f, "invalid server message: {e}"),
            ProbeError::Closed => write!(f, "server closed the connection"),
            ProbeError::Timeout => write!(f, "timed out waiting for the server"),
            ProbeError::UnexpectedMessage => write!(f, "unexpected server message"),
        }
    }
}

impl std::error::Error for ProbeError {}

impl From<tungstenite::Error> for ProbeError {
    fn from(e: tungstenite::Error) -> Self {
        ProbeError::Ws(e)
    }
}

#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub player_id: String,
    pub snapshots: u64,
    pub explosions: usize,
    pub filled_area_before: f32,
    pub filled_area_after: f32,
    pub colliders: usize,
    pub tiles: usize,
    pub tiles_allocated: usize,
    pub min_block_size: f32,
}

/// `map_block_size` is the served map's tile size when known; predictions
/// otherwise carve at `tuning.min_block_size`.
pub async fn run_probe(
    url: &str,
    explosions: usize,
    tuning: TerrainTuning,
    map_block_size: Option<f32>,
) -> Result<ProbeReport, ProbeError> {
    let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
    info!(url, "probe connected");
    let (mut sink, mut stream) = ws.split();

    send(
        &mut sink,
        &ClientMessage::Join(JoinPayload {
            display_name: "probe".to_string(),
        }),
    )
    .await?;

    let player_id = match next_message(&mut stream).await? {
        ServerMessage::Identity { player_id } => player_id,
        ServerMessage::TerrainSync(_) => return Err(ProbeError::UnexpectedMessage),
    };

    let mut replica: ProbeReplica = TerrainReplica::new(
        TerrainMap::placeholder(&tuning),
        tuning.texture_size,
        StaticBodies::default(),
        HeadlessRenderer::default(),
        Vec::new(),
    );
    if let Some(size) = map_block_size {
        if let Err(e) = replica.set_min_block_size(size) {
            warn!(size, error = %e, "ignoring map block size");
        }
    }
    let mut last_tick = sync_once(&mut stream, &mut sink, &mut replica, 0).await?;
    let filled_area_before = replica.root().filled_area();

    let mut fired = 0;
    for i in 0..explosions {
        let Some(target) = pick_target(&replica.root().filled_regions(), i) else {
            warn!("no solid terrain left to hit");
            break;
        };
        let (x, y) = (target.x + target.width / 2.0, target.y + target.height / 2.0);

        replica.predict_explosion(x, y, tuning.explosion_radius);
        send(
            &mut sink,
            &ClientMessage::Explode(ExplodeDto { x, y, radius: None }),
        )
        .await?;
        fired += 1;

        last_tick = sync_once(&mut stream, &mut sink, &mut replica, last_tick).await?;
        debug!(
            x,
            y,
            tick = last_tick,
            filled_area = replica.root().filled_area(),
            colliders = replica.collider_count(),
            "explosion confirmed"
        );
    }

    let _ = sink.close().await;

    Ok(ProbeReport {
        player_id,
        snapshots: replica.snapshots_applied(),
        explosions: fired,
        filled_area_before,
        filled_area_after: replica.root().filled_area(),
        colliders: replica.collider_count(),
        tiles: replica.tile_count(),
        tiles_allocated: replica.renderer().allocated(),
        min_block_size: replica.min_block_size(),
    })
}

// Spreads successive shots over the solid leaves.
fn pick_target(solid: &[Region], shot: usize) -> Option<Region> {
    if solid.is_empty() {
        return None;
    }
    let stride = (solid.len() / 7).max(1);
    solid.get((shot * stride) % solid.len()).copied()
}

// Applies snapshots until one newer than `after` is accepted. A rejected
// snapshot triggers a resync request.
async fn sync_once<Si, St>(
    stream: &mut St,
    sink: &mut Si,
    replica: &mut ProbeReplica,
    after: u64,
) -> Result<u64, ProbeError>
where
    Si: Sink<Message, Error = tungstenite::Error> + Unpin,
    St: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let ServerMessage::TerrainSync(sync) = next_message(stream).await? else {
            continue;
        };
        if sync.tick <= after {
            continue;
        }

        if replica.on_terrain_updated(&sync.root).is_err() && replica.take_resync_request() {
            send(sink, &ClientMessage::Resync).await?;
            continue;
        }
        return Ok(sync.tick);
    }
}

async fn send<Si>(sink: &mut Si, msg: &ClientMessage) -> Result<(), ProbeError>
where
    Si: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let txt = serde_json::to_string(msg).map_err(ProbeError::Json)?;
    sink.send(Message::text(txt)).await?;
    Ok(())
}

async fn next_message<St>(stream: &mut St) -> Result<ServerMessage, ProbeError>
where
    St: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let incoming = timeout(MESSAGE_TIMEOUT, stream.next())
            .await
            .map_err(|_| ProbeError::Timeout)?;
        match incoming {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(text.as_str()).map_err(ProbeError::Json);
            }
            Some(Ok(Message::Close(_))) | None => return Err(ProbeError::Closed),
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(ProbeError::Ws(e)),
        }
    }
}

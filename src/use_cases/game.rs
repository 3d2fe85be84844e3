use super::lobby::LobbyChannel;
use super::types::GameEvent;
use super::world::TerrainWorld;
use crate::domain::ports::PhysicsRegistry;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Fixed-step loop that exclusively owns one lobby's terrain.
///
/// Every tick drains the queued events in arrival order, then publishes at
/// most one snapshot. Connections only ever talk to it through `input_rx`.
pub async fn world_task<P>(
    mut input_rx: mpsc::Receiver<GameEvent>,
    mut world: TerrainWorld<P>,
    channel: LobbyChannel,
    tick_interval: Duration,
) where
    P: PhysicsRegistry + Send + 'static,
    P::Handle: Send,
{
    let mut tick: u64 = 0;
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        tick += 1;

        while let Ok(ev) = input_rx.try_recv() {
            world.handle_event(ev);
        }

        world.flush(tick, &channel);

        if input_rx.is_closed() && input_rx.is_empty() {
            info!(tick, "input channel closed; world task exiting");
            break;
        }
    }
}

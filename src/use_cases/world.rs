// Per-lobby terrain state driven by the tick loop.

use crate::domain::ports::{PhysicsRegistry, SnapshotChannel};
use crate::domain::wire::TerrainSnapshot;
use crate::domain::TerrainError;
use crate::use_cases::terrain::TerrainAuthority;
use crate::use_cases::types::GameEvent;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct TerrainWorld<P: PhysicsRegistry> {
    authority: TerrainAuthority<P>,
    players: HashSet<u64>,
    // Peers owed a full snapshot at the next flush.
    pending: BTreeSet<u64>,
    dirty: bool,
    explosions: u64,
}

impl<P: PhysicsRegistry> TerrainWorld<P> {
    pub fn new(authority: TerrainAuthority<P>) -> Self {
        Self {
            authority,
            players: HashSet::new(),
            pending: BTreeSet::new(),
            dirty: false,
            explosions: 0,
        }
    }

    pub fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Join { player_id } => {
                info!(player_id, "player joined");
                self.players.insert(player_id);
                self.pending.insert(player_id);
            }
            GameEvent::Leave { player_id } => {
                info!(player_id, "player left");
                self.players.remove(&player_id);
                self.pending.remove(&player_id);
            }
            GameEvent::Explode {
                player_id,
                x,
                y,
                radius,
            } => match self.authority.explode(x, y, radius) {
                Ok(report) => {
                    self.explosions += 1;
                    if report.changed {
                        self.dirty = true;
                    }
                    debug!(
                        player_id,
                        x,
                        y,
                        radius,
                        changed = report.changed,
                        colliders = report.colliders,
                        leaves = report.leaves,
                        "explosion applied"
                    );
                }
                Err(TerrainError::DegenerateGeometry) => {
                    warn!(player_id, x, y, radius, "degenerate explosion ignored");
                }
                Err(e) => {
                    warn!(player_id, error = %e, "explosion rejected");
                }
            },
            GameEvent::Resync { player_id } => {
                if self.players.contains(&player_id) {
                    debug!(player_id, "resync requested");
                    self.pending.insert(player_id);
                }
            }
        }
    }

    /// Publishes at most one broadcast per tick. Peers owed a snapshot are
    /// covered by the broadcast when one goes out.
    pub fn flush<C: SnapshotChannel>(&mut self, tick: u64, channel: &C) -> usize {
        if !self.dirty && self.pending.is_empty() {
            return 0;
        }

        let snapshot = TerrainSnapshot {
            tick,
            root: Arc::new(self.authority.snapshot()),
        };

        if std::mem::take(&mut self.dirty) {
            self.pending.clear();
            channel.send_to_all(snapshot);
            return 1;
        }

        let peers = std::mem::take(&mut self.pending);
        for &peer in &peers {
            channel.send_to(peer, snapshot.clone());
        }
        peers.len()
    }

    pub fn authority(&self) -> &TerrainAuthority<P> {
        &self.authority
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn explosions(&self) -> u64 {
        self.explosions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QuadBlock, Region, TerrainMap};
    use crate::use_cases::test_support::{RecordingChannel, RecordingPhysics};

    fn world() -> TerrainWorld<RecordingPhysics> {
        let map = TerrainMap {
            root: QuadBlock::solid(Region::new(0.0, 0.0, 400.0, 200.0)),
            min_block_size: 8.0,
            player_positions: Vec::new(),
        };
        TerrainWorld::new(TerrainAuthority::new(map, RecordingPhysics::default()))
    }

    fn explode(player_id: u64, x: f32, y: f32) -> GameEvent {
        GameEvent::Explode {
            player_id,
            x,
            y,
            radius: 30.0,
        }
    }

    #[test]
    fn idle_world_sends_nothing() {
        let mut world = world();
        let channel = RecordingChannel::default();
        assert_eq!(world.flush(1, &channel), 0);
        assert!(channel.take().is_empty());
    }

    #[test]
    fn joining_peer_receives_the_current_tree() {
        let mut world = world();
        let channel = RecordingChannel::default();
        world.handle_event(GameEvent::Join { player_id: 7 });

        assert_eq!(world.flush(3, &channel), 1);
        let sent = channel.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, Some(7));
        assert_eq!(sent[0].1.tick, 3);
        assert_eq!(*sent[0].1.root, world.authority().snapshot());

        assert_eq!(world.flush(4, &channel), 0);
    }

    #[test]
    fn explosions_in_one_tick_produce_one_broadcast() {
        let mut world = world();
        let channel = RecordingChannel::default();
        world.handle_event(GameEvent::Join { player_id: 1 });
        world.handle_event(explode(1, 50.0, 50.0));
        world.handle_event(explode(1, 300.0, 150.0));

        assert_eq!(world.flush(10, &channel), 1);
        let sent = channel.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, None);

        let root = QuadBlock::from_wire(&sent[0].1.root);
        assert!(!root.is_solid_at(50.0, 50.0));
        assert!(!root.is_solid_at(300.0, 150.0));
        assert_eq!(world.explosions(), 2);
    }

    #[test]
    fn missed_explosion_does_not_broadcast() {
        let mut world = world();
        let channel = RecordingChannel::default();
        world.handle_event(explode(1, -100.0, -100.0));
        assert_eq!(world.flush(1, &channel), 0);
    }

    #[test]
    fn degenerate_explosion_is_absorbed() {
        let mut world = world();
        let channel = RecordingChannel::default();
        world.handle_event(GameEvent::Explode {
            player_id: 1,
            x: f32::INFINITY,
            y: 0.0,
            radius: 10.0,
        });
        assert_eq!(world.flush(1, &channel), 0);
        assert_eq!(world.explosions(), 0);
    }

    #[test]
    fn resync_is_honoured_only_for_joined_players() {
        let mut world = world();
        let channel = RecordingChannel::default();

        world.handle_event(GameEvent::Resync { player_id: 9 });
        assert_eq!(world.flush(1, &channel), 0);

        world.handle_event(GameEvent::Join { player_id: 9 });
        world.flush(2, &channel);
        channel.take();

        world.handle_event(GameEvent::Resync { player_id: 9 });
        assert_eq!(world.flush(3, &channel), 1);
        assert_eq!(channel.take()[0].0, Some(9));
    }

    #[test]
    fn leaving_player_is_dropped() {
        let mut world = world();
        let channel = RecordingChannel::default();
        world.handle_event(GameEvent::Join { player_id: 4 });
        world.handle_event(GameEvent::Leave { player_id: 4 });

        assert_eq!(world.player_count(), 0);
        assert_eq!(world.flush(1, &channel), 0);
    }
}

// In-memory fakes for the terrain ports, used by unit tests.

use crate::domain::ports::{PhysicsRegistry, SnapshotChannel, TerrainRenderer, TileOffset};
use crate::domain::wire::TerrainSnapshot;
use crate::domain::Region;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Physics fake that remembers every live body and how many were removed.
#[derive(Debug, Default)]
pub struct RecordingPhysics {
    next_handle: u64,
    live: BTreeMap<u64, Region>,
    removed: usize,
}

impl RecordingPhysics {
    /// Live bodies in insertion order.
    pub fn live_rectangles(&self) -> Vec<Region> {
        self.live.values().copied().collect()
    }

    pub fn removed(&self) -> usize {
        self.removed
    }

    pub fn is_solid_at(&self, x: f32, y: f32) -> bool {
        self.live.values().any(|r| r.contains_point(x, y))
    }
}

impl PhysicsRegistry for RecordingPhysics {
    type Handle = u64;

    fn add_static_rectangle(&mut self, region: Region) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.live.insert(handle, region);
        handle
    }

    fn remove(&mut self, handle: u64) {
        assert!(self.live.remove(&handle).is_some(), "handle {handle} removed twice");
        self.removed += 1;
    }
}

#[derive(Debug)]
struct DrawnTile {
    region: Region,
    offset: TileOffset,
    visible: bool,
}

/// Renderer fake; tiles are indices into its own table.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    tiles: Vec<DrawnTile>,
}

impl RecordingRenderer {
    /// Tiles ever allocated, recycled ones excluded.
    pub fn created(&self) -> usize {
        self.tiles.len()
    }

    pub fn visible(&self) -> Vec<(Region, TileOffset)> {
        self.tiles
            .iter()
            .filter(|t| t.visible)
            .map(|t| (t.region, t.offset))
            .collect()
    }
}

impl TerrainRenderer for RecordingRenderer {
    type Tile = u32;

    fn draw_solid_region(
        &mut self,
        recycled: Option<u32>,
        region: Region,
        tile_offset: TileOffset,
    ) -> u32 {
        let drawn = DrawnTile {
            region,
            offset: tile_offset,
            visible: true,
        };
        match recycled {
            Some(id) => {
                self.tiles[id as usize] = drawn;
                id
            }
            None => {
                self.tiles.push(drawn);
                (self.tiles.len() - 1) as u32
            }
        }
    }

    fn hide(&mut self, tile: &mut u32) {
        self.tiles[*tile as usize].visible = false;
    }
}

/// Channel fake recording `(target, snapshot)` pairs; `None` means everyone.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<(Option<u64>, TerrainSnapshot)>>,
}

impl RecordingChannel {
    pub fn take(&self) -> Vec<(Option<u64>, TerrainSnapshot)> {
        std::mem::take(&mut *self.sent.lock().expect("channel lock"))
    }
}

impl SnapshotChannel for RecordingChannel {
    fn send_to_all(&self, snapshot: TerrainSnapshot) {
        self.sent.lock().expect("channel lock").push((None, snapshot));
    }

    fn send_to(&self, peer: u64, snapshot: TerrainSnapshot) {
        self.sent
            .lock()
            .expect("channel lock")
            .push((Some(peer), snapshot));
    }
}

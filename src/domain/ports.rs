// Ports for the collaborators the terrain engine drives: physics, rendering,
// tile pooling and snapshot delivery.

use crate::domain::region::Region;
use crate::domain::wire::TerrainSnapshot;

// Static collision geometry. Handles are opaque and only ever removed once.
pub trait PhysicsRegistry {
    type Handle;

    fn add_static_rectangle(&mut self, region: Region) -> Self::Handle;
    fn remove(&mut self, handle: Self::Handle);
}

/// Texture scroll applied to a drawn region so adjacent tiles line up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileOffset {
    pub x: f32,
    pub y: f32,
}

impl TileOffset {
    pub fn for_region(region: &Region, texture_size: f32) -> Self {
        Self {
            x: region.x.rem_euclid(texture_size),
            y: region.y.rem_euclid(texture_size),
        }
    }
}

// Presentation of solid terrain. `recycled` is a tile handed back by the pool;
// the renderer repositions it instead of allocating a new one.
pub trait TerrainRenderer {
    type Tile;

    fn draw_solid_region(
        &mut self,
        recycled: Option<Self::Tile>,
        region: Region,
        tile_offset: TileOffset,
    ) -> Self::Tile;
    fn hide(&mut self, tile: &mut Self::Tile);
}

// Pool of hidden tiles reused across redraws.
pub trait TilePool<T> {
    fn acquire(&mut self) -> Option<T>;
    fn release(&mut self, tile: T);
}

impl<T> TilePool<T> for Vec<T> {
    fn acquire(&mut self) -> Option<T> {
        self.pop()
    }

    fn release(&mut self, tile: T) {
        self.push(tile);
    }
}

// Delivery of full terrain snapshots to connected peers.
pub trait SnapshotChannel {
    fn send_to_all(&self, snapshot: TerrainSnapshot);
    fn send_to(&self, peer: u64, snapshot: TerrainSnapshot);
}

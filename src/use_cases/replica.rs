// Client-side copy of the terrain. Replaced wholesale by every snapshot.

use crate::domain::ports::{PhysicsRegistry, TerrainRenderer, TileOffset, TilePool};
use crate::domain::primitive_map::check_tile_size;
use crate::domain::{QuadBlock, TerrainError, TerrainMap, WireNode};
use crate::use_cases::colliders::ColliderSet;
use tracing::{debug, warn};

pub struct TerrainReplica<P, R, T>
where
    P: PhysicsRegistry,
    R: TerrainRenderer,
    T: TilePool<R::Tile>,
{
    root: QuadBlock,
    min_block_size: f32,
    texture_size: f32,
    physics: P,
    colliders: ColliderSet<P::Handle>,
    renderer: R,
    pool: T,
    tiles: Vec<R::Tile>,
    resync_requested: bool,
    snapshots_applied: u64,
}

impl<P, R, T> TerrainReplica<P, R, T>
where
    P: PhysicsRegistry,
    R: TerrainRenderer,
    T: TilePool<R::Tile>,
{
    /// Starts from a local placeholder until the first snapshot arrives.
    pub fn new(placeholder: TerrainMap, texture_size: f32, physics: P, renderer: R, pool: T) -> Self {
        let mut replica = Self {
            root: placeholder.root,
            min_block_size: placeholder.min_block_size,
            texture_size,
            physics,
            colliders: ColliderSet::default(),
            renderer,
            pool,
            tiles: Vec::new(),
            resync_requested: false,
            snapshots_applied: 0,
        };
        replica.redraw();
        replica
    }

    /// Applies an authoritative snapshot.
    ///
    /// A malformed tree is rejected: the current terrain stays in place and a
    /// resync is requested instead of attempting a repair.
    pub fn on_terrain_updated(&mut self, node: &WireNode) -> Result<(), TerrainError> {
        let root = match QuadBlock::try_from(node) {
            Ok(root) => root,
            Err(e) => {
                warn!(error = %e, "rejected terrain snapshot; requesting resync");
                self.resync_requested = true;
                return Err(e);
            }
        };

        self.root = root;
        self.resync_requested = false;
        self.snapshots_applied += 1;
        self.redraw();
        Ok(())
    }

    /// Local carve ahead of the server; the next snapshot overwrites it.
    pub fn predict_explosion(&mut self, cx: f32, cy: f32, radius: f32) -> bool {
        if !self.root.destroy(cx, cy, radius, self.min_block_size) {
            return false;
        }
        self.root.cleanup();
        self.redraw();
        true
    }

    /// Carve granularity for predicted explosions. Must match the authority's
    /// map, which can differ from the placeholder's.
    pub fn set_min_block_size(&mut self, size: f32) -> Result<(), TerrainError> {
        check_tile_size(size)?;
        self.min_block_size = size;
        Ok(())
    }

    pub fn min_block_size(&self) -> f32 {
        self.min_block_size
    }

    /// Returns true once per pending resync request.
    pub fn take_resync_request(&mut self) -> bool {
        std::mem::take(&mut self.resync_requested)
    }

    pub fn root(&self) -> &QuadBlock {
        &self.root
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn pool(&self) -> &T {
        &self.pool
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn snapshots_applied(&self) -> u64 {
        self.snapshots_applied
    }

    // Tiles go back to the pool hidden, then every solid leaf is drawn again,
    // then colliders are swapped. Nothing reads the terrain in between.
    fn redraw(&mut self) {
        for mut tile in self.tiles.drain(..) {
            self.renderer.hide(&mut tile);
            self.pool.release(tile);
        }

        for region in self.root.filled_regions() {
            let offset = TileOffset::for_region(&region, self.texture_size);
            let recycled = self.pool.acquire();
            let tile = self.renderer.draw_solid_region(recycled, region, offset);
            self.tiles.push(tile);
        }

        let colliders = self.colliders.rebuild(&mut self.physics, &self.root);
        debug!(tiles = self.tiles.len(), colliders, "terrain redrawn");
    }
}

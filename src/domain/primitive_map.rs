// Dense tile bitmap used for map authoring, convertible to and from the quadtree.

use super::errors::TerrainError;
use super::quad_block::QuadBlock;
use super::region::Region;
use super::split::plan_split;
use super::wire::{MapDocument, Position, PrimitiveDocument, WireNode};

/// Smallest tile edge a map may declare, in world units.
pub const MIN_TILE_SIZE: f32 = 1.0;

/// Upper bound on `row_size * column_size`.
pub const MAX_MAP_TILES: usize = 1 << 22;

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveMap {
    row_size: usize,
    column_size: usize,
    min_tile_size: f32,
    grid: Vec<u8>,
    player_positions: Vec<Position>,
}

impl PrimitiveMap {
    pub fn new(
        grid: Vec<u8>,
        row_size: usize,
        column_size: usize,
        min_tile_size: f32,
        player_positions: Vec<Position>,
    ) -> Result<Self, TerrainError> {
        let tiles = tile_count(row_size, column_size)?;
        check_tile_size(min_tile_size)?;
        if grid.len() != tiles {
            return Err(TerrainError::InvalidMap("grid length does not match its size"));
        }
        if grid.iter().any(|&cell| cell > 1) {
            return Err(TerrainError::InvalidMap("grid cells must be 0 or 1"));
        }

        Ok(Self {
            row_size,
            column_size,
            min_tile_size,
            grid,
            player_positions,
        })
    }

    /// All-air map covering `width` x `height` world units.
    pub fn create_empty(width: f32, height: f32, min_tile_size: f32) -> Result<Self, TerrainError> {
        check_tile_size(min_tile_size)?;
        let row_size = (width / min_tile_size).floor().max(0.0) as usize;
        let column_size = (height / min_tile_size).floor().max(0.0) as usize;
        let tiles = tile_count(row_size, column_size)?;

        Self::new(
            vec![0; tiles],
            row_size,
            column_size,
            min_tile_size,
            Vec::new(),
        )
    }

    /// Empty sky over `ground_rows` solid rows at the bottom of the map.
    pub fn with_ground(
        width: f32,
        height: f32,
        min_tile_size: f32,
        ground_rows: usize,
    ) -> Result<Self, TerrainError> {
        let mut map = Self::create_empty(width, height, min_tile_size)?;
        let first_row = map.column_size.saturating_sub(ground_rows);
        for row in first_row..map.column_size {
            let start = row * map.row_size;
            map.grid[start..start + map.row_size].fill(1);
        }
        Ok(map)
    }

    pub fn row_size(&self) -> usize {
        self.row_size
    }

    pub fn column_size(&self) -> usize {
        self.column_size
    }

    pub fn min_tile_size(&self) -> f32 {
        self.min_tile_size
    }

    pub fn grid(&self) -> &[u8] {
        &self.grid
    }

    pub fn player_positions(&self) -> &[Position] {
        &self.player_positions
    }

    pub fn width(&self) -> f32 {
        self.row_size as f32 * self.min_tile_size
    }

    pub fn height(&self) -> f32 {
        self.column_size as f32 * self.min_tile_size
    }

    /// Grid index of the tile under a world position, if it lies on the map.
    pub fn index(&self, x: f32, y: f32) -> Option<usize> {
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        let tile_x = (x / self.min_tile_size).floor() as usize;
        let tile_y = (y / self.min_tile_size).floor() as usize;
        if tile_x >= self.row_size || tile_y >= self.column_size {
            return None;
        }
        Some(tile_x + tile_y * self.row_size)
    }

    pub fn add(&mut self, x: f32, y: f32) {
        if let Some(index) = self.index(x, y) {
            self.grid[index] = 1;
        }
    }

    pub fn remove(&mut self, x: f32, y: f32) {
        if let Some(index) = self.index(x, y) {
            self.grid[index] = 0;
        }
    }

    pub fn is_filled(&self, x: f32, y: f32) -> bool {
        self.index(x, y).is_some_and(|index| self.grid[index] == 1)
    }

    pub fn add_player_position(&mut self, x: f32, y: f32) {
        self.player_positions.push(Position { x, y });
    }

    pub fn remove_player_position(&mut self, x: f32, y: f32) {
        self.player_positions.retain(|p| p.x != x || p.y != y);
    }

    /// Builds the pruned quadtree for the whole map.
    pub fn to_quad_block(&self) -> QuadBlock {
        let counts = FillCounts::new(self);
        let mut root = build_quad_block(self, &counts, 0, 0, self.row_size, self.column_size);
        root.cleanup();
        root
    }

    /// Rasterizes a tree: a tile is solid when its centre is solid.
    pub fn from_quad_block(root: &QuadBlock, min_tile_size: f32) -> Result<Self, TerrainError> {
        let region = root.region();
        let mut map = Self::create_empty(region.width, region.height, min_tile_size)?;

        for tile_y in 0..map.column_size {
            for tile_x in 0..map.row_size {
                let cx = region.x + (tile_x as f32 + 0.5) * min_tile_size;
                let cy = region.y + (tile_y as f32 + 0.5) * min_tile_size;
                if root.is_solid_at(cx, cy) {
                    map.grid[tile_x + tile_y * map.row_size] = 1;
                }
            }
        }

        Ok(map)
    }

    pub fn from_document(doc: PrimitiveDocument) -> Result<Self, TerrainError> {
        Self::new(
            doc.grid,
            doc.row_size,
            doc.column_size,
            doc.min_tile_size,
            doc.player_positions,
        )
    }

    /// Primitive-only form, as the editor saves it.
    pub fn to_primitive_document(&self) -> PrimitiveDocument {
        PrimitiveDocument {
            row_size: self.row_size,
            column_size: self.column_size,
            min_tile_size: self.min_tile_size,
            grid: self.grid.clone(),
            player_positions: Vec::new(),
        }
    }

    /// Full export: spawn points, quadtree and the bitmap it was built from.
    pub fn to_document(&self) -> MapDocument {
        MapDocument {
            player_positions: self.player_positions.clone(),
            quad_tree: Some(WireNode::from(&self.to_quad_block())),
            primitive: Some(self.to_primitive_document()),
        }
    }

    fn tile_region(&self, tile_x: usize, tile_y: usize, tiles_w: usize, tiles_h: usize) -> Region {
        let s = self.min_tile_size;
        Region::new(
            tile_x as f32 * s,
            tile_y as f32 * s,
            tiles_w as f32 * s,
            tiles_h as f32 * s,
        )
    }
}

/// Summed-area table over the grid so any tile range's solid count is O(1).
struct FillCounts {
    stride: usize,
    sums: Vec<u32>,
}

impl FillCounts {
    fn new(map: &PrimitiveMap) -> Self {
        let stride = map.row_size + 1;
        let mut sums = vec![0u32; stride * (map.column_size + 1)];
        for y in 0..map.column_size {
            for x in 0..map.row_size {
                let cell = u32::from(map.grid[x + y * map.row_size]);
                sums[(x + 1) + (y + 1) * stride] = cell + sums[x + (y + 1) * stride]
                    + sums[(x + 1) + y * stride]
                    - sums[x + y * stride];
            }
        }
        Self { stride, sums }
    }

    fn filled(&self, tile_x: usize, tile_y: usize, tiles_w: usize, tiles_h: usize) -> u32 {
        let (x0, y0) = (tile_x, tile_y);
        let (x1, y1) = (tile_x + tiles_w, tile_y + tiles_h);
        let at = |x: usize, y: usize| self.sums[x + y * self.stride];
        at(x1, y1) + at(x0, y0) - at(x0, y1) - at(x1, y0)
    }
}

/// Recursive grid-to-tree builder. Uniform ranges become a single leaf; mixed
/// ranges are split with the same policy as destructive subdivision, in tiles.
fn build_quad_block(
    map: &PrimitiveMap,
    counts: &FillCounts,
    tile_x: usize,
    tile_y: usize,
    tiles_w: usize,
    tiles_h: usize,
) -> QuadBlock {
    let region = map.tile_region(tile_x, tile_y, tiles_w, tiles_h);
    let filled = counts.filled(tile_x, tile_y, tiles_w, tiles_h) as usize;

    if filled == tiles_w * tiles_h {
        return QuadBlock::solid(region);
    }
    if filled == 0 {
        return QuadBlock::air(region);
    }

    // Mixed ranges always span more than one tile, so a split exists.
    let Some(split) = plan_split(tiles_w as f32, tiles_h as f32, 1.0) else {
        return QuadBlock::air(region);
    };

    let tile_range = Region::new(
        tile_x as f32,
        tile_y as f32,
        tiles_w as f32,
        tiles_h as f32,
    );
    let children = split
        .regions(tile_range)
        .into_iter()
        .map(|r| {
            build_quad_block(
                map,
                counts,
                r.x as usize,
                r.y as usize,
                r.width as usize,
                r.height as usize,
            )
        })
        .collect();

    QuadBlock::internal(region, children)
}

fn tile_count(row_size: usize, column_size: usize) -> Result<usize, TerrainError> {
    if row_size == 0 || column_size == 0 {
        return Err(TerrainError::InvalidMap("map has no tiles"));
    }
    row_size
        .checked_mul(column_size)
        .filter(|&tiles| tiles <= MAX_MAP_TILES)
        .ok_or(TerrainError::InvalidMap("map dimensions too large"))
}

pub(crate) fn check_tile_size(min_tile_size: f32) -> Result<(), TerrainError> {
    if !min_tile_size.is_finite() || min_tile_size < MIN_TILE_SIZE {
        return Err(TerrainError::InvalidMap("tile size below the 1 unit floor"));
    }
    Ok(())
}

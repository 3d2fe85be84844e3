// Renderer for processes without a screen. Keeps the drawn tile layout so it
// can be inspected and logged.

use crate::domain::ports::{TerrainRenderer, TileOffset};
use crate::domain::Region;

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessTile {
    pub region: Region,
    pub offset: TileOffset,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    allocated: usize,
    draws: u64,
}

impl HeadlessRenderer {
    /// Tiles allocated fresh; recycled tiles do not count.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl TerrainRenderer for HeadlessRenderer {
    type Tile = HeadlessTile;

    fn draw_solid_region(
        &mut self,
        recycled: Option<HeadlessTile>,
        region: Region,
        tile_offset: TileOffset,
    ) -> HeadlessTile {
        self.draws += 1;
        let mut tile = recycled.unwrap_or_else(|| {
            self.allocated += 1;
            HeadlessTile {
                region,
                offset: tile_offset,
                visible: false,
            }
        });
        tile.region = region;
        tile.offset = tile_offset;
        tile.visible = true;
        tile
    }

    fn hide(&mut self, tile: &mut HeadlessTile) {
        tile.visible = false;
    }
}

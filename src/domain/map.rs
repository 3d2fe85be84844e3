// A playable terrain as loaded at session start.

use super::errors::TerrainError;
use super::primitive_map::{check_tile_size, PrimitiveMap};
use super::quad_block::QuadBlock;
use super::region::Region;
use super::tuning::TerrainTuning;
use super::wire::{MapDocument, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMap {
    pub root: QuadBlock,
    pub min_block_size: f32,
    pub player_positions: Vec<Position>,
}

impl TerrainMap {
    /// Prefers the document's quadtree; falls back to converting its bitmap.
    /// `default_min_block_size` applies when the document carries no tile size.
    pub fn from_document(
        doc: MapDocument,
        default_min_block_size: f32,
    ) -> Result<Self, TerrainError> {
        let MapDocument {
            player_positions,
            quad_tree,
            primitive,
        } = doc;

        match (quad_tree, primitive) {
            (Some(tree), primitive) => {
                let root = QuadBlock::try_from(&tree).map_err(|_| {
                    TerrainError::InvalidMap("quadTree is not a well-formed terrain tree")
                })?;
                let min_block_size = primitive
                    .map(|p| p.min_tile_size)
                    .unwrap_or(default_min_block_size);
                check_tile_size(min_block_size)?;
                Ok(Self {
                    root,
                    min_block_size,
                    player_positions,
                })
            }
            (None, Some(primitive)) => {
                let map = PrimitiveMap::from_document(primitive)?;
                let mut terrain = Self::from_primitive(&map);
                if !player_positions.is_empty() {
                    terrain.player_positions = player_positions;
                }
                Ok(terrain)
            }
            (None, None) => Err(TerrainError::InvalidMap(
                "document has neither quadTree nor primitive",
            )),
        }
    }

    pub fn from_primitive(map: &PrimitiveMap) -> Self {
        Self {
            root: map.to_quad_block(),
            min_block_size: map.min_tile_size(),
            player_positions: map.player_positions().to_vec(),
        }
    }

    /// Flat ground band along the bottom of the map, used until a real map loads.
    pub fn placeholder(tuning: &TerrainTuning) -> Self {
        let unit = tuning.min_block_size;
        let ground = ((tuning.map_height * tuning.default_ground_fraction) / unit).round() * unit;
        let ground = ground.clamp(unit, tuning.map_height);

        let full = Region::new(0.0, 0.0, tuning.map_width, tuning.map_height);
        let band = Region::new(
            0.0,
            tuning.map_height - ground,
            tuning.map_width,
            ground,
        );

        let root = if band == full {
            QuadBlock::solid(full)
        } else {
            QuadBlock::internal(full, vec![QuadBlock::solid(band)])
        };

        Self {
            root,
            min_block_size: unit,
            player_positions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wire::WireNode;
    use serde_json::json;

    #[test]
    fn placeholder_is_a_ground_band_under_the_full_map() {
        let terrain = TerrainMap::placeholder(&TerrainTuning::default());
        assert_eq!(terrain.root.region(), Region::new(0.0, 0.0, 1600.0, 800.0));
        assert_eq!(
            terrain.root.filled_regions(),
            vec![Region::new(0.0, 640.0, 1600.0, 160.0)]
        );
        assert_eq!(WireNode::from(&terrain.root).validate(), Ok(()));
    }

    #[test]
    fn quad_tree_wins_over_primitive() {
        let doc: MapDocument = serde_json::from_value(json!({
            "playerPositions": [{ "x": 0, "y": 0 }],
            "quadTree": { "x": 0, "y": 0, "width": 20, "height": 10, "filled": true, "children": [] },
            "primitive": { "rowSize": 2, "columnSize": 1, "minTileSize": 10, "grid": [0, 0] }
        }))
        .expect("parse");

        let terrain = TerrainMap::from_document(doc, 8.0).expect("terrain");
        assert!(terrain.root.is_filled());
        assert_eq!(terrain.min_block_size, 10.0);
        assert_eq!(terrain.player_positions.len(), 1);
    }

    #[test]
    fn primitive_only_documents_are_converted() {
        let doc: MapDocument = serde_json::from_value(json!({
            "primitive": {
                "rowSize": 2, "columnSize": 2, "minTileSize": 16, "grid": [0, 0, 1, 1],
                "playerPositions": [{ "x": 16, "y": 0 }]
            }
        }))
        .expect("parse");

        let terrain = TerrainMap::from_document(doc, 8.0).expect("terrain");
        assert_eq!(terrain.min_block_size, 16.0);
        assert_eq!(terrain.root.filled_area(), 2.0 * 16.0 * 16.0);
        assert_eq!(terrain.player_positions, vec![Position { x: 16.0, y: 0.0 }]);
    }

    #[test]
    fn tile_sizes_below_one_unit_are_rejected() {
        let tree_doc: MapDocument = serde_json::from_value(json!({
            "quadTree": { "x": 0, "y": 0, "width": 20, "height": 10, "filled": true, "children": [] },
            "primitive": { "rowSize": 2, "columnSize": 1, "minTileSize": 0.0001, "grid": [1, 1] }
        }))
        .expect("parse");
        assert!(matches!(
            TerrainMap::from_document(tree_doc, 8.0),
            Err(TerrainError::InvalidMap(_))
        ));

        let bitmap_doc: MapDocument = serde_json::from_value(json!({
            "primitive": { "rowSize": 2, "columnSize": 1, "minTileSize": 0.0001, "grid": [1, 1] }
        }))
        .expect("parse");
        assert!(matches!(
            TerrainMap::from_document(bitmap_doc, 8.0),
            Err(TerrainError::InvalidMap(_))
        ));

        let bare_tree: MapDocument = serde_json::from_value(json!({
            "quadTree": { "x": 0, "y": 0, "width": 20, "height": 10, "filled": true, "children": [] }
        }))
        .expect("parse");
        assert!(TerrainMap::from_document(bare_tree.clone(), 0.5).is_err());
        assert_eq!(
            TerrainMap::from_document(bare_tree, 8.0).expect("terrain").min_block_size,
            8.0
        );
    }

    #[test]
    fn empty_documents_are_rejected() {
        let doc = MapDocument {
            player_positions: Vec::new(),
            quad_tree: None,
            primitive: None,
        };
        assert!(matches!(
            TerrainMap::from_document(doc, 8.0),
            Err(TerrainError::InvalidMap(_))
        ));
    }
}

// Plain-data mirrors of the terrain used for full-state transfer and map files.
//
// Field names follow the JSON the browser client and the map editor exchange.

use super::errors::TerrainError;
use super::quad_block::QuadBlock;
use super::region::Region;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Wire form of a `QuadBlock`: same fields, no behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub filled: bool,
    #[serde(default)]
    pub children: Vec<WireNode>,
}

/// A full tree ready for broadcast, tagged with the tick it was taken on.
#[derive(Debug, Clone)]
pub struct TerrainSnapshot {
    pub tick: u64,
    pub root: Arc<WireNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Editor bitmap: flattened row-major 0/1 grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveDocument {
    pub row_size: usize,
    pub column_size: usize,
    pub min_tile_size: f32,
    pub grid: Vec<u8>,
    // The editor's own save format keeps spawn points next to the grid.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub player_positions: Vec<Position>,
}

/// Exported map. Loaders accept documents carrying either representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDocument {
    #[serde(default)]
    pub player_positions: Vec<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quad_tree: Option<WireNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primitive: Option<PrimitiveDocument>,
}

impl WireNode {
    pub fn region(&self) -> Region {
        Region::new(self.x, self.y, self.width, self.height)
    }

    /// Structural check applied to snapshots received from the network.
    ///
    /// Pruning drops air children, so internal nodes may carry 1 to 4 children;
    /// what must hold is that they fit inside the parent without overlapping.
    pub fn validate(&self) -> Result<(), TerrainError> {
        let region = self.region();
        if !region.is_valid() {
            return Err(TerrainError::MalformedTree("non-positive or non-finite region"));
        }
        if self.children.len() > 4 {
            return Err(TerrainError::MalformedTree("more than four children"));
        }
        if self.filled && !self.children.is_empty() {
            return Err(TerrainError::MalformedTree("filled node with children"));
        }

        for (i, child) in self.children.iter().enumerate() {
            child.validate()?;
            let child_region = child.region();
            if !region.contains_region(&child_region) {
                return Err(TerrainError::MalformedTree("child outside its parent"));
            }
            if self.children[i + 1..]
                .iter()
                .any(|other| other.region().overlaps(&child_region))
            {
                return Err(TerrainError::MalformedTree("overlapping children"));
            }
        }

        Ok(())
    }
}

impl From<&QuadBlock> for WireNode {
    fn from(block: &QuadBlock) -> Self {
        let region = block.region();
        Self {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            filled: block.is_filled(),
            children: block.children().iter().map(WireNode::from).collect(),
        }
    }
}

impl QuadBlock {
    /// Structural copy of a trusted wire tree; nothing is re-derived.
    pub fn from_wire(node: &WireNode) -> Self {
        Self {
            region: node.region(),
            filled: node.filled,
            children: node.children.iter().map(QuadBlock::from_wire).collect(),
        }
    }
}

impl TryFrom<&WireNode> for QuadBlock {
    type Error = TerrainError;

    fn try_from(node: &WireNode) -> Result<Self, Self::Error> {
        node.validate()?;
        Ok(QuadBlock::from_wire(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn leaf(x: f32, y: f32, width: f32, height: f32, filled: bool) -> WireNode {
        WireNode {
            x,
            y,
            width,
            height,
            filled,
            children: Vec::new(),
        }
    }

    #[test]
    fn wire_json_uses_plain_field_names() {
        let node = leaf(0.0, 0.0, 40.0, 10.0, true);
        let value = serde_json::to_value(&node).expect("serialize");
        assert_eq!(
            value,
            json!({
                "x": 0.0, "y": 0.0, "width": 40.0, "height": 10.0,
                "filled": true, "children": []
            })
        );
    }

    #[test]
    fn integer_coordinates_parse() {
        let node: WireNode = serde_json::from_value(json!({
            "x": 0, "y": 30, "width": 40, "height": 10, "filled": true, "children": []
        }))
        .expect("parse");
        assert_eq!(node.region(), Region::new(0.0, 30.0, 40.0, 10.0));
    }

    #[test]
    fn missing_children_defaults_to_leaf() {
        let node: WireNode = serde_json::from_value(json!({
            "x": 0, "y": 0, "width": 8, "height": 8, "filled": false
        }))
        .expect("parse");
        assert!(node.children.is_empty());
    }

    #[test]
    fn pruned_tree_validates() {
        let mut root = leaf(0.0, 0.0, 20.0, 20.0, false);
        root.children = vec![
            leaf(0.0, 0.0, 10.0, 10.0, true),
            leaf(10.0, 10.0, 10.0, 10.0, true),
        ];
        assert_eq!(root.validate(), Ok(()));
    }

    #[test]
    fn malformed_trees_are_rejected() {
        let mut too_many = leaf(0.0, 0.0, 20.0, 20.0, false);
        too_many.children = vec![leaf(0.0, 0.0, 4.0, 4.0, true); 5];
        assert!(matches!(
            too_many.validate(),
            Err(TerrainError::MalformedTree(_))
        ));

        let mut filled_parent = leaf(0.0, 0.0, 20.0, 20.0, true);
        filled_parent.children = vec![leaf(0.0, 0.0, 10.0, 20.0, true)];
        assert!(filled_parent.validate().is_err());

        let mut escaping = leaf(0.0, 0.0, 20.0, 20.0, false);
        escaping.children = vec![leaf(10.0, 0.0, 20.0, 20.0, true)];
        assert!(escaping.validate().is_err());

        let mut overlapping = leaf(0.0, 0.0, 20.0, 20.0, false);
        overlapping.children = vec![
            leaf(0.0, 0.0, 15.0, 20.0, true),
            leaf(10.0, 0.0, 10.0, 20.0, true),
        ];
        assert!(overlapping.validate().is_err());

        assert!(leaf(0.0, 0.0, 0.0, 20.0, true).validate().is_err());
        assert!(leaf(f32::NAN, 0.0, 10.0, 20.0, true).validate().is_err());
    }

    #[test]
    fn try_from_rejects_malformed_nodes() {
        let node = leaf(0.0, 0.0, -1.0, 20.0, true);
        assert!(QuadBlock::try_from(&node).is_err());
    }

    #[test]
    fn map_document_reads_editor_export() {
        let doc: MapDocument = serde_json::from_value(json!({
            "playerPositions": [{ "x": 16, "y": 0 }],
            "primitive": {
                "rowSize": 2, "columnSize": 1, "minTileSize": 8, "grid": [1, 0]
            }
        }))
        .expect("parse");

        assert_eq!(doc.player_positions, vec![Position { x: 16.0, y: 0.0 }]);
        assert!(doc.quad_tree.is_none());
        assert_eq!(doc.primitive.expect("primitive").grid, vec![1, 0]);
    }

    proptest! {
        #[test]
        fn wire_round_trip_keeps_solid_geometry(
            edits in prop::collection::vec((0.0f32..400.0, 0.0f32..200.0, 2.0f32..60.0), 0..6)
        ) {
            let mut root = QuadBlock::solid(Region::new(0.0, 0.0, 400.0, 200.0));
            for (x, y, r) in edits {
                root.destroy(x, y, r, 8.0);
                root.cleanup();
            }

            let wire = WireNode::from(&root);
            prop_assert_eq!(wire.validate(), Ok(()));

            let json = serde_json::to_string(&wire).expect("serialize");
            let decoded: WireNode = serde_json::from_str(&json).expect("parse");
            let rebuilt = QuadBlock::try_from(&decoded).expect("valid tree");

            prop_assert_eq!(rebuilt.filled_regions(), root.filled_regions());
            prop_assert_eq!(rebuilt, root);
        }
    }
}

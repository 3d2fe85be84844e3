// Server-side owner of the canonical terrain tree and its colliders.

use crate::domain::ports::PhysicsRegistry;
use crate::domain::{PrimitiveMap, QuadBlock, TerrainError, TerrainMap, WireNode};
use crate::use_cases::colliders::ColliderSet;
use tracing::debug;

/// What a single explosion did to the terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionReport {
    /// False when the circle missed every solid block; nothing was rebuilt.
    pub changed: bool,
    pub colliders: usize,
    pub leaves: usize,
}

pub struct TerrainAuthority<P: PhysicsRegistry> {
    root: QuadBlock,
    min_block_size: f32,
    physics: P,
    colliders: ColliderSet<P::Handle>,
}

impl<P: PhysicsRegistry> TerrainAuthority<P> {
    pub fn new(map: TerrainMap, physics: P) -> Self {
        let mut authority = Self {
            root: map.root,
            min_block_size: map.min_block_size,
            physics,
            colliders: ColliderSet::default(),
        };
        authority
            .colliders
            .rebuild(&mut authority.physics, &authority.root);
        authority
    }

    /// Replaces the canonical tree with one built from an authoring bitmap.
    pub fn load_from_primitive_map(&mut self, map: &PrimitiveMap) {
        let terrain = TerrainMap::from_primitive(map);
        self.root = terrain.root;
        self.min_block_size = terrain.min_block_size;
        let colliders = self.colliders.rebuild(&mut self.physics, &self.root);
        debug!(colliders, leaves = self.root.leaf_count(), "terrain loaded from bitmap");
    }

    /// destroy -> cleanup -> merge -> collider swap.
    ///
    /// Degenerate geometry is refused without touching anything; a miss leaves
    /// the tree and colliders as they were.
    pub fn explode(&mut self, cx: f32, cy: f32, radius: f32) -> Result<ExplosionReport, TerrainError> {
        if !cx.is_finite() || !cy.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return Err(TerrainError::DegenerateGeometry);
        }

        let changed = self.root.destroy(cx, cy, radius, self.min_block_size);
        if !changed {
            return Ok(ExplosionReport {
                changed,
                colliders: self.colliders.len(),
                leaves: self.root.leaf_count(),
            });
        }

        self.root.cleanup();
        let colliders = self.colliders.rebuild(&mut self.physics, &self.root);

        Ok(ExplosionReport {
            changed,
            colliders,
            leaves: self.root.leaf_count(),
        })
    }

    pub fn snapshot(&self) -> WireNode {
        WireNode::from(&self.root)
    }

    pub fn root(&self) -> &QuadBlock {
        &self.root
    }

    pub fn min_block_size(&self) -> f32 {
        self.min_block_size
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

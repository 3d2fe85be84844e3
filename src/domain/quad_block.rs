// Destructible terrain tree.
//
// Every node is either a solid leaf, an air leaf, or an internal node whose own
// `filled` flag is false. Parents own their children outright.

use super::region::Region;
use super::split::plan_split;

#[derive(Debug, Clone, PartialEq)]
pub struct QuadBlock {
    pub(crate) region: Region,
    pub(crate) filled: bool,
    pub(crate) children: Vec<QuadBlock>,
}

impl QuadBlock {
    /// Solid leaf covering `region`.
    pub fn solid(region: Region) -> Self {
        Self {
            region,
            filled: true,
            children: Vec::new(),
        }
    }

    /// Air leaf covering `region`.
    pub fn air(region: Region) -> Self {
        Self {
            region,
            filled: false,
            children: Vec::new(),
        }
    }

    pub(crate) fn internal(region: Region, children: Vec<QuadBlock>) -> Self {
        Self {
            region,
            filled: false,
            children,
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn children(&self) -> &[QuadBlock] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Air leaf: not solid and nothing underneath.
    pub fn is_empty(&self) -> bool {
        !self.filled && !self.has_children()
    }

    /// Splits a solid leaf into solid children and turns this node internal.
    ///
    /// Does nothing for air, internal nodes, or blocks whose smaller side is
    /// already at or below `min_size`.
    pub fn subdivide(&mut self, min_size: f32) {
        if !self.filled || self.has_children() || !min_size.is_finite() {
            return;
        }
        if min_size <= 0.0 || self.region.min_side() <= min_size {
            return;
        }
        let Some(split) = plan_split(self.region.width, self.region.height, min_size) else {
            return;
        };

        self.children = split
            .regions(self.region)
            .into_iter()
            .map(QuadBlock::solid)
            .collect();
        self.filled = false;
    }

    /// Carves a circle out of the terrain. Returns whether any block was cleared.
    ///
    /// Blocks at minimum granularity that the circle touches are cleared
    /// entirely. Non-finite input, a radius that is not strictly positive, or a
    /// non-positive `min_size` leave the tree untouched.
    pub fn destroy(&mut self, cx: f32, cy: f32, radius: f32, min_size: f32) -> bool {
        if !cx.is_finite() || !cy.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return false;
        }
        if !min_size.is_finite() || min_size <= 0.0 {
            return false;
        }

        self.carve(cx, cy, radius, min_size)
    }

    fn carve(&mut self, cx: f32, cy: f32, radius: f32, min_size: f32) -> bool {
        if self.is_empty() || !self.region.intersects_circle(cx, cy, radius) {
            return false;
        }

        if self.region.min_side() <= min_size {
            self.turn_empty();
            return true;
        }

        if !self.has_children() {
            self.subdivide(min_size);
        }

        let mut cleared = false;
        for child in &mut self.children {
            cleared |= child.carve(cx, cy, radius, min_size);
        }
        cleared
    }

    pub fn turn_empty(&mut self) {
        self.filled = false;
        self.children.clear();
    }

    /// Drops air children bottom-up; a node left without children becomes air.
    pub fn cleanup(&mut self) {
        if !self.has_children() {
            return;
        }

        for child in &mut self.children {
            child.cleanup();
        }
        self.children.retain(|child| !child.is_empty());

        if self.children.is_empty() {
            self.turn_empty();
        }
    }

    /// Solid leaves in pre-order.
    pub fn filled_regions(&self) -> Vec<Region> {
        let mut out = Vec::new();
        self.collect_filled(&mut out);
        out
    }

    fn collect_filled(&self, out: &mut Vec<Region>) {
        if self.filled {
            out.push(self.region);
            return;
        }
        for child in &self.children {
            child.collect_filled(out);
        }
    }

    pub fn filled_area(&self) -> f32 {
        if self.filled {
            return self.region.area();
        }
        self.children.iter().map(QuadBlock::filled_area).sum()
    }

    pub fn leaf_count(&self) -> usize {
        if self.has_children() {
            self.children.iter().map(QuadBlock::leaf_count).sum()
        } else {
            1
        }
    }

    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(QuadBlock::depth)
            .max()
            .unwrap_or(0)
    }

    pub fn is_solid_at(&self, x: f32, y: f32) -> bool {
        if !self.region.contains_point(x, y) {
            return false;
        }
        if self.filled {
            return true;
        }
        self.children.iter().any(|child| child.is_solid_at(x, y))
    }
}

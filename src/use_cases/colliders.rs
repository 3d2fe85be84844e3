// Collider set derived from the terrain tree. Rebuilt wholesale after every edit.

use crate::domain::merge_adjacent_blocks;
use crate::domain::ports::PhysicsRegistry;
use crate::domain::QuadBlock;

#[derive(Debug)]
pub struct ColliderSet<H> {
    handles: Vec<H>,
}

impl<H> Default for ColliderSet<H> {
    fn default() -> Self {
        Self {
            handles: Vec::new(),
        }
    }
}

impl<H> ColliderSet<H> {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Replaces every collider with the merged cover of `root`'s solid leaves.
    ///
    /// The merge runs before the registry is touched; removal and insertion then
    /// happen under a single exclusive borrow, so no physics step can observe
    /// the set half-updated.
    pub fn rebuild<P>(&mut self, physics: &mut P, root: &QuadBlock) -> usize
    where
        P: PhysicsRegistry<Handle = H>,
    {
        let rects = merge_adjacent_blocks(&root.filled_regions());

        for handle in self.handles.drain(..) {
            physics.remove(handle);
        }
        self.handles
            .extend(rects.into_iter().map(|rect| physics.add_static_rectangle(rect)));

        self.handles.len()
    }
}

// In-memory static body registry. Stands in for a physics engine on the
// server and in the headless probe; it answers solid-point queries only.

use crate::domain::ports::PhysicsRegistry;
use crate::domain::Region;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(u64);

#[derive(Debug, Default)]
pub struct StaticBodies {
    next_handle: u64,
    bodies: HashMap<BodyHandle, Region>,
}

impl StaticBodies {
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn is_solid_at(&self, x: f32, y: f32) -> bool {
        self.bodies.values().any(|body| body.contains_point(x, y))
    }

    pub fn covered_area(&self) -> f32 {
        self.bodies.values().map(Region::area).sum()
    }
}

impl PhysicsRegistry for StaticBodies {
    type Handle = BodyHandle;

    fn add_static_rectangle(&mut self, region: Region) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(handle, region);
        handle
    }

    fn remove(&mut self, handle: BodyHandle) {
        if self.bodies.remove(&handle).is_none() {
            warn!(handle = handle.0, "removed unknown static body");
        }
    }
}

// Axis-aligned rectangles in world space (top-left origin, y grows downward).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    /// Finite origin and strictly positive, finite dimensions.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Half-open containment: the right and bottom edges belong to the neighbour.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn contains_region(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// True when the two regions share a positive area (touching edges do not count).
    pub fn overlaps(&self, other: &Region) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Closest-point test: the circle touches the rectangle when the point of the
    /// rectangle nearest to the centre lies within `radius`.
    pub fn intersects_circle(&self, cx: f32, cy: f32, radius: f32) -> bool {
        let closest_x = cx.clamp(self.x, self.right());
        let closest_y = cy.clamp(self.y, self.bottom());

        let dx = cx - closest_x;
        let dy = cy - closest_y;

        dx * dx + dy * dy <= radius * radius
    }
}

// Subdivision policy shared by destructive edits and map authoring.
//
// Blocks more than twice as long as they are tall (or vice versa) are cut once
// across the long axis; everything else is cut into quadrants. Cut offsets are
// snapped to the nearest multiple of `unit` with `f32::round` (halves away from
// zero) and the remainder goes to the right/bottom child, so peers running the
// same edit always produce the same tree.

use super::region::Region;

const ASPECT_LIMIT: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Split {
    /// Vertical cut at `x + offset` (left, right).
    Columns(f32),
    /// Horizontal cut at `y + offset` (top, bottom).
    Rows(f32),
    /// Both cuts (top-left, top-right, bottom-left, bottom-right).
    Quadrants(f32, f32),
}

/// Half of `length`, snapped to the nearest multiple of `unit`.
pub fn snapped_half(length: f32, unit: f32) -> f32 {
    ((length / 2.0) / unit).round() * unit
}

/// Chooses how to split a `width` x `height` block, or `None` when neither side
/// is longer than `unit`.
pub fn plan_split(width: f32, height: f32, unit: f32) -> Option<Split> {
    let can_cut_x = width > unit;
    let can_cut_y = height > unit;

    match (can_cut_x, can_cut_y) {
        (false, false) => None,
        (true, false) => Some(Split::Columns(snapped_half(width, unit))),
        (false, true) => Some(Split::Rows(snapped_half(height, unit))),
        (true, true) => {
            if width / height > ASPECT_LIMIT {
                Some(Split::Columns(snapped_half(width, unit)))
            } else if height / width > ASPECT_LIMIT {
                Some(Split::Rows(snapped_half(height, unit)))
            } else {
                Some(Split::Quadrants(
                    snapped_half(width, unit),
                    snapped_half(height, unit),
                ))
            }
        }
    }
}

impl Split {
    /// Child regions in a fixed order; their union is exactly `parent`.
    pub fn regions(self, parent: Region) -> Vec<Region> {
        let Region {
            x,
            y,
            width,
            height,
        } = parent;

        match self {
            Split::Columns(hw) => vec![
                Region::new(x, y, hw, height),
                Region::new(x + hw, y, width - hw, height),
            ],
            Split::Rows(hh) => vec![
                Region::new(x, y, width, hh),
                Region::new(x, y + hh, width, height - hh),
            ],
            Split::Quadrants(hw, hh) => vec![
                Region::new(x, y, hw, hh),
                Region::new(x + hw, y, width - hw, hh),
                Region::new(x, y + hh, hw, height - hh),
                Region::new(x + hw, y + hh, width - hw, height - hh),
            ],
        }
    }
}

// Collider merging: coalesce solid leaves into fewer rectangles.
//
// Two greedy passes, in this order:
// 1. columns: sort by (x, y), stack blocks of equal x and width whose top
//    meets the running bottom edge;
// 2. rows: sort the columns by (y, x), chain blocks of equal y and height whose
//    left meets the running right edge.
// The result is deterministic for a given input order but not a minimal cover.

use super::region::Region;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
enum Pass {
    Columns,
    Rows,
}

impl Pass {
    fn order(self, a: &Region, b: &Region) -> Ordering {
        match self {
            Pass::Columns => a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)),
            Pass::Rows => a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)),
        }
    }

    fn continues(self, run: &Region, next: &Region) -> bool {
        match self {
            Pass::Columns => {
                next.x == run.x && next.width == run.width && next.y == run.bottom()
            }
            Pass::Rows => next.y == run.y && next.height == run.height && next.x == run.right(),
        }
    }

    fn absorb(self, run: &mut Region, next: &Region) {
        match self {
            Pass::Columns => run.height += next.height,
            Pass::Rows => run.width += next.width,
        }
    }
}

/// Merges solid leaves into non-overlapping rectangles with the same union.
pub fn merge_adjacent_blocks(leaves: &[Region]) -> Vec<Region> {
    let columns = coalesce(leaves, Pass::Columns);
    coalesce(&columns, Pass::Rows)
}

fn coalesce(blocks: &[Region], pass: Pass) -> Vec<Region> {
    let mut sorted = blocks.to_vec();
    // Stable sort keeps ties in input order.
    sorted.sort_by(|a, b| pass.order(a, b));

    let mut consumed = vec![false; sorted.len()];
    let mut merged = Vec::with_capacity(sorted.len());

    for i in 0..sorted.len() {
        if consumed[i] {
            continue;
        }
        consumed[i] = true;
        let mut run = sorted[i];

        for j in (i + 1)..sorted.len() {
            if !consumed[j] && pass.continues(&run, &sorted[j]) {
                pass.absorb(&mut run, &sorted[j]);
                consumed[j] = true;
            }
        }

        merged.push(run);
    }

    merged
}

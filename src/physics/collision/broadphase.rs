//! Broad phase collision detection algorithms
//! are responsible for detecting pairs of possibly intersecting objects
//! for further, more accurate narrow phase inspection.

use super::AABB;
use std::collections::HashMap;

/// A broad phase algorithm.
pub trait BroadPhase {
    /// Returns index pairs `[i, j]` with `i < j` of items whose bounding boxes overlap,
    /// sorted in ascending order.
    fn pairs(&mut self, aabbs: &[AABB]) -> Vec<[usize; 2]>;
}

/// The simplest possible broad phase algorithm,
/// which tests every object against every other object.
/// Very inefficient, but can work for small systems.
#[derive(Clone, Copy, Debug, Default)]
pub struct BruteForce;

impl BroadPhase for BruteForce {
    fn pairs(&mut self, aabbs: &[AABB]) -> Vec<[usize; 2]> {
        let mut pairs = Vec::new();
        for (i, a) in aabbs.iter().enumerate() {
            for (j, b) in aabbs.iter().enumerate().skip(i + 1) {
                if a.overlaps(b) {
                    pairs.push([i, j]);
                }
            }
        }
        pairs
    }
}

/// Boxes spanning more cells than this are tested against everything instead of being gridded.
const MAX_CELLS_PER_ITEM: f64 = 64.0;

/// A uniform grid of square cells, stored sparsely so it covers all of space.
///
/// Works best when most objects are about the size of a cell or smaller.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
    oversized: Vec<usize>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            log::warn!("invalid grid cell size {}, using 1.0", cell_size);
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            oversized: Vec::new(),
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn cell_range(&self, aabb: &AABB) -> Option<([i64; 2], [i64; 2])> {
        let min = [
            (aabb.min.x / self.cell_size).floor(),
            (aabb.min.y / self.cell_size).floor(),
        ];
        let max = [
            (aabb.max.x / self.cell_size).floor(),
            (aabb.max.y / self.cell_size).floor(),
        ];
        if min.iter().chain(&max).any(|c| !c.is_finite()) {
            return None;
        }
        let cell_count = (max[0] - min[0] + 1.0) * (max[1] - min[1] + 1.0);
        if cell_count > MAX_CELLS_PER_ITEM {
            return None;
        }
        Some(([min[0] as i64, min[1] as i64], [max[0] as i64, max[1] as i64]))
    }
}

impl BroadPhase for SpatialGrid {
    fn pairs(&mut self, aabbs: &[AABB]) -> Vec<[usize; 2]> {
        // keep the allocated cell vectors around between steps
        for cell in self.cells.values_mut() {
            cell.clear();
        }
        self.oversized.clear();

        for (i, aabb) in aabbs.iter().enumerate() {
            match self.cell_range(aabb) {
                Some((min, max)) => {
                    for x in min[0]..=max[0] {
                        for y in min[1]..=max[1] {
                            self.cells.entry((x, y)).or_default().push(i);
                        }
                    }
                }
                None => self.oversized.push(i),
            }
        }

        let mut pairs = Vec::new();
        for cell in self.cells.values() {
            for (k, &i) in cell.iter().enumerate() {
                for &j in &cell[k + 1..] {
                    if aabbs[i].overlaps(&aabbs[j]) {
                        pairs.push([i, j]);
                    }
                }
            }
        }
        for &i in &self.oversized {
            for (j, other) in aabbs.iter().enumerate() {
                if j != i && aabbs[i].overlaps(other) {
                    pairs.push([i.min(j), i.max(j)]);
                }
            }
        }

        // drop cells that stayed empty so the map doesn't grow without bound
        self.cells.retain(|_, cell| !cell.is_empty());

        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math as m;
    use rand::{Rng, SeedableRng};

    fn random_aabbs(rng: &mut impl Rng, count: usize) -> Vec<AABB> {
        (0..count)
            .map(|_| {
                let center = m::Vec2::new(rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0));
                // mostly small boxes with the occasional huge one
                let half = if rng.gen_bool(0.05) {
                    m::Vec2::new(rng.gen_range(5.0..30.0), rng.gen_range(0.1..2.0))
                } else {
                    m::Vec2::new(rng.gen_range(0.1..1.5), rng.gen_range(0.1..1.5))
                };
                AABB::new(center - half, center + half)
            })
            .collect()
    }

    #[test]
    fn grid_matches_brute_force() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(99);
        let mut grid = SpatialGrid::new(2.0);
        // reuse the grid over several rounds to exercise clearing
        for round in 0..5 {
            let aabbs = random_aabbs(&mut rng, 150 + round * 20);
            let expected = BruteForce.pairs(&aabbs);
            assert!(!expected.is_empty());
            itertools::assert_equal(grid.pairs(&aabbs), expected);
        }
    }

    #[test]
    fn pairs_are_ordered() {
        let aabbs = [
            AABB::new(m::Vec2::new(0.0, 0.0), m::Vec2::new(1.0, 1.0)),
            AABB::new(m::Vec2::new(5.0, 5.0), m::Vec2::new(6.0, 6.0)),
            AABB::new(m::Vec2::new(0.5, 0.5), m::Vec2::new(5.5, 5.5)),
        ];
        itertools::assert_equal(BruteForce.pairs(&aabbs), [[0usize, 2], [1, 2]]);
        itertools::assert_equal(SpatialGrid::new(1.0).pairs(&aabbs), [[0usize, 2], [1, 2]]);
    }

    #[test]
    fn invalid_cell_size_falls_back() {
        assert_eq!(SpatialGrid::new(-3.0).cell_size(), 1.0);
        assert_eq!(SpatialGrid::new(f64::NAN).cell_size(), 1.0);
    }
}

//! Exact neighbor search over a hashed voxel grid.
//!
//! Points are bucketed by cell; a query scans shells of cells around its own
//! cell, growing outward until no unvisited cell can hold a closer point.
//! Only lookups touch the hash map, so results do not depend on its
//! iteration order. Ties are broken by the lower point index.

use std::collections::HashMap;

use nalgebra::Point3;

use crate::map::VoxelKey;

/// Voxel-bucketed view of a point slice.
#[derive(Debug)]
pub struct NeighborGrid<'a> {
    points: &'a [Point3<f64>],
    cell_size: f64,
    cells: HashMap<VoxelKey, Vec<usize>>,
}

impl<'a> NeighborGrid<'a> {
    /// Bucket `points` into cells of edge `cell_size`; non-finite points are skipped.
    pub fn new(points: &'a [Point3<f64>], cell_size: f64) -> Self {
        let mut cells: HashMap<VoxelKey, Vec<usize>> = HashMap::new();
        for (i, p) in points.iter().enumerate() {
            if let Some(key) = VoxelKey::from_point(p, cell_size) {
                cells.entry(key).or_default().push(i);
            }
        }
        Self {
            points,
            cell_size,
            cells,
        }
    }

    pub fn points(&self) -> &'a [Point3<f64>] {
        self.points
    }

    /// Nearest point within `max_distance`, as (index, squared distance).
    pub fn nearest_within(&self, query: &Point3<f64>, max_distance: f64) -> Option<(usize, f64)> {
        let center = VoxelKey::from_point(query, self.cell_size)?;
        let rings = (max_distance / self.cell_size).ceil().max(1.0) as i64;
        let max_sq = max_distance * max_distance;

        let mut best: Option<(usize, f64)> = None;
        for ring in 0..=rings {
            for key in shell(center, ring) {
                let Some(bucket) = self.cells.get(&key) else {
                    continue;
                };
                for &idx in bucket {
                    let d = (self.points[idx] - query).norm_squared();
                    if d <= max_sq && is_better((idx, d), best) {
                        best = Some((idx, d));
                    }
                }
            }
        }
        best
    }

    /// Up to `k` nearest points, closest first, searching at most
    /// `max_rings` shells away from the query cell.
    pub fn k_nearest(&self, query: &Point3<f64>, k: usize, max_rings: i64) -> Vec<(usize, f64)> {
        let Some(center) = VoxelKey::from_point(query, self.cell_size) else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let mut found: Vec<(usize, f64)> = Vec::new();
        for ring in 0..=max_rings {
            for key in shell(center, ring) {
                if let Some(bucket) = self.cells.get(&key) {
                    found.extend(
                        bucket
                            .iter()
                            .map(|&idx| (idx, (self.points[idx] - query).norm_squared())),
                    );
                }
            }

            // Anything in shell `ring + 1` is at least `ring` cells away.
            if found.len() >= k {
                found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
                let reach = ring as f64 * self.cell_size;
                if found[k - 1].1 <= reach * reach {
                    break;
                }
            }
        }

        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found.truncate(k);
        found
    }
}

fn is_better(candidate: (usize, f64), best: Option<(usize, f64)>) -> bool {
    match best {
        None => true,
        Some((idx, d)) => candidate.1 < d || (candidate.1 == d && candidate.0 < idx),
    }
}

/// Cells whose Chebyshev distance from `center` is exactly `ring`.
///
/// Cells whose coordinates would overflow `i64` are left out.
fn shell(center: VoxelKey, ring: i64) -> impl Iterator<Item = VoxelKey> {
    (-ring..=ring).flat_map(move |dx| {
        (-ring..=ring).flat_map(move |dy| {
            (-ring..=ring).filter_map(move |dz| {
                if dx.abs() != ring && dy.abs() != ring && dz.abs() != ring {
                    return None;
                }
                Some(VoxelKey::new(
                    center.x.checked_add(dx)?,
                    center.y.checked_add(dy)?,
                    center.z.checked_add(dz)?,
                ))
            })
        })
    })
}

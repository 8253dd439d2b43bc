use crate::ensure_precondition;
use crate::error::Result;
use glam::Vec3;
use murmur_data::{AgentId, MapBounds};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Grid coordinates of one bucket on the ground plane.
///
/// Keys outside the grid are representable; check them with
/// [`SpatialIndex::is_valid_bucket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    pub cx: i32,
    pub cz: i32,
}

/// Read-only neighbour queries over the agent positions captured by the last
/// build. Results are only meaningful for the tick they were built in.
pub trait SpatialIndex {
    /// Agents whose x/z position lies inside the box `[min, max]` and that
    /// pass `filter`. The vertical axis is ignored.
    fn region_query(
        &self,
        min: Vec3,
        max: Vec3,
        filter: &mut dyn FnMut(AgentId) -> bool,
    ) -> Vec<AgentId>;

    fn bucket_of(&self, position: Vec3) -> BucketKey;

    fn is_valid_bucket(&self, key: BucketKey) -> bool;

    /// Agents in one bucket; empty for invalid keys.
    fn agents_in(&self, key: BucketKey) -> &[AgentId];

    fn all_buckets(&self) -> Vec<&[AgentId]>;

    /// Agents within `radius` of `center` (exact distance test). Clears `out`.
    fn query_radius_into(&self, center: Vec3, radius: f32, out: &mut Vec<AgentId>);
}

/// Uniform grid over the ground plane of the wrap-around map.
///
/// Uses the offset-array layout: `cell_offsets[i]..cell_offsets[i + 1]`
/// indexes the agents of cell `i` inside `cell_ids`/`cell_positions`, both
/// sorted by cell.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use murmur_core::spatial_hash::{SpatialHash, SpatialIndex};
/// use murmur_data::{AgentId, MapBounds};
///
/// let mut spatial = SpatialHash::new(5.0, MapBounds { x: 50.0, z: 50.0 }).unwrap();
/// spatial.build(&[(AgentId::new(0, 0), Vec3::new(1.0, 0.0, 1.0))]);
///
/// let mut nearby = Vec::new();
/// spatial.query_radius_into(Vec3::ZERO, 2.0, &mut nearby);
/// assert_eq!(nearby.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SpatialHash {
    pub cell_size: f32,
    pub bounds: MapBounds,
    pub cols: usize,
    pub rows: usize,
    pub cell_offsets: Vec<usize>,
    pub cell_ids: Vec<AgentId>,
    pub cell_positions: Vec<Vec3>,
}

impl SpatialHash {
    pub fn new(cell_size: f32, bounds: MapBounds) -> Result<Self> {
        ensure_precondition!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell size must be positive, got {}",
            cell_size
        );
        ensure_precondition!(
            bounds.x > 0.0 && bounds.z > 0.0,
            "map bounds must be positive, got {:?}",
            bounds
        );
        let cols = ((bounds.x * 2.0) / cell_size).ceil().max(1.0) as usize;
        let rows = ((bounds.z * 2.0) / cell_size).ceil().max(1.0) as usize;
        Ok(Self {
            cell_size,
            bounds,
            cols,
            rows,
            cell_offsets: vec![0; cols * rows + 1],
            cell_ids: Vec::new(),
            cell_positions: Vec::new(),
        })
    }

    #[inline]
    fn cell_coords(&self, x: f32, z: f32) -> (i32, i32) {
        (
            axis_cell(x, self.bounds.x, self.cell_size, self.cols),
            axis_cell(z, self.bounds.z, self.cell_size, self.rows),
        )
    }

    /// Flat cell index for a world position, `None` for non-finite or
    /// out-of-grid coordinates.
    #[inline]
    #[must_use]
    pub fn get_cell_idx(&self, x: f32, z: f32) -> Option<usize> {
        if !x.is_finite() || !z.is_finite() {
            return None;
        }
        let (cx, cz) = self.cell_coords(x, z);
        self.flat_index(BucketKey { cx, cz })
    }

    #[inline]
    fn flat_index(&self, key: BucketKey) -> Option<usize> {
        if key.cx < 0 || key.cx >= self.cols as i32 || key.cz < 0 || key.cz >= self.rows as i32 {
            None
        } else {
            Some(key.cz as usize * self.cols + key.cx as usize)
        }
    }

    /// Rebuilds the grid from a position snapshot. Entries with non-finite or
    /// out-of-bounds positions are dropped; the `+bound` edges count as inside.
    pub fn build(&mut self, entries: &[(AgentId, Vec3)]) {
        let cell_count = self.cols * self.rows;

        let atomic_counts: Vec<AtomicUsize> =
            (0..cell_count).map(|_| AtomicUsize::new(0)).collect();
        let count_one = |&(_, p): &(AgentId, Vec3)| {
            if let Some(idx) = self.get_cell_idx(p.x, p.z) {
                atomic_counts[idx].fetch_add(1, AtomicOrdering::Relaxed);
            }
        };
        #[cfg(feature = "rayon")]
        entries.par_iter().for_each(count_one);
        #[cfg(not(feature = "rayon"))]
        entries.iter().for_each(count_one);
        let counts: Vec<usize> = atomic_counts.into_iter().map(|a| a.into_inner()).collect();

        self.cell_offsets.resize(cell_count + 1, 0);
        let mut total = 0;
        for (i, &count) in counts.iter().enumerate() {
            self.cell_offsets[i] = total;
            total += count;
        }
        self.cell_offsets[cell_count] = total;

        self.cell_ids.clear();
        self.cell_ids.resize(total, AgentId::new(u32::MAX, 0));
        self.cell_positions.clear();
        self.cell_positions.resize(total, Vec3::ZERO);

        let mut cursor = self.cell_offsets[..cell_count].to_vec();
        for &(id, p) in entries {
            if let Some(cell_idx) = self.get_cell_idx(p.x, p.z) {
                let write_idx = cursor[cell_idx];
                self.cell_ids[write_idx] = id;
                self.cell_positions[write_idx] = p;
                cursor[cell_idx] += 1;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cell_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cell_ids.is_empty()
    }

    /// Visits every stored entry in the cells overlapping the x/z rectangle.
    fn for_each_in_cells<F>(&self, min_x: f32, min_z: f32, max_x: f32, max_z: f32, mut visit: F)
    where
        F: FnMut(AgentId, Vec3),
    {
        let (min_cx, min_cz) = self.cell_coords(min_x, min_z);
        let (max_cx, max_cz) = self.cell_coords(max_x, max_z);
        let min_cx = min_cx.max(0);
        let min_cz = min_cz.max(0);
        let max_cx = max_cx.min(self.cols as i32 - 1);
        let max_cz = max_cz.min(self.rows as i32 - 1);

        for cz in min_cz..=max_cz {
            for cx in min_cx..=max_cx {
                let cell_idx = cz as usize * self.cols + cx as usize;
                let start = self.cell_offsets[cell_idx];
                let end = self.cell_offsets[cell_idx + 1];
                for i in start..end {
                    visit(self.cell_ids[i], self.cell_positions[i]);
                }
            }
        }
    }
}

/// Cell coordinate along one axis. The closed `+bound` edge belongs to the
/// last cell.
#[inline]
fn axis_cell(v: f32, bound: f32, cell_size: f32, cells: usize) -> i32 {
    let c = ((v + bound) / cell_size).floor();
    let c = c.clamp(i32::MIN as f32, i32::MAX as f32) as i32;
    if v <= bound && c >= cells as i32 {
        cells as i32 - 1
    } else {
        c
    }
}

impl SpatialIndex for SpatialHash {
    fn region_query(
        &self,
        min: Vec3,
        max: Vec3,
        filter: &mut dyn FnMut(AgentId) -> bool,
    ) -> Vec<AgentId> {
        let mut result = Vec::new();
        if !(min.is_finite() && max.is_finite()) {
            return result;
        }
        self.for_each_in_cells(min.x, min.z, max.x, max.z, |id, p| {
            if p.x >= min.x && p.x <= max.x && p.z >= min.z && p.z <= max.z && filter(id) {
                result.push(id);
            }
        });
        result
    }

    fn bucket_of(&self, position: Vec3) -> BucketKey {
        let (cx, cz) = self.cell_coords(position.x, position.z);
        BucketKey { cx, cz }
    }

    fn is_valid_bucket(&self, key: BucketKey) -> bool {
        self.flat_index(key).is_some()
    }

    fn agents_in(&self, key: BucketKey) -> &[AgentId] {
        match self.flat_index(key) {
            Some(idx) => &self.cell_ids[self.cell_offsets[idx]..self.cell_offsets[idx + 1]],
            None => &[],
        }
    }

    fn all_buckets(&self) -> Vec<&[AgentId]> {
        (0..self.cols * self.rows)
            .map(|idx| &self.cell_ids[self.cell_offsets[idx]..self.cell_offsets[idx + 1]])
            .collect()
    }

    #[inline]
    fn query_radius_into(&self, center: Vec3, radius: f32, out: &mut Vec<AgentId>) {
        out.clear();
        if !center.is_finite() || !radius.is_finite() || radius < 0.0 {
            return;
        }
        let r_sq = radius * radius;
        self.for_each_in_cells(
            center.x - radius,
            center.z - radius,
            center.x + radius,
            center.z + radius,
            |id, p| {
                if p.distance_squared(center) <= r_sq {
                    out.push(id);
                }
            },
        );
    }
}

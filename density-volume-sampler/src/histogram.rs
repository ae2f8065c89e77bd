//! Regular voxel histogram of a point cloud.

use crate::quadrature::linspace;
use constants::grid::HISTOGRAM_CHUNK_SIZE;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Dense count grid in C order (`[ix][iy][iz]`) with its bin edges.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    resolution: usize,
    ranges: [f64; 3],
    edges: [Vec<f64>; 3],
    counts: Vec<u64>,
}

/// Axis-aligned placement of the binned region in sampler space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPlacement {
    /// Lower corner of the first voxel.
    pub origin: [f64; 3],
    /// Edge length of one voxel per axis.
    pub voxel_size: [f64; 3],
    /// Full extent of the grid per axis.
    pub world_size: [f64; 3],
    pub center: [f64; 3],
}

impl DensityGrid {
    /// Bin `points` into `resolution` equal bins per axis over `[-ranges[i], ranges[i]]`.
    ///
    /// Follows `histogramdd` conventions: bin `k` holds `edges[k] <= v < edges[k + 1]`,
    /// the last bin is closed on the right, and a point outside the range on any axis
    /// is not counted anywhere.
    pub fn from_points(points: &[[f64; 3]], ranges: [f64; 3], resolution: usize) -> Self {
        debug_assert!(resolution > 0, "histogram needs at least one bin per axis");
        let edges = ranges.map(|range| linspace(-range, range, resolution + 1));
        let cells = resolution * resolution * resolution;

        let counts = points
            .par_chunks(HISTOGRAM_CHUNK_SIZE)
            .map(|chunk| {
                let mut local_counts = vec![0u64; cells];
                for point in chunk {
                    if let Some(index) = flat_index(point, &edges, resolution) {
                        local_counts[index] += 1;
                    }
                }
                local_counts
            })
            .reduce_with(|mut a, b| {
                for (total, count) in a.iter_mut().zip(b) {
                    *total += count;
                }
                a
            })
            .unwrap_or_else(|| vec![0u64; cells]);

        Self {
            resolution,
            ranges,
            edges,
            counts,
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.resolution; 3]
    }

    pub fn ranges(&self) -> [f64; 3] {
        self.ranges
    }

    /// Bin edges for the x, y and z axes, `resolution + 1` values each.
    pub fn edges(&self) -> &[Vec<f64>; 3] {
        &self.edges
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn get(&self, ix: usize, iy: usize, iz: usize) -> u64 {
        self.counts[(ix * self.resolution + iy) * self.resolution + iz]
    }

    /// Number of points that landed in the grid.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn to_f64(&self) -> Vec<f64> {
        self.counts.iter().map(|&c| c as f64).collect()
    }

    /// Counts scaled so the densest voxel is 1; all zeros for an empty grid.
    /// This is the form sparse-volume encoders expect for fog volumes.
    pub fn normalized(&self) -> Vec<f32> {
        let max = self.max();
        if max == 0 {
            return vec![0.0; self.counts.len()];
        }
        self.counts
            .iter()
            .map(|&c| (c as f64 / max as f64) as f32)
            .collect()
    }

    pub fn placement(&self) -> GridPlacement {
        let axis = |i: usize| {
            let lower = self.edges[i][0];
            let upper = self.edges[i][self.resolution];
            (lower, upper)
        };

        let mut placement = GridPlacement {
            origin: [0.0; 3],
            voxel_size: [0.0; 3],
            world_size: [0.0; 3],
            center: [0.0; 3],
        };
        for i in 0..3 {
            let (lower, upper) = axis(i);
            placement.origin[i] = lower;
            placement.world_size[i] = upper - lower;
            placement.voxel_size[i] = (upper - lower) / self.resolution as f64;
            placement.center[i] = (lower + upper) * 0.5;
        }
        placement
    }
}

/// Bin index of `value` along one axis, or `None` when it falls outside the edges.
fn bin_index(value: f64, edges: &[f64]) -> Option<usize> {
    let bins = edges.len() - 1;
    let lower = edges[0];
    let upper = edges[bins];

    // NaN fails both comparisons and is dropped here.
    if !(value >= lower && value <= upper) {
        return None;
    }
    if value == upper {
        return Some(bins - 1);
    }

    // Number of edges <= value, minus one, matches a right-sided search.
    let index = edges.partition_point(|&edge| edge <= value) - 1;
    Some(index.min(bins - 1))
}

fn flat_index(point: &[f64; 3], edges: &[Vec<f64>; 3], resolution: usize) -> Option<usize> {
    let ix = bin_index(point[0], &edges[0])?;
    let iy = bin_index(point[1], &edges[1])?;
    let iz = bin_index(point[2], &edges[2])?;
    Some((ix * resolution + iy) * resolution + iz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bins_follow_half_open_convention() {
        let edges = linspace(-1.0, 1.0, 5); // -1, -0.5, 0, 0.5, 1
        assert_eq!(bin_index(-1.0, &edges), Some(0));
        assert_eq!(bin_index(-0.5, &edges), Some(1));
        assert_eq!(bin_index(0.0, &edges), Some(2));
        assert_eq!(bin_index(0.49, &edges), Some(2));
        assert_eq!(bin_index(1.0, &edges), Some(3));
        assert_eq!(bin_index(1.0001, &edges), None);
        assert_eq!(bin_index(-1.0001, &edges), None);
        assert_eq!(bin_index(f64::NAN, &edges), None);
    }

    #[test]
    fn out_of_range_points_are_dropped() {
        let points = [
            [0.1, 0.1, 0.1],
            [-0.9, 0.9, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 0.0, -1.5],
        ];
        let grid = DensityGrid::from_points(&points, [1.0, 1.0, 1.0], 4);

        assert_eq!(grid.total(), 2);
        assert_eq!(grid.get(2, 2, 2), 1);
        assert_eq!(grid.get(0, 3, 2), 1);
    }

    #[test]
    fn ranges_apply_per_axis() {
        let points = [[1.5, 0.0, 0.0], [0.0, 1.5, 0.0]];
        let grid = DensityGrid::from_points(&points, [2.0, 1.0, 1.0], 2);
        assert_eq!(grid.total(), 1);
        assert_eq!(grid.edges()[0], vec![-2.0, 0.0, 2.0]);
        assert_eq!(grid.edges()[1], vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn parallel_chunks_match_point_count() {
        let points: Vec<[f64; 3]> = (0..(HISTOGRAM_CHUNK_SIZE * 3 + 17))
            .map(|i| {
                let t = (i % 200) as f64 / 100.0 - 1.0;
                [t, -t, t * 0.5]
            })
            .collect();
        let grid = DensityGrid::from_points(&points, [1.0, 1.0, 1.0], 8);
        assert_eq!(grid.total(), points.len() as u64);
    }

    #[test]
    fn empty_cloud_gives_empty_grid() {
        let grid = DensityGrid::from_points(&[], [1.0, 1.0, 1.0], 3);
        assert_eq!(grid.counts().len(), 27);
        assert_eq!(grid.total(), 0);
        assert!(grid.normalized().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn normalized_peaks_at_one() {
        let points = [[0.1, 0.1, 0.1], [0.1, 0.1, 0.1], [-0.9, -0.9, -0.9]];
        let grid = DensityGrid::from_points(&points, [1.0, 1.0, 1.0], 2);
        let normalized = grid.normalized();
        assert_eq!(normalized.iter().cloned().fold(0.0f32, f32::max), 1.0);
        assert!(normalized.contains(&0.5));
    }

    #[test]
    fn placement_describes_the_binned_box() {
        let grid = DensityGrid::from_points(&[], [2.0, 1.0, 0.5], 4);
        let placement = grid.placement();
        assert_eq!(placement.origin, [-2.0, -1.0, -0.5]);
        assert_eq!(placement.world_size, [4.0, 2.0, 1.0]);
        assert_relative_eq!(placement.voxel_size[0], 1.0);
        assert_relative_eq!(placement.voxel_size[2], 0.25);
        assert_eq!(placement.center, [0.0, 0.0, 0.0]);
    }
}

//! Axis-aligned sum projections of a density grid.

use crate::error::Result;
use crate::histogram::DensityGrid;
use image::{GrayImage, Luma};
use std::path::{Path, PathBuf};

/// One 2D projection. `values[i * height + j]` is the sum along the dropped axis
/// for index `i` on the first kept axis and `j` on the second.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub label: &'static str,
    pub width: usize,
    pub height: usize,
    pub values: Vec<u64>,
    /// `[first_min, first_max, second_min, second_max]`
    pub extent: [f64; 4],
}

/// XY (summed over z), XZ (summed over y) and YZ (summed over x) projections.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityProjections {
    pub xy: Projection,
    pub xz: Projection,
    pub yz: Projection,
}

impl DensityProjections {
    pub fn from_grid(grid: &DensityGrid) -> Self {
        let n = grid.resolution();
        let edges = grid.edges();
        let extent = |a: usize, b: usize| [edges[a][0], edges[a][n], edges[b][0], edges[b][n]];

        let mut xy = vec![0u64; n * n];
        let mut xz = vec![0u64; n * n];
        let mut yz = vec![0u64; n * n];

        for ix in 0..n {
            for iy in 0..n {
                for iz in 0..n {
                    let count = grid.get(ix, iy, iz);
                    xy[ix * n + iy] += count;
                    xz[ix * n + iz] += count;
                    yz[iy * n + iz] += count;
                }
            }
        }

        let projection = |label, values, extent| Projection {
            label,
            width: n,
            height: n,
            values,
            extent,
        };

        Self {
            xy: projection("xy", xy, extent(0, 1)),
            xz: projection("xz", xz, extent(0, 2)),
            yz: projection("yz", yz, extent(1, 2)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projection> {
        [&self.xy, &self.xz, &self.yz].into_iter()
    }

    /// Write `{stem}_xy.png`, `{stem}_xz.png` and `{stem}_yz.png`.
    pub fn save_png(&self, stem: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(3);
        for projection in self.iter() {
            let path = suffixed(stem, projection.label);
            projection.to_image().save(&path)?;
            log::debug!("Saved {} projection to {}", projection.label, path.display());
            written.push(path);
        }
        Ok(written)
    }
}

impl Projection {
    /// Grayscale image: black for empty, white for the densest pixel.
    /// The first axis runs left to right, the second axis bottom to top.
    pub fn to_image(&self) -> GrayImage {
        let max = self.values.iter().copied().max().unwrap_or(0);
        let mut image = GrayImage::new(self.width as u32, self.height as u32);

        for i in 0..self.width {
            for j in 0..self.height {
                let value = self.values[i * self.height + j];
                let level = if max == 0 {
                    0
                } else {
                    ((value as f64 / max as f64) * 255.0).round() as u8
                };
                let row = (self.height - 1 - j) as u32;
                image.put_pixel(i as u32, row, Luma([level]));
            }
        }

        image
    }

    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }
}

fn suffixed(stem: &Path, label: &str) -> PathBuf {
    let name = stem
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    stem.with_file_name(format!("{name}_{label}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> DensityGrid {
        let points = [
            [0.5, 0.5, -0.5],
            [0.5, -0.5, -0.5],
            [-0.5, -0.5, -0.5],
            [-0.5, -0.5, 0.5],
        ];
        DensityGrid::from_points(&points, [1.0, 1.0, 1.0], 2)
    }

    #[test]
    fn projections_preserve_mass() {
        let grid = sample_grid();
        let projections = DensityProjections::from_grid(&grid);
        for projection in projections.iter() {
            assert_eq!(projection.total(), grid.total());
        }
    }

    #[test]
    fn projections_sum_along_the_dropped_axis() {
        let projections = DensityProjections::from_grid(&sample_grid());
        // xy[ix][iy] sums z
        assert_eq!(projections.xy.values, vec![2, 0, 1, 1]);
        // xz[ix][iz] sums y
        assert_eq!(projections.xz.values, vec![1, 1, 2, 0]);
        // yz[iy][iz] sums x
        assert_eq!(projections.yz.values, vec![2, 1, 1, 0]);
        assert_eq!(projections.xz.extent, [-1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn image_puts_second_axis_upward() {
        let projections = DensityProjections::from_grid(&sample_grid());
        let image = projections.xy.to_image();
        // xy[0][0] = 2 is the maximum: left column, bottom row.
        assert_eq!(image.get_pixel(0, 1)[0], 255);
        assert_eq!(image.get_pixel(0, 0)[0], 0);
        assert_eq!(image.get_pixel(1, 0)[0], 128);
    }

    #[test]
    fn writes_three_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("cloud");
        let written = DensityProjections::from_grid(&sample_grid())
            .save_png(&stem)
            .unwrap();
        assert_eq!(written.len(), 3);
        assert!(dir.path().join("cloud_xy.png").exists());
        assert!(dir.path().join("cloud_yz.png").exists());
    }
}

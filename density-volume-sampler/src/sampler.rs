//! Rejection sampling of 3D point clouds from a radial profile.

use crate::error::{Result, SamplerError};
use crate::histogram::DensityGrid;
use crate::npy_writer::write_array;
use crate::precision::{ArrayData, Precision};
use crate::profile::RadialProfile;
use crate::projection::DensityProjections;
use crate::quadrature::{linspace, trapezoid};
use constants::grid::{DEFAULT_RANGE, DEFAULT_RESOLUTION};
use constants::sampling::{
    DEFAULT_R_MAX, DEFAULT_SAMPLE_COUNT, PROGRESS_UPDATE_INTERVAL, QUADRATURE_POINTS,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

/// Draws points whose radial distribution follows a profile, then bins them.
///
/// The profile is weighted by the spherical Jacobian `r²` and normalised once at
/// construction. Radii are proposed uniformly on `[0, r_max)` and accepted against
/// the maximum of the weighted profile on the quadrature grid. Directions are
/// uniform over the sphere; each axis is then stretched by its anisotropy factor.
pub struct RadialPointSampler<P> {
    profile: P,
    r_max: f64,
    r_grid: Vec<f64>,
    norm_constant: f64,
    envelope: f64,
    scale: [f64; 3],
    max_attempts: Option<u64>,
    rng: StdRng,
    points: Option<Vec<[f64; 3]>>,
    density: Option<DensityGrid>,
}

impl<P: RadialProfile> RadialPointSampler<P> {
    /// Sampler over `[0, r_max]`.
    ///
    /// Fails with [`SamplerError::DegenerateProfile`] when `∫ profile(r) r² dr` over the
    /// quadrature grid is not positive and finite.
    pub fn new(profile: P, r_max: f64) -> Result<Self> {
        if !(r_max.is_finite() && r_max > 0.0) {
            return Err(SamplerError::InvalidArgument(format!(
                "r_max must be positive and finite, got {r_max}"
            )));
        }

        let r_grid = linspace(0.0, r_max, QUADRATURE_POINTS);
        let func_vals: Vec<f64> = r_grid
            .iter()
            .map(|&r| profile.weight(r) * r * r)
            .collect();
        let norm_constant = trapezoid(&func_vals, &r_grid);

        if !(norm_constant.is_finite() && norm_constant > 0.0) {
            return Err(SamplerError::DegenerateProfile { norm_constant });
        }

        let envelope = func_vals
            .iter()
            .map(|v| v / norm_constant)
            .fold(f64::NEG_INFINITY, f64::max);

        log::debug!(
            "Normalised radial profile over [0, {}]: integral {:.6e}, envelope {:.6e}",
            r_max,
            norm_constant,
            envelope
        );

        Ok(Self {
            profile,
            r_max,
            r_grid,
            norm_constant,
            envelope,
            scale: [1.0; 3],
            max_attempts: None,
            rng: StdRng::from_entropy(),
            points: None,
            density: None,
        })
    }

    /// Sampler over the default radius.
    pub fn with_default_radius(profile: P) -> Result<Self> {
        Self::new(profile, DEFAULT_R_MAX)
    }

    /// Reseed the generator for reproducible clouds.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_scale(mut self, a: f64, b: f64, c: f64) -> Self {
        self.scale = [a, b, c];
        self
    }

    /// Give up with [`SamplerError::EnvelopeTooTight`] after this many proposals.
    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Anisotropy factors applied to x, y and z of subsequently sampled points.
    pub fn set_scale(&mut self, a: f64, b: f64, c: f64) {
        self.scale = [a, b, c];
    }

    pub fn r_max(&self) -> f64 {
        self.r_max
    }

    pub fn r_grid(&self) -> &[f64] {
        &self.r_grid
    }

    pub fn norm_constant(&self) -> f64 {
        self.norm_constant
    }

    pub fn envelope(&self) -> f64 {
        self.envelope
    }

    pub fn scale(&self) -> [f64; 3] {
        self.scale
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }

    /// Acceptance weight `profile(r) r² / norm_constant`. Not a density in `r` on its own.
    pub fn normalized_profile(&self, radius: f64) -> f64 {
        self.profile.weight(radius) * radius * radius / self.norm_constant
    }

    pub fn points(&self) -> Option<&[[f64; 3]]> {
        self.points.as_deref()
    }

    pub fn density(&self) -> Option<&DensityGrid> {
        self.density.as_ref()
    }

    /// Draw exactly `count` points, replacing any previous cloud.
    ///
    /// Without an attempt cap this loops until enough radii are accepted.
    pub fn sample_points(&mut self, count: usize) -> Result<&[[f64; 3]]> {
        self.sample_points_with_progress(count, |_| {})
    }

    /// [`sample_points`](Self::sample_points) with the default count.
    pub fn sample_default_points(&mut self) -> Result<&[[f64; 3]]> {
        self.sample_points(DEFAULT_SAMPLE_COUNT)
    }

    /// Like [`sample_points`](Self::sample_points), reporting the accepted count
    /// periodically and once more when done.
    pub fn sample_points_with_progress<F>(
        &mut self,
        count: usize,
        mut progress: F,
    ) -> Result<&[[f64; 3]]>
    where
        F: FnMut(usize),
    {
        if count == 0 {
            return Err(SamplerError::InvalidArgument(
                "number of points must be positive".to_string(),
            ));
        }

        let radii = self.accept_radii(count, &mut progress)?;
        let [a, b, c] = self.scale;

        let points: Vec<[f64; 3]> = radii
            .into_iter()
            .map(|r| {
                let theta = (1.0 - 2.0 * self.rng.gen_range(0.0f64..1.0)).acos();
                let phi = 2.0 * PI * self.rng.gen_range(0.0f64..1.0);
                [
                    r * theta.sin() * phi.cos() * a,
                    r * theta.sin() * phi.sin() * b,
                    r * theta.cos() * c,
                ]
            })
            .collect();

        progress(count);
        log::debug!("Sampled {} points (scale {:?})", points.len(), self.scale);

        let points = self.points.insert(points);
        Ok(points.as_slice())
    }

    fn accept_radii<F>(&mut self, count: usize, progress: &mut F) -> Result<Vec<f64>>
    where
        F: FnMut(usize),
    {
        let mut radii = Vec::with_capacity(count);
        let mut attempts: u64 = 0;

        while radii.len() < count {
            if let Some(limit) = self.max_attempts {
                if attempts >= limit {
                    return Err(SamplerError::EnvelopeTooTight {
                        accepted: radii.len(),
                        attempts,
                    });
                }
            }
            attempts += 1;

            let radius = self.rng.gen_range(0.0..self.r_max);
            let density = self.normalized_profile(radius);
            if self.rng.gen_range(0.0..self.envelope) < density {
                radii.push(radius);
                if radii.len() % PROGRESS_UPDATE_INTERVAL == 0 {
                    progress(radii.len());
                }
            }
        }

        log::debug!(
            "Accepted {} radii in {} proposals ({:.1}% acceptance)",
            count,
            attempts,
            count as f64 / attempts as f64 * 100.0
        );
        Ok(radii)
    }

    /// Bin the current cloud into `resolution` bins per axis over `[-ranges[i], ranges[i]]`.
    ///
    /// Points outside the ranges are not counted. The grid is kept on the sampler and
    /// also returned when `return_value` is set.
    pub fn compute_density(
        &mut self,
        ranges: [f64; 3],
        resolution: usize,
        return_value: bool,
    ) -> Result<Option<&DensityGrid>> {
        let points = self.points.as_deref().ok_or(SamplerError::NoPoints)?;

        if resolution == 0 {
            return Err(SamplerError::InvalidArgument(
                "resolution must be at least 1".to_string(),
            ));
        }
        if let Some(bad) = ranges.iter().find(|r| !(r.is_finite() && **r > 0.0)) {
            return Err(SamplerError::InvalidArgument(format!(
                "ranges must be positive and finite, got {bad}"
            )));
        }

        let grid = DensityGrid::from_points(points, ranges, resolution);
        let dropped = points.len() as u64 - grid.total();
        if dropped > 0 {
            log::warn!(
                "{} of {} points fell outside the binned range {:?} and were dropped",
                dropped,
                points.len(),
                ranges
            );
        }

        let grid = self.density.insert(grid);
        Ok(return_value.then_some(&*grid))
    }

    /// [`compute_density`](Self::compute_density) with unit ranges and the default resolution.
    pub fn compute_default_density(&mut self) -> Result<Option<&DensityGrid>> {
        self.compute_density([DEFAULT_RANGE; 3], DEFAULT_RESOLUTION, false)
    }

    /// XY, XZ and YZ sum projections of the current grid for visual inspection.
    pub fn plot_density(&self) -> Result<DensityProjections> {
        let grid = self.density.as_ref().ok_or(SamplerError::NoDensity)?;
        Ok(DensityProjections::from_grid(grid))
    }

    /// Write the grid cast to `precision` ("float16", "float32" or "float64") to
    /// `{filename}.npy`, or `{filename}.npz` when compressed.
    pub fn save_density(
        &self,
        filename: impl AsRef<Path>,
        precision: &str,
        compressed: bool,
    ) -> Result<PathBuf> {
        if self.density.is_none() {
            return Err(SamplerError::NoDensity);
        }
        let precision: Precision = precision.parse()?;
        self.save_density_as(filename, precision, compressed)
    }

    /// Typed form of [`save_density`](Self::save_density).
    pub fn save_density_as(
        &self,
        filename: impl AsRef<Path>,
        precision: Precision,
        compressed: bool,
    ) -> Result<PathBuf> {
        let grid = self.density.as_ref().ok_or(SamplerError::NoDensity)?;
        let data = ArrayData::cast(&grid.to_f64(), precision);
        let path = write_array(filename.as_ref(), &grid.shape(), &data, compressed)?;
        log::info!(
            "Saved {} ({}, {})",
            path.display(),
            precision,
            if compressed { "deflated" } else { "raw" }
        );
        Ok(path)
    }
}

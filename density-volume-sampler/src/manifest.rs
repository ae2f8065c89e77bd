//! Volume manifest generation for host-side import of exported density grids.

use crate::error::Result;
use crate::histogram::GridPlacement;
use crate::precision::Precision;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Sampling parameters that produced the point cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingInfo {
    /// Human readable profile description.
    pub profile: String,
    pub r_max: f64,
    /// `∫ profile(r) r² dr` over the quadrature grid.
    pub norm_constant: f64,
    /// Rejection envelope used while sampling.
    pub envelope: f64,
    /// Anisotropy factors for x, y and z.
    pub scale: [f64; 3],
    pub seed: Option<u64>,
    /// Points drawn from the profile.
    pub requested_points: usize,
}

/// Binned grid description and files written for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeInfo {
    /// Array file name relative to the manifest.
    pub array_file: String,
    pub shape: [usize; 3],
    pub ranges: [f64; 3],
    pub precision: Precision,
    pub compressed: bool,
    /// Points that landed inside the binned range; the grid sums to this.
    pub binned_points: u64,
    /// Count in the densest voxel, used to normalise for fog volumes.
    pub max_count: u64,
    pub placement: GridPlacement,
    /// Float32 copy scaled so the densest voxel is 1, if one was written.
    pub normalized_file: Option<String>,
    /// Projection images relative to the manifest, if any were written.
    pub projections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeManifest {
    pub name: String,
    pub sampling: SamplingInfo,
    pub volume: VolumeInfo,
}

impl VolumeManifest {
    pub fn dropped_points(&self) -> u64 {
        self.sampling.requested_points as u64 - self.volume.binned_points
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Writes manifests alongside their array files.
pub struct ManifestGenerator {
    /// Base output directory for all generated files.
    output_dir: PathBuf,
}

impl ManifestGenerator {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Write `{name}.json` into the output directory.
    pub fn write(&self, manifest: &VolumeManifest) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let manifest_path = self.output_dir.join(format!("{}.json", manifest.name));
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(&manifest_path, manifest_json)?;

        log::info!("Generated volume manifest: {}", manifest_path.display());
        self.log_summary(manifest);
        Ok(manifest_path)
    }

    /// Write an index of every manifest produced by a batch run.
    pub fn write_index(&self, manifests: &[VolumeManifest]) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let index: Vec<String> = manifests
            .iter()
            .map(|m| format!("{}.json", m.name))
            .collect();
        let index_path = self.output_dir.join("manifest.json");
        fs::write(&index_path, serde_json::to_string_pretty(&index)?)?;
        log::info!("Generated batch index: {}", index_path.display());
        Ok(index_path)
    }

    fn log_summary(&self, manifest: &VolumeManifest) {
        let volume = &manifest.volume;
        log::info!("Manifest summary for {}:", manifest.name);
        log::info!("  Profile: {}", manifest.sampling.profile);
        log::info!(
            "  Points: {} sampled, {} binned ({} dropped)",
            manifest.sampling.requested_points,
            volume.binned_points,
            manifest.dropped_points()
        );
        log::info!(
            "  Grid: {}x{}x{} over ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}, {:.2})",
            volume.shape[0],
            volume.shape[1],
            volume.shape[2],
            volume.placement.origin[0],
            volume.placement.origin[1],
            volume.placement.origin[2],
            volume.placement.origin[0] + volume.placement.world_size[0],
            volume.placement.origin[1] + volume.placement.world_size[1],
            volume.placement.origin[2] + volume.placement.world_size[2],
        );
    }
}

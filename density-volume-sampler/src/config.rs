//! Run configuration for batch volume generation.

use crate::error::{Result, SamplerError};
use crate::precision::Precision;
use crate::profile::ProfileSpec;
use constants::array_file::{NPY_EXTENSION, NPZ_EXTENSION};
use constants::grid::{DEFAULT_RANGE, DEFAULT_RESOLUTION};
use constants::sampling::{DEFAULT_R_MAX, DEFAULT_SAMPLE_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// One density volume to sample, bin and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeJob {
    /// Output stem for the array, manifest and projection files.
    pub name: String,
    pub profile: ProfileSpec,
    pub r_max: f64,
    /// Anisotropy factors for x, y and z.
    pub scale: [f64; 3],
    pub samples: usize,
    pub resolution: usize,
    /// Half-extent of the binned region per axis.
    pub ranges: [f64; 3],
    pub precision: Precision,
    pub compressed: bool,
    pub seed: Option<u64>,
    /// Cap on rejection proposals; unbounded when absent.
    pub max_attempts: Option<u64>,
    /// Also write XY/XZ/YZ projection PNGs.
    pub projections: bool,
    /// Also write a float32 copy normalised to a peak of 1 for fog volume import.
    pub normalized: bool,
}

impl Default for VolumeJob {
    fn default() -> Self {
        Self {
            name: "density".to_string(),
            profile: ProfileSpec::default(),
            r_max: DEFAULT_R_MAX,
            scale: [1.0; 3],
            samples: DEFAULT_SAMPLE_COUNT,
            resolution: DEFAULT_RESOLUTION,
            ranges: [DEFAULT_RANGE; 3],
            precision: Precision::default(),
            compressed: false,
            seed: None,
            max_attempts: None,
            projections: false,
            normalized: false,
        }
    }
}

impl VolumeJob {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| {
            Err(SamplerError::InvalidArgument(format!("job '{}': {}", self.name, reason)))
        };

        if self.name.is_empty() || self.name.contains(['/', '\\']) {
            return invalid("name must be a plain file stem".to_string());
        }
        if self.name == "manifest" {
            return invalid("'manifest' is reserved for the batch index".to_string());
        }
        if let Err(reason) = self.profile.validate() {
            return invalid(reason);
        }
        if !(self.r_max.is_finite() && self.r_max > 0.0) {
            return invalid(format!("r_max must be positive, got {}", self.r_max));
        }
        if self.scale.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return invalid(format!("scale factors must be positive, got {:?}", self.scale));
        }
        if self.samples == 0 {
            return invalid("samples must be positive".to_string());
        }
        if self.resolution == 0 {
            return invalid("resolution must be positive".to_string());
        }
        if self.ranges.iter().any(|r| !(r.is_finite() && *r > 0.0)) {
            return invalid(format!("ranges must be positive, got {:?}", self.ranges));
        }
        Ok(())
    }

    /// File names this job writes into the output directory.
    pub fn output_files(&self) -> Vec<String> {
        let extension = if self.compressed { NPZ_EXTENSION } else { NPY_EXTENSION };
        let mut files = vec![
            format!("{}.{}", self.name, extension),
            format!("{}.json", self.name),
        ];
        if self.normalized {
            files.push(format!("{}_normalized.{}", self.name, extension));
        }
        if self.projections {
            for label in ["xy", "xz", "yz"] {
                files.push(format!("{}_{}.png", self.name, label));
            }
        }
        files
    }

    /// True when every axis range covers the stretched sampling ball, so no point is dropped.
    pub fn ranges_enclose_samples(&self) -> bool {
        (0..3).all(|i| self.ranges[i] >= self.r_max * self.scale[i])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    pub jobs: Vec<VolumeJob>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("density_volumes")
}

impl RunConfig {
    /// Read and validate a JSON run configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs.is_empty() {
            return Err(SamplerError::InvalidArgument(
                "run configuration has no jobs".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut files = HashSet::new();
        for job in &self.jobs {
            job.validate()?;
            if !names.insert(job.name.as_str()) {
                return Err(SamplerError::InvalidArgument(format!(
                    "duplicate job name '{}'",
                    job.name
                )));
            }
            // Jobs run in parallel, so a shared file would be overwritten by whichever finishes last.
            for file in job.output_files() {
                if !files.insert(file.clone()) {
                    return Err(SamplerError::InvalidArgument(format!(
                        "job '{}' writes '{}', which another job also writes",
                        job.name, file
                    )));
                }
            }
        }
        Ok(())
    }
}

//! Volume generation pipeline: sample, bin, export and describe each job.

use crate::config::{RunConfig, VolumeJob};
use crate::error::{Result, SamplerError};
use crate::manifest::{ManifestGenerator, SamplingInfo, VolumeInfo, VolumeManifest};
use crate::npy_writer::{array_path, write_array};
use crate::precision::ArrayData;
use crate::profile::ProfileSpec;
use crate::sampler::RadialPointSampler;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Runs volume jobs into a shared output directory.
/// Independent jobs own independent samplers and run in parallel.
pub struct VolumeGenerator {
    /// Output directory for arrays, manifests and projections.
    output_dir: PathBuf,
    /// Progress display; `None` keeps the pipeline silent apart from logging.
    progress: Option<MultiProgress>,
}

impl VolumeGenerator {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            progress: None,
        }
    }

    /// Generator writing into the configuration's `output_dir`.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(&config.output_dir)
    }

    /// Show progress bars while sampling.
    pub fn with_progress(mut self) -> Self {
        self.progress = Some(MultiProgress::new());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Process every job of a run configuration and write the batch index.
    ///
    /// Files go to this generator's directory, not `config.output_dir`; build the
    /// generator with [`VolumeGenerator::from_config`] to honour the configured one.
    pub fn run(&self, config: &RunConfig) -> Result<Vec<VolumeManifest>> {
        config.validate()?;
        fs::create_dir_all(&self.output_dir)?;

        log::info!(
            "Generating {} density volume(s) into {}",
            config.jobs.len(),
            self.output_dir.display()
        );

        let manifests = config
            .jobs
            .par_iter()
            .map(|job| self.generate(job))
            .collect::<Result<Vec<_>>>()?;

        ManifestGenerator::new(&self.output_dir).write_index(&manifests)?;
        log::info!("Batch complete!");
        Ok(manifests)
    }

    /// Sample, bin and export a single job.
    pub fn generate(&self, job: &VolumeJob) -> Result<VolumeManifest> {
        job.validate()?;
        fs::create_dir_all(&self.output_dir)?;

        log::info!(
            "Sampling '{}': {} points from {} over r <= {}",
            job.name,
            job.samples,
            job.profile.describe(),
            job.r_max
        );

        let mut sampler = self.build_sampler(job)?;

        let pb = self.progress_bar(job.samples as u64);
        pb.set_message(format!("Sampling {}", job.name));
        sampler.sample_points_with_progress(job.samples, |accepted| {
            pb.set_position(accepted as u64)
        })?;
        pb.finish_with_message(format!("{} sampled", job.name));

        sampler.compute_density(job.ranges, job.resolution, false)?;

        let stem = self.output_dir.join(&job.name);
        let array_file = sampler.save_density_as(&stem, job.precision, job.compressed)?;

        let projections = if job.projections {
            sampler.plot_density()?.save_png(&stem)?
        } else {
            Vec::new()
        };

        let grid = sampler.density().ok_or(SamplerError::NoDensity)?;

        // Fog volumes are imported with the densest voxel at 1.
        let normalized_file = if job.normalized {
            let fog_stem = self.output_dir.join(format!("{}_normalized", job.name));
            let data = ArrayData::F32(grid.normalized());
            let path = write_array(&fog_stem, &grid.shape(), &data, job.compressed)?;
            log::info!("Saved {} (normalised float32)", path.display());
            Some(relative_name(&path))
        } else {
            None
        };

        let manifest = VolumeManifest {
            name: job.name.clone(),
            sampling: SamplingInfo {
                profile: job.profile.describe(),
                r_max: sampler.r_max(),
                norm_constant: sampler.norm_constant(),
                envelope: sampler.envelope(),
                scale: sampler.scale(),
                seed: job.seed,
                requested_points: job.samples,
            },
            volume: VolumeInfo {
                array_file: relative_name(&array_file),
                shape: grid.shape(),
                ranges: grid.ranges(),
                precision: job.precision,
                compressed: job.compressed,
                binned_points: grid.total(),
                max_count: grid.max(),
                placement: grid.placement(),
                normalized_file,
                projections: projections.iter().map(|p| relative_name(p)).collect(),
            },
        };

        debug_assert_eq!(array_file, array_path(&stem, job.compressed));
        ManifestGenerator::new(&self.output_dir).write(&manifest)?;
        Ok(manifest)
    }

    fn build_sampler(&self, job: &VolumeJob) -> Result<RadialPointSampler<ProfileSpec>> {
        let [a, b, c] = job.scale;
        let mut sampler =
            RadialPointSampler::new(job.profile.clone(), job.r_max)?.with_scale(a, b, c);
        if let Some(seed) = job.seed {
            sampler = sampler.with_seed(seed);
        }
        if let Some(max_attempts) = job.max_attempts {
            sampler = sampler.with_max_attempts(max_attempts);
        }
        Ok(sampler)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        let Some(multi) = &self.progress else {
            return ProgressBar::hidden();
        };

        let pb = multi.add(ProgressBar::new(len));
        let style = ProgressStyle::with_template(
            "[{bar:40.green/blue}] {pos}/{len} points ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("▉▊▋▌▍▎▏ ");
        pb.set_style(style);
        pb
    }
}

fn relative_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

//! Density volume generator entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use constants::grid::{DEFAULT_RANGE, DEFAULT_RESOLUTION};
use constants::sampling::{DEFAULT_R_MAX, DEFAULT_SAMPLE_COUNT};
use density_volume_sampler::{Precision, ProfileSpec, RunConfig, VolumeGenerator, VolumeJob};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "density-volume-sampler")]
#[command(about = "Sample radial density profiles into voxel grids for volume rendering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Hide progress bars
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a single volume from command line parameters
    Sample(SampleArgs),
    /// Generate every volume listed in a JSON run configuration
    Run(RunArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileKind {
    Constant,
    Gaussian,
    Exponential,
    Shell,
    PowerLaw,
}

#[derive(Args, Debug)]
struct SampleArgs {
    /// Output stem for the array, manifest and projections
    #[arg(short, long, default_value = "density")]
    name: String,

    /// Directory receiving all generated files
    #[arg(short, long, default_value = "density_volumes")]
    output_dir: PathBuf,

    /// Radial profile shape
    #[arg(long, value_enum, default_value = "constant")]
    profile: ProfileKind,

    /// Gaussian standard deviation
    #[arg(long, default_value = "1.0")]
    sigma: f64,

    /// Exponential decay length
    #[arg(long, default_value = "1.0")]
    decay: f64,

    /// Shell centre radius
    #[arg(long, default_value = "2.5")]
    shell_radius: f64,

    /// Shell thickness (standard deviation)
    #[arg(long, default_value = "0.25")]
    shell_width: f64,

    /// Power law exponent
    #[arg(long, default_value = "2.0")]
    exponent: f64,

    /// Upper bound of the sampled radius
    #[arg(long, default_value_t = DEFAULT_R_MAX)]
    r_max: f64,

    /// Anisotropy factors for x, y and z
    #[arg(long, num_args = 3, value_names = ["A", "B", "C"], default_values_t = [1.0, 1.0, 1.0])]
    scale: Vec<f64>,

    /// Number of points to draw
    #[arg(long, default_value_t = DEFAULT_SAMPLE_COUNT)]
    samples: usize,

    /// Bins per axis
    #[arg(long, default_value_t = DEFAULT_RESOLUTION)]
    resolution: usize,

    /// Half-extent of the binned region per axis
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [DEFAULT_RANGE; 3])]
    ranges: Vec<f64>,

    /// Export precision: float16, float32 or float64
    #[arg(long, default_value = "float32")]
    precision: String,

    /// Write a deflated .npz instead of .npy
    #[arg(long)]
    compressed: bool,

    /// Seed for reproducible clouds
    #[arg(long)]
    seed: Option<u64>,

    /// Give up after this many rejection proposals
    #[arg(long)]
    max_attempts: Option<u64>,

    /// Also write XY/XZ/YZ projection PNGs
    #[arg(long)]
    projections: bool,

    /// Also write a float32 copy normalised to a peak of 1
    #[arg(long)]
    normalized: bool,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON run configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Override the configured output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

impl SampleArgs {
    fn profile_spec(&self) -> ProfileSpec {
        match self.profile {
            ProfileKind::Constant => ProfileSpec::default(),
            ProfileKind::Gaussian => ProfileSpec::Gaussian { sigma: self.sigma },
            ProfileKind::Exponential => ProfileSpec::Exponential { decay: self.decay },
            ProfileKind::Shell => ProfileSpec::Shell {
                radius: self.shell_radius,
                width: self.shell_width,
            },
            ProfileKind::PowerLaw => ProfileSpec::PowerLaw {
                exponent: self.exponent,
            },
        }
    }

    fn into_job(self) -> Result<VolumeJob, Box<dyn std::error::Error>> {
        let precision: Precision = self.precision.parse()?;
        let triple = |values: &[f64], what: &str| -> Result<[f64; 3], String> {
            <[f64; 3]>::try_from(values).map_err(|_| format!("--{what} takes exactly three values"))
        };

        Ok(VolumeJob {
            profile: self.profile_spec(),
            scale: triple(&self.scale, "scale")?,
            ranges: triple(&self.ranges, "ranges")?,
            name: self.name,
            r_max: self.r_max,
            samples: self.samples,
            resolution: self.resolution,
            precision,
            compressed: self.compressed,
            seed: self.seed,
            max_attempts: self.max_attempts,
            projections: self.projections,
            normalized: self.normalized,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sample(args) => {
            let output_dir = args.output_dir.clone();
            let job = args.into_job()?;
            let generator = progress(VolumeGenerator::new(&output_dir), cli.quiet);
            let manifest = generator.generate(&job)?;
            log::info!(
                "Wrote {} ({} of {} points binned)",
                manifest.volume.array_file,
                manifest.volume.binned_points,
                manifest.sampling.requested_points
            );
        }
        Commands::Run(args) => {
            let mut config = RunConfig::load(&args.config)?;
            if let Some(output_dir) = args.output_dir {
                config.output_dir = output_dir;
            }
            let generator = progress(VolumeGenerator::from_config(&config), cli.quiet);
            let manifests = generator.run(&config)?;
            log::info!("Generated {} volume(s)", manifests.len());
        }
    }

    Ok(())
}

fn progress(generator: VolumeGenerator, quiet: bool) -> VolumeGenerator {
    if quiet { generator } else { generator.with_progress() }
}

//! Synthetic density volumes from radial probability profiles.
//!
//! A [`RadialPointSampler`] draws a point cloud whose radial distribution follows a
//! caller supplied profile, bins it into a regular voxel grid and exports the grid
//! as a NumPy array for sparse-volume encoders. [`VolumeGenerator`] runs the same
//! steps for batches of configured jobs and writes a JSON manifest per volume.

pub mod config;
pub mod error;
pub mod histogram;
pub mod manifest;
pub mod npy_writer;
pub mod pipeline;
pub mod precision;
pub mod profile;
pub mod projection;
pub mod quadrature;
pub mod sampler;

pub use config::{RunConfig, VolumeJob};
pub use error::{Result, SamplerError};
pub use histogram::{DensityGrid, GridPlacement};
pub use manifest::VolumeManifest;
pub use npy_writer::{LoadedArray, load_array};
pub use pipeline::VolumeGenerator;
pub use precision::{ArrayData, Precision};
pub use profile::{ProfileSpec, RadialProfile};
pub use projection::{DensityProjections, Projection};
pub use sampler::RadialPointSampler;

/// Read back an array written by [`RadialPointSampler::save_density`].
pub fn load_density(path: impl AsRef<std::path::Path>) -> Result<LoadedArray> {
    load_array(path.as_ref())
}

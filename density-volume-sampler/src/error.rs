//! Error types for sampling, binning and export operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplerError {
    /// The r²-weighted profile integral over [0, r_max] is not a positive finite number.
    #[error("radial profile has no usable normalisation (integral = {norm_constant})")]
    DegenerateProfile { norm_constant: f64 },
    #[error("points have not been sampled yet")]
    NoPoints,
    #[error("density has not been computed yet")]
    NoDensity,
    #[error("invalid float precision '{0}' (expected float16, float32 or float64)")]
    InvalidPrecision(String),
    /// Raised only when a maximum attempt count was configured.
    #[error("rejection sampling accepted {accepted} points in {attempts} attempts before giving up")]
    EnvelopeTooTight { accepted: usize, attempts: u64 },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("malformed array file: {0}")]
    MalformedArray(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SamplerError>;

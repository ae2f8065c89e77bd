/// Number of evenly spaced radii used for the normalisation integral and envelope
pub const QUADRATURE_POINTS: usize = 1000;

/// Default upper bound of the sampled radius
pub const DEFAULT_R_MAX: f64 = 5.0;

/// Default number of accepted points per sampling call
pub const DEFAULT_SAMPLE_COUNT: usize = 10_000;

/// Accepted points between progress callbacks
pub const PROGRESS_UPDATE_INTERVAL: usize = 1_000;

/// Default number of bins per axis
pub const DEFAULT_RESOLUTION: usize = 10;

/// Default half-extent of the binned region on every axis
pub const DEFAULT_RANGE: f64 = 1.0;

/// Points per parallel histogram chunk
pub const HISTOGRAM_CHUNK_SIZE: usize = 25_000;

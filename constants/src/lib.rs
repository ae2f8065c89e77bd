//! Shared configuration for density volume generation

pub mod array_file;
pub mod grid;
pub mod sampling;

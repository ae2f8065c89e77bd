//! Floating point precision of exported density arrays.

use crate::error::SamplerError;
use half::f16;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Float16,
    #[default]
    Float32,
    Float64,
}

impl Precision {
    /// Token used on the command line and in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Float16 => "float16",
            Precision::Float32 => "float32",
            Precision::Float64 => "float64",
        }
    }

    /// NumPy dtype descriptor (little-endian).
    pub fn descr(&self) -> &'static str {
        match self {
            Precision::Float16 => "<f2",
            Precision::Float32 => "<f4",
            Precision::Float64 => "<f8",
        }
    }

    pub fn from_descr(descr: &str) -> Option<Self> {
        match descr {
            "<f2" => Some(Precision::Float16),
            "<f4" => Some(Precision::Float32),
            "<f8" => Some(Precision::Float64),
            _ => None,
        }
    }

    pub fn byte_width(&self) -> usize {
        match self {
            Precision::Float16 => 2,
            Precision::Float32 => 4,
            Precision::Float64 => 8,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Precision {
    type Err = SamplerError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "float16" => Ok(Precision::Float16),
            "float32" => Ok(Precision::Float32),
            "float64" => Ok(Precision::Float64),
            other => Err(SamplerError::InvalidPrecision(other.to_string())),
        }
    }
}

/// Values cast to one of the supported precisions.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    F16(Vec<f16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl ArrayData {
    /// Narrowing cast. Values beyond the target range or precision are rounded.
    pub fn cast(values: &[f64], precision: Precision) -> Self {
        match precision {
            Precision::Float16 => ArrayData::F16(values.iter().map(|&v| f16::from_f64(v)).collect()),
            Precision::Float32 => ArrayData::F32(values.iter().map(|&v| v as f32).collect()),
            Precision::Float64 => ArrayData::F64(values.to_vec()),
        }
    }

    pub fn precision(&self) -> Precision {
        match self {
            ArrayData::F16(_) => Precision::Float16,
            ArrayData::F32(_) => Precision::Float32,
            ArrayData::F64(_) => Precision::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayData::F16(values) => values.len(),
            ArrayData::F32(values) => values.len(),
            ArrayData::F64(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widen back to f64 for inspection.
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            ArrayData::F16(values) => values.iter().map(|v| v.to_f64()).collect(),
            ArrayData::F32(values) => values.iter().map(|&v| v as f64).collect(),
            ArrayData::F64(values) => values.clone(),
        }
    }

    /// Little-endian byte image of the values.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len() * self.precision().byte_width());
        match self {
            ArrayData::F16(values) => {
                for value in values {
                    bytes.extend_from_slice(&value.to_le_bytes());
                }
            }
            ArrayData::F32(values) => {
                for value in values {
                    bytes.extend_from_slice(&value.to_le_bytes());
                }
            }
            ArrayData::F64(values) => {
                for value in values {
                    bytes.extend_from_slice(&value.to_le_bytes());
                }
            }
        }
        bytes
    }

    /// Inverse of [`ArrayData::to_le_bytes`]. Trailing partial elements are rejected.
    pub fn from_le_bytes(bytes: &[u8], precision: Precision) -> Option<Self> {
        let width = precision.byte_width();
        if bytes.len() % width != 0 {
            return None;
        }

        let data = match precision {
            Precision::Float16 => ArrayData::F16(
                bytes
                    .chunks_exact(2)
                    .map(|c| f16::from_le_bytes([c[0], c[1]]))
                    .collect(),
            ),
            Precision::Float32 => ArrayData::F32(
                bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            Precision::Float64 => ArrayData::F64(
                bytes
                    .chunks_exact(8)
                    .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                    .collect(),
            ),
        };
        Some(data)
    }
}

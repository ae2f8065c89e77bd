//! Radial density profiles.

use serde::{Deserialize, Serialize};

/// Relative density weight as a function of radius.
/// Implemented for every `Fn(f64) -> f64`, so plain closures can be sampled directly.
pub trait RadialProfile {
    fn weight(&self, radius: f64) -> f64;
}

impl<F> RadialProfile for F
where
    F: Fn(f64) -> f64,
{
    fn weight(&self, radius: f64) -> f64 {
        self(radius)
    }
}

/// Built-in profiles that can be described in a run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileSpec {
    /// Same weight at every radius; the sampled cloud fills the ball uniformly.
    Constant {
        #[serde(default = "default_constant_value")]
        value: f64,
    },
    /// `exp(-r² / 2σ²)`
    Gaussian { sigma: f64 },
    /// `exp(-r / decay)`; a hydrogen 1s probability density has decay = a0 / 2.
    Exponential { decay: f64 },
    /// Gaussian shell of the given width centred on `radius`.
    Shell { radius: f64, width: f64 },
    /// `r^exponent`
    PowerLaw { exponent: f64 },
}

fn default_constant_value() -> f64 {
    1.0
}

impl Default for ProfileSpec {
    fn default() -> Self {
        ProfileSpec::Constant {
            value: default_constant_value(),
        }
    }
}

impl ProfileSpec {
    /// Check shape parameters that would make the profile meaningless.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            ProfileSpec::Constant { value } if !(value.is_finite() && value > 0.0) => {
                Err(format!("constant profile value must be positive, got {value}"))
            }
            ProfileSpec::Gaussian { sigma } if !(sigma.is_finite() && sigma > 0.0) => {
                Err(format!("gaussian sigma must be positive, got {sigma}"))
            }
            ProfileSpec::Exponential { decay } if !(decay.is_finite() && decay > 0.0) => {
                Err(format!("exponential decay must be positive, got {decay}"))
            }
            ProfileSpec::Shell { width, .. } if !(width.is_finite() && width > 0.0) => {
                Err(format!("shell width must be positive, got {width}"))
            }
            ProfileSpec::PowerLaw { exponent } if !exponent.is_finite() => {
                Err(format!("power law exponent must be finite, got {exponent}"))
            }
            _ => Ok(()),
        }
    }

    /// Short human readable description used in logs and manifests.
    pub fn describe(&self) -> String {
        match self {
            ProfileSpec::Constant { value } => format!("constant({value})"),
            ProfileSpec::Gaussian { sigma } => format!("gaussian(sigma={sigma})"),
            ProfileSpec::Exponential { decay } => format!("exponential(decay={decay})"),
            ProfileSpec::Shell { radius, width } => {
                format!("shell(radius={radius}, width={width})")
            }
            ProfileSpec::PowerLaw { exponent } => format!("power_law(exponent={exponent})"),
        }
    }
}

impl RadialProfile for ProfileSpec {
    fn weight(&self, radius: f64) -> f64 {
        match *self {
            ProfileSpec::Constant { value } => value,
            ProfileSpec::Gaussian { sigma } => (-radius * radius / (2.0 * sigma * sigma)).exp(),
            ProfileSpec::Exponential { decay } => (-radius / decay).exp(),
            ProfileSpec::Shell { radius: centre, width } => {
                let offset = radius - centre;
                (-offset * offset / (2.0 * width * width)).exp()
            }
            ProfileSpec::PowerLaw { exponent } => {
                if exponent == 0.0 {
                    1.0
                } else {
                    radius.powf(exponent)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn closures_are_profiles() {
        let profile = |r: f64| 2.0 * r;
        assert_eq!(profile.weight(1.5), 3.0);
    }

    #[test]
    fn builtin_weights() {
        assert_eq!(ProfileSpec::default().weight(4.0), 1.0);
        assert_relative_eq!(
            ProfileSpec::Gaussian { sigma: 1.0 }.weight(1.0),
            (-0.5f64).exp()
        );
        assert_relative_eq!(
            ProfileSpec::Exponential { decay: 0.5 }.weight(1.0),
            (-2.0f64).exp()
        );
        assert_eq!(
            ProfileSpec::Shell {
                radius: 2.0,
                width: 0.3
            }
            .weight(2.0),
            1.0
        );
        assert_eq!(ProfileSpec::PowerLaw { exponent: 2.0 }.weight(3.0), 9.0);
        assert_eq!(ProfileSpec::PowerLaw { exponent: 0.0 }.weight(0.0), 1.0);
        assert_eq!(ProfileSpec::PowerLaw { exponent: 1.0 }.weight(0.0), 0.0);
    }

    #[test]
    fn rejects_bad_shape_parameters() {
        assert!(ProfileSpec::Gaussian { sigma: 0.0 }.validate().is_err());
        assert!(ProfileSpec::Exponential { decay: -1.0 }.validate().is_err());
        assert!(ProfileSpec::Constant { value: f64::NAN }.validate().is_err());
        assert!(ProfileSpec::Gaussian { sigma: 0.7 }.validate().is_ok());
    }

    #[test]
    fn deserializes_tagged_json() {
        let spec: ProfileSpec =
            serde_json::from_str(r#"{"kind": "shell", "radius": 2.5, "width": 0.25}"#).unwrap();
        assert_eq!(
            spec,
            ProfileSpec::Shell {
                radius: 2.5,
                width: 0.25
            }
        );

        let constant: ProfileSpec = serde_json::from_str(r#"{"kind": "constant"}"#).unwrap();
        assert_eq!(constant, ProfileSpec::default());
    }
}

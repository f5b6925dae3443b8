//! Input distributions for scenario draws.
//!
//! Every sampler takes the generator explicitly so parallel workers can own
//! independent seeded streams.

use clinic_common::{Validate, ValidationResult, Violations};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Distribution of one uncertain input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Distribution {
    /// Always `value`
    Fixed { value: f64 },
    Normal { mean: f64, std_dev: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
}

impl Distribution {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Self::Fixed { value } => value,
            Self::Normal { mean, std_dev } => sample_normal(rng, mean, std_dev),
            Self::Triangular { min, mode, max } => sample_triangular(rng, min, mode, max),
        }
    }

    /// Expected value.
    pub fn mean(&self) -> f64 {
        match *self {
            Self::Fixed { value } => value,
            Self::Normal { mean, .. } => mean,
            Self::Triangular { min, mode, max } => (min + mode + max) / 3.0,
        }
    }

    /// Validate under the field name `field`.
    pub fn validate_as(&self, field: &str) -> ValidationResult<()> {
        let mut v = Violations::new();
        match *self {
            Self::Fixed { value } => v.finite(field, value),
            Self::Normal { mean, std_dev } => {
                v.finite(&format!("{field}.mean"), mean);
                v.non_negative(&format!("{field}.std_dev"), std_dev);
            }
            Self::Triangular { min, mode, max } => {
                v.finite(&format!("{field}.min"), min);
                v.finite(&format!("{field}.max"), max);
                v.ensure(
                    min <= mode && mode <= max,
                    field,
                    format!("requires min <= mode <= max, got {min} / {mode} / {max}"),
                );
            }
        }
        v.finish()
    }
}

impl Validate for Distribution {
    fn validate(&self) -> ValidationResult<()> {
        self.validate_as("distribution")
    }
}

/// Box–Muller draw from N(mean, std_dev²).
pub fn sample_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    // gen() is in [0, 1); shift to (0, 1] so ln never sees zero.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

/// Inverse-CDF draw from the triangular distribution on `[min, max]`.
pub fn sample_triangular<R: Rng + ?Sized>(rng: &mut R, min: f64, mode: f64, max: f64) -> f64 {
    let range = max - min;
    if range <= 0.0 {
        return min;
    }
    let u: f64 = rng.gen();
    let fc = (mode - min) / range;
    let x = if u < fc {
        min + (u * range * (mode - min)).sqrt()
    } else {
        max - ((1.0 - u) * range * (max - mode)).sqrt()
    };
    x.clamp(min, max)
}

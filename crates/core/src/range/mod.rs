//! Range arithmetic for sliders and draggable numbers.
//!
//! A [`RangeSpec`] bounds a value to `[min, max]` and snaps it to multiples
//! of `step`. A [`DragSession`] converts horizontal drag deltas into values:
//! the unrounded position moves by `dx / sensitivity` and is kept between
//! steps so slow drags still accumulate; only the reported value is snapped.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RangeError {
    #[error("min {min} is greater than max {max}")]
    Inverted { min: f64, max: f64 },

    #[error("step must be positive, got {0}")]
    BadStep(f64),

    #[error("sensitivity must be positive, got {0}")]
    BadSensitivity(f64),
}

/// Bounds and granularity of a numeric control.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RangeSpec {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Pixels of drag per unit of value.
    pub sensitivity: f64,
}

impl Default for RangeSpec {
    fn default() -> Self {
        Self { min: 0.0, max: 10.0, step: 1.0, sensitivity: 10.0 }
    }
}

impl RangeSpec {
    /// Build and validate a range.
    pub fn new(min: f64, max: f64, step: f64, sensitivity: f64) -> Result<Self, RangeError> {
        let spec = Self { min, max, step, sensitivity };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), RangeError> {
        if self.min > self.max {
            return Err(RangeError::Inverted { min: self.min, max: self.max });
        }
        if self.step.is_nan() || self.step <= 0.0 {
            return Err(RangeError::BadStep(self.step));
        }
        if self.sensitivity.is_nan() || self.sensitivity <= 0.0 {
            return Err(RangeError::BadSensitivity(self.sensitivity));
        }
        Ok(())
    }

    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Clamp, then round to the nearest multiple of `step`.
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        (self.clamp(value) / self.step).round() * self.step
    }
}

/// State of one drag gesture.
#[derive(Debug, Clone)]
pub struct DragSession {
    spec: RangeSpec,
    raw: f64,
}

impl DragSession {
    /// Start dragging from the control's current value.
    pub fn start(spec: RangeSpec, value: f64) -> Result<Self, RangeError> {
        spec.validate()?;
        Ok(Self { spec, raw: value })
    }

    /// Apply a horizontal movement of `dx` pixels and return the snapped value.
    pub fn drag(&mut self, dx: f64) -> f64 {
        self.raw = self.spec.clamp(self.raw + dx / self.spec.sensitivity);
        (self.raw / self.spec.step).round() * self.spec.step
    }

    /// Unsnapped position, carried between drag events.
    #[must_use]
    pub fn raw(&self) -> f64 {
        self.raw
    }
}

//! Control laws for the turn and approach maneuvers.
//!
//! A three-tier bang-bang schedule on heading error and a linear speed ramp
//! on obstacle distance.

use crate::error::{GatiError, Result};
use serde::{Deserialize, Serialize};

/// Three-tier yaw rate schedule keyed on |heading error| (radians).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TurnSchedule {
    /// Errors above this use `coarse_rate`
    pub coarse_threshold: f32,
    pub coarse_rate: f32,
    /// Errors above this (and not coarse) use `medium_rate`
    pub medium_threshold: f32,
    pub medium_rate: f32,
    /// Everything smaller
    pub fine_rate: f32,
}

impl Default for TurnSchedule {
    fn default() -> Self {
        Self {
            coarse_threshold: 0.3,
            coarse_rate: 0.6,
            medium_threshold: 0.1,
            medium_rate: 0.3,
            fine_rate: 0.12,
        }
    }
}

impl TurnSchedule {
    /// Signed yaw rate for a normalized heading error.
    ///
    /// Positive error turns positive (counter-clockwise).
    pub fn rate_for(&self, error: f32) -> f32 {
        let magnitude = error.abs();
        let rate = if magnitude > self.coarse_threshold {
            self.coarse_rate
        } else if magnitude > self.medium_threshold {
            self.medium_rate
        } else {
            self.fine_rate
        };
        if error > 0.0 { rate } else { -rate }
    }

    pub fn validate(&self) -> Result<()> {
        let values = [
            self.coarse_threshold,
            self.coarse_rate,
            self.medium_threshold,
            self.medium_rate,
            self.fine_rate,
        ];
        if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(GatiError::Config(
                "turn schedule values must be finite and positive".into(),
            ));
        }
        if self.medium_threshold >= self.coarse_threshold {
            return Err(GatiError::Config(format!(
                "turn medium_threshold {} must be below coarse_threshold {}",
                self.medium_threshold, self.coarse_threshold
            )));
        }
        Ok(())
    }
}

/// Forward speed ramp for approaching an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApproachProfile {
    /// Stop once the closest valid range is at or below this (m)
    pub stop_distance: f32,
    /// Cruise speed when nothing is within `ramp_start` (m/s)
    pub max_speed: f32,
    /// Distance at which slowing down begins (m)
    pub ramp_start: f32,
}

impl Default for ApproachProfile {
    fn default() -> Self {
        Self {
            stop_distance: 0.4,
            max_speed: 0.5,
            ramp_start: 1.0,
        }
    }
}

impl ApproachProfile {
    /// Forward speed for the closest valid obstacle distance.
    ///
    /// Non-decreasing in `min_dist`; `f32::INFINITY` (nothing seen) cruises.
    pub fn speed_for(&self, min_dist: f32) -> f32 {
        if min_dist <= self.stop_distance {
            0.0
        } else if min_dist >= self.ramp_start {
            self.max_speed
        } else {
            let fraction =
                (min_dist - self.stop_distance) / (self.ramp_start - self.stop_distance);
            (self.max_speed * fraction).max(0.0)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.stop_distance.is_finite()
            && self.max_speed.is_finite()
            && self.ramp_start.is_finite())
        {
            return Err(GatiError::Config("approach values must be finite".into()));
        }
        if self.stop_distance < 0.0 || self.max_speed < 0.0 {
            return Err(GatiError::Config(
                "approach stop_distance and max_speed must not be negative".into(),
            ));
        }
        if self.ramp_start <= self.stop_distance {
            return Err(GatiError::Config(format!(
                "approach ramp_start {} must exceed stop_distance {}",
                self.ramp_start, self.stop_distance
            )));
        }
        Ok(())
    }
}

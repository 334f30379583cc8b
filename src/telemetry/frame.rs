//! Decoded telemetry snapshot types.

use std::time::Instant;

/// Number of samples in a complete sweep (one per degree).
pub const FULL_SWEEP_LEN: usize = 360;

/// Samples at or below this distance are sensor sentinels (meters).
pub const MIN_VALID_RANGE: f32 = 0.1;

/// Samples at or above this distance are out of sensor range (meters).
pub const MAX_VALID_RANGE: f32 = 20.0;

/// Robot pose at the sample instant.
///
/// `heading` is whatever the backend reports, which may be cumulative
/// (unwrapped) rather than confined to one turn.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

/// Frame-local linear velocity (m/s).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearVelocity {
    pub vx: f32,
    pub vy: f32,
}

/// Body angular velocity (rad/s), carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngularVelocity {
    pub wx: f32,
    pub wy: f32,
    pub wz: f32,
}

/// Ordered range samples, nominally one per degree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeSweep(Vec<f32>);

impl RangeSweep {
    pub fn new(samples: Vec<f32>) -> Self {
        Self(samples)
    }

    pub fn samples(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the sweep has exactly one sample per degree.
    pub fn is_full(&self) -> bool {
        self.0.len() == FULL_SWEEP_LEN
    }

    /// Samples strictly inside the trustworthy band.
    pub fn valid(&self) -> impl Iterator<Item = f32> + '_ {
        self.0
            .iter()
            .copied()
            .filter(|&r| r > MIN_VALID_RANGE && r < MAX_VALID_RANGE)
    }

    /// Closest valid obstacle, or `f32::INFINITY` when nothing valid was seen.
    pub fn min_valid(&self) -> f32 {
        self.valid().fold(f32::INFINITY, f32::min)
    }

    /// False if any valid sample is closer than `threshold`.
    pub fn has_clear_path(&self, threshold: f32) -> bool {
        self.valid().all(|r| r >= threshold)
    }
}

impl From<Vec<f32>> for RangeSweep {
    fn from(samples: Vec<f32>) -> Self {
        Self(samples)
    }
}

/// One decoded telemetry snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryFrame {
    pub pose: Pose,
    pub linear: LinearVelocity,
    /// Yaw rate as reported alongside the linear velocity (rad/s)
    pub yaw_rate: f32,
    pub angular: AngularVelocity,
    pub ranges: RangeSweep,
    pub received_at: Instant,
}

impl TelemetryFrame {
    /// True when vx, vy and yaw rate are all below `epsilon` in magnitude.
    pub fn is_still(&self, epsilon: f32) -> bool {
        self.linear.vx.abs() < epsilon
            && self.linear.vy.abs() < epsilon
            && self.yaw_rate.abs() < epsilon
    }
}

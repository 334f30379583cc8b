//! Shared utility functions

use std::f32::consts::{PI, TAU};

/// Normalize angle to (-π, π]
///
/// Total over finite input; NaN and infinities come back as NaN.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

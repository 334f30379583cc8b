//! Closed-loop maneuvers over telemetry and velocity commands.
//!
//! Every maneuver runs to completion on the calling thread:
//!
//! ```text
//! settle:   STOPPING ──(|vx|,|vy|,|ω| < ε)──▶ DONE
//! turn:     STOPPING ─▶ ALIGNING ──(|err| < tol)──▶ DONE
//! approach: APPROACHING ──(d ≤ stop)──▶ BRAKING ─▶ DONE
//! ```
//!
//! Each iteration re-sends the current setpoint, so isolated command loss is
//! absorbed. There is no timeout and no cancellation; any channel error aborts
//! the maneuver immediately.

use std::thread;
use std::time::Duration;

use tracing::Span;

use crate::command::{Command, CommandSink};
use crate::config::MotionConfig;
use crate::error::Result;
use crate::motion::profile::ApproachProfile;
use crate::telemetry::{FrameSource, TelemetryFrame};
use crate::utils::normalize_angle;

/// Result of a settle maneuver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleOutcome {
    /// Frames polled, including the one that met the threshold
    pub frames: u32,
}

/// Result of a relative turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnOutcome {
    pub start_heading: f32,
    pub target_heading: f32,
    /// Normalized error on the converging frame
    pub final_error: f32,
    /// Yaw commands issued before convergence
    pub iterations: u32,
}

/// Result of an approach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproachOutcome {
    /// Closest valid range on the stopping frame
    pub final_distance: f32,
    /// Drive commands issued, including the final zero
    pub iterations: u32,
}

/// Drives the robot through settle, turn and approach maneuvers.
pub struct MotionController<S, C> {
    source: S,
    sink: C,
    config: MotionConfig,
    /// Most recent frame; replaced on every read
    current: Option<TelemetryFrame>,
    span: Span,
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

impl<S: FrameSource, C: CommandSink> MotionController<S, C> {
    pub fn new(source: S, sink: C, config: MotionConfig, span: Span) -> Self {
        Self {
            source,
            sink,
            config,
            current: None,
            span,
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Last frame read, if any.
    pub fn current_frame(&self) -> Option<&TelemetryFrame> {
        self.current.as_ref()
    }

    /// Block for a fresh frame and make it current.
    pub fn refresh(&mut self) -> Result<&TelemetryFrame> {
        let frame = self.source.receive_frame()?;
        Ok(&*self.current.insert(frame))
    }

    pub fn into_parts(self) -> (S, C) {
        (self.source, self.sink)
    }

    /// Wait until the robot has stopped moving.
    ///
    /// Keeps commanding zero velocity while polling, so coasting from a
    /// previous command does not bias the next maneuver.
    pub fn settle(&mut self) -> Result<SettleOutcome> {
        let epsilon = self.config.settle_epsilon;
        let poll_interval = self.config.settle_poll_interval();

        self.sink.send_stop()?;
        pause(self.config.settle_lead_in());

        let mut frames = 0u32;
        loop {
            self.sink.send_stop()?;
            let frame = self.refresh()?;
            let still = frame.is_still(epsilon);
            let (vx, vy, yaw_rate) = (frame.linear.vx, frame.linear.vy, frame.yaw_rate);
            frames += 1;

            if still {
                break;
            }
            tracing::debug!(parent: &self.span, vx, vy, yaw_rate, "Still moving");
            pause(poll_interval);
        }

        tracing::debug!(parent: &self.span, frames, "Settled");
        Ok(SettleOutcome { frames })
    }

    /// Rotate in place by `delta` radians relative to the settled heading.
    pub fn turn_by_relative_angle(&mut self, delta: f32) -> Result<TurnOutcome> {
        self.settle()?;

        let start_heading = self.refresh()?.pose.heading;
        let target_heading = start_heading + delta;
        let tolerance = self.config.turn_tolerance;
        let period = self.config.control_period();

        tracing::info!(
            parent: &self.span,
            start_heading,
            target_heading,
            "Turning by {:.3} rad",
            delta
        );

        let mut iterations = 0u32;
        let final_error = loop {
            let heading = self.refresh()?.pose.heading;
            let error = normalize_angle(target_heading - heading);
            if error.abs() < tolerance {
                break error;
            }

            let rate = self.config.turn.rate_for(error);
            tracing::debug!(parent: &self.span, heading, error, rate, "Turn step");
            self.sink.send_command(Command::new(0.0, rate))?;
            iterations += 1;
            pause(period);
        };

        self.sink.send_stop()?;
        tracing::info!(parent: &self.span, final_error, iterations, "Turn complete");

        Ok(TurnOutcome {
            start_heading,
            target_heading,
            final_error,
            iterations,
        })
    }

    /// Drive forward until the closest valid range reaches the stop distance.
    ///
    /// Speed ramps down linearly inside `ramp_start`, then a braking burst of
    /// zero commands absorbs momentum the ramp does not model.
    pub fn approach_until_close(&mut self, profile: ApproachProfile) -> Result<ApproachOutcome> {
        profile.validate()?;
        let period = self.config.control_period();

        tracing::info!(
            parent: &self.span,
            stop_distance = profile.stop_distance,
            max_speed = profile.max_speed,
            "Approaching obstacle"
        );

        let mut iterations = 0u32;
        let final_distance = loop {
            let min_dist = self.refresh()?.ranges.min_valid();
            let speed = profile.speed_for(min_dist);

            self.sink.send_command(Command::new(speed, 0.0))?;
            iterations += 1;

            if min_dist <= profile.stop_distance {
                break min_dist;
            }
            tracing::debug!(parent: &self.span, min_dist, speed, "Approach step");
            pause(period);
        };

        self.brake()?;
        pause(self.config.brake_settle());

        tracing::info!(parent: &self.span, final_distance, iterations, "Approach complete");
        Ok(ApproachOutcome {
            final_distance,
            iterations,
        })
    }

    fn brake(&mut self) -> Result<()> {
        let interval = self.config.brake_burst_interval();
        for _ in 0..self.config.brake_burst_count {
            self.sink.send_stop()?;
            pause(interval);
        }
        Ok(())
    }
}

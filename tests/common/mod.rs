//! Scripted telemetry and command recording for maneuver tests.

#![allow(dead_code)]

use gati::config::MotionConfig;
use gati::telemetry::{AngularVelocity, LinearVelocity, Pose, RangeSweep};
use gati::{Command, CommandSink, FrameSource, GatiError, Result, TelemetryFrame};
use std::collections::VecDeque;
use std::time::Instant;

/// Replays frames in order; errors once the script runs out so a runaway
/// loop fails instead of hanging.
pub struct ScriptedSource {
    frames: VecDeque<TelemetryFrame>,
    pub served: usize,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = TelemetryFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            served: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ScriptedSource {
    fn receive_frame(&mut self) -> Result<TelemetryFrame> {
        let frame = self.frames.pop_front().ok_or_else(|| {
            GatiError::Transport(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "telemetry script exhausted",
            ))
        })?;
        self.served += 1;
        Ok(frame)
    }
}

/// Records every command; optionally fails after a number of sends.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Vec<Command>,
    pub fail_after: Option<usize>,
}

impl CommandSink for RecordingSink {
    fn send_command(&mut self, command: Command) -> Result<()> {
        if self.fail_after.is_some_and(|limit| self.sent.len() >= limit) {
            return Err(GatiError::Transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "destination unreachable",
            )));
        }
        self.sent.push(command);
        Ok(())
    }
}

pub fn frame() -> TelemetryFrame {
    TelemetryFrame {
        pose: Pose::default(),
        linear: LinearVelocity::default(),
        yaw_rate: 0.0,
        angular: AngularVelocity::default(),
        ranges: RangeSweep::default(),
        received_at: Instant::now(),
    }
}

pub fn heading_frame(heading: f32) -> TelemetryFrame {
    let mut f = frame();
    f.pose.heading = heading;
    f
}

/// Same speed on every velocity axis settle looks at.
pub fn moving_frame(speed: f32) -> TelemetryFrame {
    let mut f = frame();
    f.linear = LinearVelocity {
        vx: speed,
        vy: speed,
    };
    f.yaw_rate = speed;
    f
}

pub fn sweep_frame(ranges: Vec<f32>) -> TelemetryFrame {
    let mut f = frame();
    f.ranges = RangeSweep::new(ranges);
    f
}

/// Default control constants with every pause removed.
pub fn quick_config() -> MotionConfig {
    MotionConfig {
        settle_lead_in_ms: 0,
        settle_poll_interval_ms: 0,
        control_period_ms: 0,
        brake_burst_interval_ms: 0,
        brake_settle_ms: 0,
        ..MotionConfig::default()
    }
}

//! Telemetry decoding and the receive channel.

pub mod channel;
pub mod frame;
pub mod wire;

pub use channel::{TelemetryChannel, TransportMode};
pub use frame::{AngularVelocity, LinearVelocity, Pose, RangeSweep, TelemetryFrame};

use crate::error::Result;

/// Anything that can hand out the next telemetry frame, blocking if needed.
pub trait FrameSource {
    fn receive_frame(&mut self) -> Result<TelemetryFrame>;
}

impl<T: FrameSource + ?Sized> FrameSource for &mut T {
    fn receive_frame(&mut self) -> Result<TelemetryFrame> {
        (**self).receive_frame()
    }
}

//! Gati - closed-loop motion client for a simulated robot
//!
//! Receives telemetry snapshots (pose, velocities, range sweep) over TCP or
//! UDP, and drives the robot with UDP velocity commands through a small set
//! of maneuvers: settle, relative turn and approach-until-close.
//!
//! Every component takes a `tracing::Span` at construction and logs under it;
//! installing a subscriber is left to the binary.

pub mod command;
pub mod config;
pub mod error;
pub mod motion;
pub mod telemetry;
pub mod utils;
pub mod viz;

// Re-export commonly used types
pub use command::{Command, CommandChannel, CommandSink};
pub use config::GatiConfig;
pub use error::{GatiError, Result};
pub use motion::{ApproachProfile, MotionController, TurnSchedule};
pub use telemetry::{FrameSource, TelemetryChannel, TelemetryFrame, TransportMode};

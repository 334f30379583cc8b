//! Motion control: maneuvers and the control laws behind them.

mod controller;
mod profile;

pub use controller::{ApproachOutcome, MotionController, SettleOutcome, TurnOutcome};
pub use profile::{ApproachProfile, TurnSchedule};

//! Configuration loading for Gati
//!
//! Resolution order: built-in defaults, then a TOML file, then the
//! `CMD_HOST`, `CMD_PORT`, `TEL_HOST`, `TEL_PORT` and `PROTO` environment
//! variables.

use crate::error::{GatiError, Result};
use crate::motion::{ApproachProfile, TurnSchedule};
use crate::telemetry::TransportMode;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GatiConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub motion: MotionConfig,
}

/// Network endpoints
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Backend host receiving velocity commands (default: 127.0.0.1)
    #[serde(default = "default_command_host")]
    pub command_host: String,

    /// Backend UDP port for commands (default: 5555)
    #[serde(default = "default_command_port")]
    pub command_port: u16,

    /// Local interface to receive telemetry on (default: 0.0.0.0)
    #[serde(default = "default_telemetry_host")]
    pub telemetry_host: String,

    /// Local telemetry port (default: 5600)
    #[serde(default = "default_telemetry_port")]
    pub telemetry_port: u16,

    /// Telemetry transport, "tcp" or "udp" (default: tcp)
    #[serde(default)]
    pub transport: TransportMode,
}

/// Maneuver timing and control constants
#[derive(Clone, Debug, Deserialize)]
pub struct MotionConfig {
    /// Velocity magnitude below which the robot counts as stopped
    #[serde(default = "default_settle_epsilon")]
    pub settle_epsilon: f32,

    /// Pause after the first stop command before polling (ms)
    #[serde(default = "default_settle_lead_in_ms")]
    pub settle_lead_in_ms: u64,

    /// Pause between settle polls (ms)
    #[serde(default = "default_settle_poll_interval_ms")]
    pub settle_poll_interval_ms: u64,

    /// Heading error accepted as converged (radians, ~4.6°)
    #[serde(default = "default_turn_tolerance")]
    pub turn_tolerance: f32,

    /// Pause between turn/approach iterations (ms)
    #[serde(default = "default_control_period_ms")]
    pub control_period_ms: u64,

    /// Zero commands sent after the approach stop condition
    #[serde(default = "default_brake_burst_count")]
    pub brake_burst_count: u32,

    /// Spacing between braking burst commands (ms)
    #[serde(default = "default_brake_burst_interval_ms")]
    pub brake_burst_interval_ms: u64,

    /// Wait after the braking burst for the body to stop (ms)
    #[serde(default = "default_brake_settle_ms")]
    pub brake_settle_ms: u64,

    #[serde(default)]
    pub turn: TurnSchedule,

    #[serde(default)]
    pub approach: ApproachProfile,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            command_host: default_command_host(),
            command_port: default_command_port(),
            telemetry_host: default_telemetry_host(),
            telemetry_port: default_telemetry_port(),
            transport: TransportMode::default(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            settle_epsilon: default_settle_epsilon(),
            settle_lead_in_ms: default_settle_lead_in_ms(),
            settle_poll_interval_ms: default_settle_poll_interval_ms(),
            turn_tolerance: default_turn_tolerance(),
            control_period_ms: default_control_period_ms(),
            brake_burst_count: default_brake_burst_count(),
            brake_burst_interval_ms: default_brake_burst_interval_ms(),
            brake_settle_ms: default_brake_settle_ms(),
            turn: TurnSchedule::default(),
            approach: ApproachProfile::default(),
        }
    }
}

// Default value functions
fn default_command_host() -> String {
    "127.0.0.1".to_string()
}
fn default_command_port() -> u16 {
    5555
}
fn default_telemetry_host() -> String {
    "0.0.0.0".to_string()
}
fn default_telemetry_port() -> u16 {
    5600
}

// Motion defaults
fn default_settle_epsilon() -> f32 {
    0.01
}
fn default_settle_lead_in_ms() -> u64 {
    200
}
fn default_settle_poll_interval_ms() -> u64 {
    20
}
fn default_turn_tolerance() -> f32 {
    0.08
}
fn default_control_period_ms() -> u64 {
    10
}
fn default_brake_burst_count() -> u32 {
    30
}
fn default_brake_burst_interval_ms() -> u64 {
    10
}
fn default_brake_settle_ms() -> u64 {
    300
}

impl MotionConfig {
    pub fn settle_lead_in(&self) -> Duration {
        Duration::from_millis(self.settle_lead_in_ms)
    }

    pub fn settle_poll_interval(&self) -> Duration {
        Duration::from_millis(self.settle_poll_interval_ms)
    }

    pub fn control_period(&self) -> Duration {
        Duration::from_millis(self.control_period_ms)
    }

    pub fn brake_burst_interval(&self) -> Duration {
        Duration::from_millis(self.brake_burst_interval_ms)
    }

    pub fn brake_settle(&self) -> Duration {
        Duration::from_millis(self.brake_settle_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.settle_epsilon.is_finite() && self.settle_epsilon > 0.0) {
            return Err(GatiError::Config(format!(
                "settle_epsilon must be positive, got {}",
                self.settle_epsilon
            )));
        }
        if !(self.turn_tolerance.is_finite() && self.turn_tolerance > 0.0) {
            return Err(GatiError::Config(format!(
                "turn_tolerance must be positive, got {}",
                self.turn_tolerance
            )));
        }
        self.turn.validate()?;
        self.approach.validate()
    }
}

impl GatiConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GatiError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GatiConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply process environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup (environment-style names)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let conn = &mut self.connection;
        if let Some(host) = lookup("CMD_HOST") {
            conn.command_host = host;
        }
        if let Some(port) = lookup("CMD_PORT") {
            conn.command_port = parse_port("CMD_PORT", &port)?;
        }
        if let Some(host) = lookup("TEL_HOST") {
            conn.telemetry_host = host;
        }
        if let Some(port) = lookup("TEL_PORT") {
            conn.telemetry_port = parse_port("TEL_PORT", &port)?;
        }
        if let Some(proto) = lookup("PROTO") {
            conn.transport = proto.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.motion.validate()
    }

    /// Address velocity commands are sent to
    pub fn command_address(&self) -> String {
        format!(
            "{}:{}",
            self.connection.command_host, self.connection.command_port
        )
    }

    /// Local address telemetry is received on
    pub fn telemetry_address(&self) -> String {
        format!(
            "{}:{}",
            self.connection.telemetry_host, self.connection.telemetry_port
        )
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|e| GatiError::Config(format!("{} '{}' is not a port: {}", key, value, e)))
}

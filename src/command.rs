//! Velocity command channel.
//!
//! Each command is one 8-byte UDP datagram:
//!
//! ```text
//! ┌──────────────────┬──────────────────┐
//! │ linear (f32 LE)  │ angular (f32 LE) │
//! └──────────────────┴──────────────────┘
//! ```
//!
//! Fire-and-forget: no acknowledgment, no retry, no ordering. Callers that
//! need a setpoint to stick re-send it every control period.

use crate::error::{GatiError, Result};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::Span;

/// Encoded command size in bytes.
pub const COMMAND_SIZE: usize = 8;

/// Velocity setpoint: forward speed (m/s) and yaw rate (rad/s).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Command {
    pub linear: f32,
    pub angular: f32,
}

impl Command {
    pub const STOP: Command = Command {
        linear: 0.0,
        angular: 0.0,
    };

    pub fn new(linear: f32, angular: f32) -> Self {
        Self { linear, angular }
    }

    pub fn is_stop(&self) -> bool {
        self.linear == 0.0 && self.angular == 0.0
    }

    pub fn encode(&self) -> [u8; COMMAND_SIZE] {
        let mut out = [0u8; COMMAND_SIZE];
        out[..4].copy_from_slice(&self.linear.to_le_bytes());
        out[4..].copy_from_slice(&self.angular.to_le_bytes());
        out
    }

    /// Decode a command datagram (backend side and tests).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COMMAND_SIZE {
            return Err(GatiError::Decode(format!(
                "command must be {} bytes, got {}",
                COMMAND_SIZE,
                bytes.len()
            )));
        }
        Ok(Self {
            linear: f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            angular: f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

/// Destination for velocity commands.
pub trait CommandSink {
    fn send_command(&mut self, command: Command) -> Result<()>;

    fn send_stop(&mut self) -> Result<()> {
        self.send_command(Command::STOP)
    }
}

impl<T: CommandSink + ?Sized> CommandSink for &mut T {
    fn send_command(&mut self, command: Command) -> Result<()> {
        (**self).send_command(command)
    }
}

/// UDP sender for velocity commands.
pub struct CommandChannel {
    socket: UdpSocket,
    destination: SocketAddr,
    span: Span,
}

impl CommandChannel {
    /// Bind an ephemeral local socket and target `destination`.
    pub fn connect<A: ToSocketAddrs>(destination: A, span: Span) -> Result<Self> {
        let destination = destination
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| GatiError::Config("Command address resolved to nothing".into()))?;

        let bind_addr: SocketAddr = if destination.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;
        tracing::info!(parent: &span, "Command channel targeting {}", destination);

        Ok(Self::from_socket(socket, destination, span))
    }

    pub fn from_socket(socket: UdpSocket, destination: SocketAddr, span: Span) -> Self {
        Self {
            socket,
            destination,
            span,
        }
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Send one velocity command.
    pub fn send(&mut self, linear: f32, angular: f32) -> Result<()> {
        self.send_command(Command::new(linear, angular))
    }
}

impl CommandSink for CommandChannel {
    fn send_command(&mut self, command: Command) -> Result<()> {
        let sent = self.socket.send_to(&command.encode(), self.destination)?;
        if sent != COMMAND_SIZE {
            return Err(GatiError::Transport(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short command datagram: {} of {} bytes", sent, COMMAND_SIZE),
            )));
        }
        tracing::trace!(
            parent: &self.span,
            linear = command.linear,
            angular = command.angular,
            "Command sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let bytes = Command::new(0.5, -0.12).encode();
        assert_eq!(&bytes[..4], &0.5f32.to_le_bytes());
        assert_eq!(&bytes[4..], &(-0.12f32).to_le_bytes());
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert!(Command::decode(&[0u8; 7]).is_err());
        assert!(Command::decode(&[0u8; 9]).is_err());
        assert_eq!(Command::decode(&[0u8; 8]).unwrap(), Command::STOP);
    }

    #[test]
    fn test_stop() {
        assert!(Command::STOP.is_stop());
        assert!(!Command::new(0.0, 0.12).is_stop());
    }
}

//! Telemetry receive path.
//!
//! Two transports are supported:
//!
//! | Mode | Setup | Framing |
//! |------|-------|---------|
//! | Stream (TCP) | listen, accept exactly one peer | u32 LE length prefix |
//! | Datagram (UDP) | bind, accept any sender | one payload per datagram |
//!
//! Receives block without a timeout. A dead backend stalls the caller.

use crate::error::{GatiError, Result};
use crate::telemetry::FrameSource;
use crate::telemetry::frame::TelemetryFrame;
use crate::telemetry::wire::{MAX_DATAGRAM_SIZE, decode_frame, read_stream_payload};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs, UdpSocket};
use std::str::FromStr;
use std::time::Instant;
use tracing::Span;

/// Telemetry transport selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Length-prefixed frames over a single accepted TCP connection
    #[default]
    #[serde(alias = "tcp")]
    Stream,
    /// Self-contained frames, one per UDP datagram
    #[serde(alias = "udp")]
    Datagram,
}

impl FromStr for TransportMode {
    type Err = GatiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" | "stream" => Ok(TransportMode::Stream),
            "udp" | "datagram" => Ok(TransportMode::Datagram),
            other => Err(GatiError::Config(format!(
                "Unknown telemetry transport '{}', expected tcp or udp",
                other
            ))),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Stream => write!(f, "tcp"),
            TransportMode::Datagram => write!(f, "udp"),
        }
    }
}

enum Link {
    Stream(TcpStream),
    Datagram { socket: UdpSocket, buffer: Vec<u8> },
}

/// Receives and decodes telemetry frames from the backend.
pub struct TelemetryChannel {
    link: Link,
    last_receive: Option<Instant>,
    span: Span,
}

impl TelemetryChannel {
    /// Bind `addr` and set up the receive path for `mode`.
    ///
    /// In stream mode this blocks until the backend connects.
    pub fn connect<A: ToSocketAddrs + fmt::Debug>(
        addr: A,
        mode: TransportMode,
        span: Span,
    ) -> Result<Self> {
        match mode {
            TransportMode::Stream => {
                let listener = TcpListener::bind(&addr)?;
                tracing::info!(parent: &span, "Waiting for telemetry over TCP on {:?}", addr);
                Self::from_listener(listener, span)
            }
            TransportMode::Datagram => {
                let socket = UdpSocket::bind(&addr)?;
                tracing::info!(parent: &span, "Listening for telemetry over UDP on {:?}", addr);
                Ok(Self::from_socket(socket, span))
            }
        }
    }

    /// Accept exactly one peer from `listener`; the listener is dropped after.
    pub fn from_listener(listener: TcpListener, span: Span) -> Result<Self> {
        let (stream, peer) = listener.accept()?;
        tracing::info!(parent: &span, "Telemetry source connected from {}", peer);

        Ok(Self {
            link: Link::Stream(stream),
            last_receive: None,
            span,
        })
    }

    /// Receive datagrams on an already-bound socket from any sender.
    pub fn from_socket(socket: UdpSocket, span: Span) -> Self {
        Self {
            link: Link::Datagram {
                socket,
                buffer: vec![0u8; MAX_DATAGRAM_SIZE],
            },
            last_receive: None,
            span,
        }
    }

    pub fn mode(&self) -> TransportMode {
        match self.link {
            Link::Stream(_) => TransportMode::Stream,
            Link::Datagram { .. } => TransportMode::Datagram,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        let addr = match &self.link {
            Link::Stream(stream) => stream.local_addr()?,
            Link::Datagram { socket, .. } => socket.local_addr()?,
        };
        Ok(addr)
    }

    /// Time of the last successfully decoded frame.
    pub fn last_receive(&self) -> Option<Instant> {
        self.last_receive
    }

    /// Block until the next frame arrives and decode it.
    pub fn receive_frame(&mut self) -> Result<TelemetryFrame> {
        let span = &self.span;
        let frame = match &mut self.link {
            Link::Stream(stream) => {
                let payload = read_stream_payload(stream)?;
                decode_frame(&payload, Instant::now())?
            }
            Link::Datagram { socket, buffer } => {
                let (len, sender) = socket.recv_from(buffer)?;
                tracing::trace!(parent: span, "Datagram of {} bytes from {}", len, sender);
                decode_frame(&buffer[..len], Instant::now())?
            }
        };

        self.last_receive = Some(frame.received_at);
        tracing::trace!(
            parent: &self.span,
            heading = frame.pose.heading,
            samples = frame.ranges.len(),
            "Telemetry frame decoded"
        );

        Ok(frame)
    }
}

impl FrameSource for TelemetryChannel {
    fn receive_frame(&mut self) -> Result<TelemetryFrame> {
        TelemetryChannel::receive_frame(self)
    }
}

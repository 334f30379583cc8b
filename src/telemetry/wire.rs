//! Telemetry wire format
//!
//! # Payload
//!
//! ```text
//! ┌────────────┬──────────────────────────────┬───────────┬─────────────────┐
//! │ Magic (4)  │ 9 × f32 LE (36)              │ n: u32 LE │ n × f32 LE      │
//! │ "WBTG"     │ x y θ vx vy ω wx wy wz        │ (4)       │ range samples   │
//! └────────────┴──────────────────────────────┴───────────┴─────────────────┘
//! ```
//!
//! # Transports
//!
//! - **Datagram**: one payload per datagram, no prefix.
//! - **Stream**: each payload is preceded by its length as a little-endian
//!   u32. The full declared length is read before the magic is looked at.
//!
//! A bad magic is fatal for that frame. There is no scanning forward for the
//! next valid signature.

use crate::error::{GatiError, Result};
use crate::telemetry::frame::{AngularVelocity, LinearVelocity, Pose, RangeSweep, TelemetryFrame};
use std::io::{ErrorKind, Read};
use std::time::Instant;

/// Leading signature of every telemetry payload.
pub const MAGIC: &[u8; 4] = b"WBTG";

/// Magic plus the nine state floats.
pub const HEADER_SIZE: usize = MAGIC.len() + 9 * 4;

/// Offset of the first range sample.
pub const SAMPLES_OFFSET: usize = HEADER_SIZE + 4;

/// Stream length prefix size.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Largest datagram the channel will accept.
pub const MAX_DATAGRAM_SIZE: usize = 65535;


#[inline]
fn f32_at(payload: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        payload[offset],
        payload[offset + 1],
        payload[offset + 2],
        payload[offset + 3],
    ])
}

/// Decode one telemetry payload.
pub fn decode_frame(payload: &[u8], received_at: Instant) -> Result<TelemetryFrame> {
    if payload.len() < MAGIC.len() {
        return Err(GatiError::Decode(format!(
            "payload of {} bytes has no room for a signature",
            payload.len()
        )));
    }
    if &payload[..MAGIC.len()] != MAGIC {
        let mut found = [0u8; 4];
        found.copy_from_slice(&payload[..MAGIC.len()]);
        return Err(GatiError::BadSignature { found });
    }

    if payload.len() < SAMPLES_OFFSET {
        return Err(GatiError::Decode(format!(
            "header needs {} bytes, payload has {}",
            SAMPLES_OFFSET,
            payload.len()
        )));
    }

    let mut state = [0f32; 9];
    for (i, value) in state.iter_mut().enumerate() {
        *value = f32_at(payload, MAGIC.len() + i * 4);
    }
    let [x, y, heading, vx, vy, yaw_rate, wx, wy, wz] = state;

    let count = u32::from_le_bytes([
        payload[HEADER_SIZE],
        payload[HEADER_SIZE + 1],
        payload[HEADER_SIZE + 2],
        payload[HEADER_SIZE + 3],
    ]) as usize;

    let required = count
        .checked_mul(4)
        .and_then(|bytes| bytes.checked_add(SAMPLES_OFFSET))
        .ok_or_else(|| GatiError::Decode(format!("range count {} overflows", count)))?;
    if payload.len() < required {
        return Err(GatiError::Decode(format!(
            "{} range samples need {} bytes, payload has {}",
            count,
            required,
            payload.len()
        )));
    }

    let samples = payload[SAMPLES_OFFSET..required]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok(TelemetryFrame {
        pose: Pose { x, y, heading },
        linear: LinearVelocity { vx, vy },
        yaw_rate,
        angular: AngularVelocity { wx, wy, wz },
        ranges: RangeSweep::new(samples),
        received_at,
    })
}

/// Encode a frame into its payload bytes (no length prefix).
pub fn encode_frame(frame: &TelemetryFrame) -> Vec<u8> {
    let samples = frame.ranges.samples();
    let mut out = Vec::with_capacity(SAMPLES_OFFSET + samples.len() * 4);

    out.extend_from_slice(MAGIC);
    for value in [
        frame.pose.x,
        frame.pose.y,
        frame.pose.heading,
        frame.linear.vx,
        frame.linear.vy,
        frame.yaw_rate,
        frame.angular.wx,
        frame.angular.wy,
        frame.angular.wz,
    ] {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out.extend_from_slice(&(samples.len() as u32).to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }

    out
}

/// Encode a frame for stream transport (length prefix + payload).
pub fn encode_stream_frame(frame: &TelemetryFrame) -> Vec<u8> {
    let payload = encode_frame(frame);
    let mut out = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Fill `buf` completely, issuing as many reads as it takes.
///
/// A zero-byte read before the buffer is full means the peer closed.
pub fn read_exact_or_closed<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(GatiError::ConnectionClosed {
                    expected: buf.len(),
                    received: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(GatiError::Transport(e)),
        }
    }
    Ok(())
}

/// Read one length-prefixed payload from a stream.
///
/// The buffer grows as bytes arrive, so a large declared length costs
/// nothing until the peer actually sends it.
pub fn read_stream_payload<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; LENGTH_PREFIX_SIZE];
    read_exact_or_closed(reader, &mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut payload = Vec::with_capacity(len.min(MAX_DATAGRAM_SIZE));
    let received = reader.by_ref().take(len as u64).read_to_end(&mut payload)?;
    if received < len {
        return Err(GatiError::ConnectionClosed {
            expected: len,
            received,
        });
    }
    Ok(payload)
}

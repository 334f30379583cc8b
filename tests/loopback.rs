//! Telemetry and command channels over real sockets on 127.0.0.1.

mod common;

use common::*;
use gati::telemetry::wire::{encode_frame, encode_stream_frame};
use gati::{
    ApproachProfile, Command, CommandChannel, GatiError, MotionController, TelemetryChannel,
    TelemetryFrame, TransportMode,
};
use std::io::Write;
use std::net::{TcpListener, TcpStream, UdpSocket};
use std::thread;
use std::time::Duration;
use tracing::Span;

fn sample(heading: f32, ranges: Vec<f32>) -> TelemetryFrame {
    let mut f = sweep_frame(ranges);
    f.pose.x = 0.75;
    f.pose.y = -1.5;
    f.pose.heading = heading;
    f.linear.vx = 0.2;
    f.yaw_rate = -0.1;
    f.angular.wz = -0.1;
    f
}

fn assert_same_state(a: &TelemetryFrame, b: &TelemetryFrame) {
    assert_eq!(a.pose, b.pose);
    assert_eq!(a.linear, b.linear);
    assert_eq!(a.yaw_rate, b.yaw_rate);
    assert_eq!(a.angular, b.angular);
    assert_eq!(a.ranges, b.ranges);
}

/// Accept on a fresh listener while `backend` writes from a client socket.
fn stream_channel<F>(backend: F) -> (TelemetryChannel, thread::JoinHandle<()>)
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let stream = TcpStream::connect(addr).unwrap();
        backend(stream);
    });
    let channel = TelemetryChannel::from_listener(listener, Span::none()).unwrap();
    (channel, handle)
}

#[test]
fn test_stream_frames_then_close() {
    let first = sample(0.5, (0..360).map(|i| 1.0 + i as f32 * 0.01).collect());
    let second = sample(0.6, Vec::new());
    let bytes = [encode_stream_frame(&first), encode_stream_frame(&second)].concat();

    let (mut channel, backend) = stream_channel(move |mut stream| {
        // Split mid-prefix and mid-payload to force partial reads
        for piece in [&bytes[..2], &bytes[2..100], &bytes[100..]] {
            stream.write_all(piece).unwrap();
            stream.flush().unwrap();
            thread::sleep(Duration::from_millis(5));
        }
    });

    assert_eq!(channel.mode(), TransportMode::Stream);
    assert!(channel.last_receive().is_none());

    let got = channel.receive_frame().unwrap();
    assert_same_state(&got, &first);
    assert_eq!(got.ranges.len(), 360);
    assert_eq!(channel.last_receive(), Some(got.received_at));

    assert_same_state(&channel.receive_frame().unwrap(), &second);

    backend.join().unwrap();
    assert!(matches!(
        channel.receive_frame(),
        Err(GatiError::ConnectionClosed {
            expected: 4,
            received: 0
        })
    ));
}

#[test]
fn test_stream_closed_before_declared_length() {
    let (mut channel, backend) = stream_channel(|mut stream| {
        stream.write_all(&200u32.to_le_bytes()).unwrap();
        stream.write_all(&[0u8; 50]).unwrap();
    });
    backend.join().unwrap();

    match channel.receive_frame() {
        Err(GatiError::ConnectionClosed { expected, received }) => {
            assert_eq!(expected, 200);
            assert_eq!(received, 50);
        }
        other => panic!("expected ConnectionClosed, got {:?}", other),
    }
}

#[test]
fn test_stream_bad_signature() {
    let mut payload = encode_frame(&sample(0.0, vec![1.0; 8]));
    payload[..4].copy_from_slice(b"JUNK");
    let (mut channel, backend) = stream_channel(move |mut stream| {
        stream
            .write_all(&(payload.len() as u32).to_le_bytes())
            .unwrap();
        stream.write_all(&payload).unwrap();
    });
    backend.join().unwrap();

    assert!(matches!(
        channel.receive_frame(),
        Err(GatiError::BadSignature { found }) if &found == b"JUNK"
    ));
    assert!(channel.last_receive().is_none());
}

#[test]
fn test_datagram_frames_from_any_sender() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();
    let mut channel = TelemetryChannel::from_socket(socket, Span::none());

    let frame = sample(2.0, vec![0.5; 360]);
    let sender_a = UdpSocket::bind("127.0.0.1:0").unwrap();
    let sender_b = UdpSocket::bind("127.0.0.1:0").unwrap();

    sender_a.send_to(&encode_frame(&frame), addr).unwrap();
    assert_same_state(&channel.receive_frame().unwrap(), &frame);

    // A bad datagram fails that call only
    sender_b.send_to(b"NOPE and some more", addr).unwrap();
    assert!(matches!(
        channel.receive_frame(),
        Err(GatiError::BadSignature { .. })
    ));

    sender_b.send_to(&encode_frame(&frame), addr).unwrap();
    assert_same_state(&channel.receive_frame().unwrap(), &frame);
    assert!(channel.last_receive().is_some());
}

#[test]
fn test_datagram_connect_binds_requested_address() {
    let channel =
        TelemetryChannel::connect("127.0.0.1:0", TransportMode::Datagram, Span::none()).unwrap();
    assert_eq!(channel.mode(), TransportMode::Datagram);
    assert!(channel.local_addr().unwrap().ip().is_loopback());
}

#[test]
fn test_command_datagram_layout() {
    let backend = UdpSocket::bind("127.0.0.1:0").unwrap();
    backend
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();

    let mut commands = CommandChannel::connect(backend.local_addr().unwrap(), Span::none()).unwrap();
    assert_eq!(commands.destination(), backend.local_addr().unwrap());
    commands.send(0.25, -0.6).unwrap();

    let mut buf = [0u8; 64];
    let (len, _) = backend.recv_from(&mut buf).unwrap();
    assert_eq!(len, 8);
    assert_eq!(Command::decode(&buf[..len]).unwrap(), Command::new(0.25, -0.6));
}

#[test]
fn test_approach_against_loopback_backend() {
    let telemetry_socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let telemetry_addr = telemetry_socket.local_addr().unwrap();
    let telemetry = TelemetryChannel::from_socket(telemetry_socket, Span::none());

    let backend = UdpSocket::bind("127.0.0.1:0").unwrap();
    backend
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let commands = CommandChannel::connect(backend.local_addr().unwrap(), Span::none()).unwrap();

    let mut ranges = vec![5.0; 360];
    ranges[90] = 0.39;
    backend
        .send_to(&encode_frame(&sample(0.0, ranges)), telemetry_addr)
        .unwrap();

    let mut bot = MotionController::new(telemetry, commands, quick_config(), Span::none());
    let outcome = bot.approach_until_close(ApproachProfile::default()).unwrap();
    assert_eq!(outcome.final_distance, 0.39);

    let mut buf = [0u8; 16];
    let mut received = Vec::new();
    while let Ok((len, _)) = backend.recv_from(&mut buf) {
        received.push(Command::decode(&buf[..len]).unwrap());
        if received.len() == 31 {
            break;
        }
    }
    assert_eq!(received.len(), 31);
    assert!(received.iter().all(Command::is_stop));
}

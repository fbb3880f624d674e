//! Recording mocks and frame builders shared by the host tests

use crate::codec::{AvrcpCodec, Codec};
use crate::connection::{AudioPath, PeerInfo};
use crate::events::{Event, EventSink};
use crate::features::PeerFeatures;
use crate::packets::{Code, Command, PduId, Response, StatusCode};
use crate::timer::{TimerExpiry, TimerHandle, TimerKind, TimerService};
use crate::transport::{Frame, Transport, TransportError};
use crate::{AvrcpHost, AvrcpOptions, BluetoothAddress};
use core::time::Duration;
use heapless::Vec;

pub const SESSION: u16 = 0x0041;
pub const PEER: BluetoothAddress = BluetoothAddress([0x00, 0x1A, 0x7D, 0xDA, 0x71, 0x13]);

#[derive(Default)]
pub struct MockTransport {
    pub sent: Vec<Frame, 64>,
    pub closed: Vec<u16, 4>,
    pub fail_sends: bool,
}

impl Transport for MockTransport {
    fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::Io);
        }
        self.sent.push(frame.clone()).expect("too many frames sent");
        Ok(())
    }

    fn close(&mut self, session: u16) {
        self.closed.push(session).expect("too many sessions closed");
    }
}

#[derive(Default)]
pub struct MockTimers {
    next: u32,
    pub armed: Vec<(TimerHandle, Duration, TimerKind), 32>,
    pub cancelled: Vec<TimerHandle, 64>,
}

impl MockTimers {
    /// Fire the first armed timer matching `filter`
    pub fn expire_where(&mut self, filter: impl Fn(&TimerKind) -> bool) -> Option<TimerExpiry> {
        let index = self.armed.iter().position(|(_, _, kind)| filter(kind))?;
        let (handle, _, kind) = self.armed.remove(index);
        Some(TimerExpiry { handle, kind })
    }
}

impl TimerService for MockTimers {
    fn arm(&mut self, duration: Duration, kind: TimerKind) -> TimerHandle {
        self.next += 1;
        let handle = TimerHandle(self.next);
        self.armed
            .push((handle, duration, kind))
            .expect("too many timers armed");
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.armed.retain(|(armed, _, _)| *armed != handle);
        self.cancelled.push(handle).expect("too many timers cancelled");
    }

    fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.armed.iter().any(|(armed, _, _)| *armed == handle)
    }
}

#[derive(Default)]
pub struct MockSink {
    pub events: Vec<Event, 24>,
}

impl EventSink for MockSink {
    fn on_event(&mut self, event: Event) {
        self.events.push(event).expect("too many events");
    }
}

pub type TestHost = AvrcpHost<AvrcpCodec, MockTransport, MockTimers, MockSink>;

pub fn host() -> TestHost {
    host_with(AvrcpOptions::default())
}

pub fn host_with(options: AvrcpOptions) -> TestHost {
    AvrcpHost::with_options(
        AvrcpCodec,
        MockTransport::default(),
        MockTimers::default(),
        MockSink::default(),
        options,
    )
}

/// Host already connected to `PEER` with the audio path open and streaming
pub fn connected_host(features: u16) -> TestHost {
    connected_host_with(features, AvrcpOptions::default())
}

pub fn connected_host_with(features: u16, options: AvrcpOptions) -> TestHost {
    let mut host = host_with(options);
    host.connection.connected = true;
    host.connection.session = SESSION;
    host.connection.address = PEER;
    host.connection.features = PeerFeatures::from_raw(features);
    host.audio = AudioPath::new(PEER, true, true);
    host
}

pub fn peer(features: u16) -> PeerInfo {
    PeerInfo::new(SESSION, PEER, PeerFeatures::from_raw(features))
}

/// Vendor-dependent response from the peer
pub fn response(label: u8, code: Code, response: &Response) -> Frame {
    let payload = AvrcpCodec.encode_response(response).unwrap();
    Frame::vendor(SESSION, label, code, payload)
}

pub fn reject(label: u8, pdu: PduId, status: StatusCode) -> Frame {
    let payload = AvrcpCodec.encode_reject(pdu.raw(), status).unwrap();
    Frame::vendor(SESSION, label, Code::Rejected, payload)
}

/// Vendor-dependent command from the peer
pub fn command(label: u8, code: Code, command: &Command) -> Frame {
    let payload = AvrcpCodec.encode_command(command).unwrap();
    Frame::vendor(SESSION, label, code, payload)
}

pub fn decode_sent(frame: &Frame) -> Command {
    AvrcpCodec.decode_command(&frame.payload).unwrap()
}

//! AVRCP Host - protocol state machine for one control connection
//!
//! `AvrcpHost` owns the connection record, the transaction label pool, the notification
//! subscriptions and the bootstrap sequencer. It is driven entirely by the platform:
//!
//! 1. **Link events** - [`AvrcpHost::handle_connect`], [`AvrcpHost::handle_features`],
//!    [`AvrcpHost::handle_disconnect`], [`AvrcpHost::handle_inbound_message`] and
//!    [`AvrcpHost::update_audio_path`]
//! 2. **Timer expiries** - [`AvrcpHost::handle_timer_expired`]
//! 3. **Outward commands** - [`AvrcpHost::set_volume`], [`AvrcpHost::send_passthrough`]
//!    and the target-role answers
//!
//! Every handler runs to completion and never blocks. Frames go out through the
//! [`Transport`], timers are armed through the [`TimerService`], and everything the
//! platform needs to know is reported through the [`EventSink`].
//!
//! ## Roles
//!
//! As **controller** the host discovers the peer's capabilities, subscribes to playback
//! status, track and setting changes, reads the player application settings and fetches
//! now playing metadata. As **target** it answers play status, metadata and
//! notification requests on behalf of the platform and controls the peer's absolute
//! volume.
//!
//! ## Usage
//!
//! The host is usually owned by the processor task (see [`crate::processor`]), but it
//! can also be driven directly:
//!
//! ```rust,ignore
//! let mut host = AvrcpHost::new(AvrcpCodec, transport, timers, sink);
//! host.handle_connect(PeerInfo::new(session, address, features))?;
//! host.handle_inbound_message(&frame);
//! ```

mod api_processor;
mod bootstrap;
mod connection;
mod demux;
mod dispatcher;
mod notification;
mod passthrough;
mod target;
mod timers;
mod volume;

pub use notification::{RegistrationStatus, SupportedEvent};
pub use target::PendingResponse;

pub(crate) use dispatcher::LabelAction;

use crate::codec::Codec;
use crate::connection::{AudioPath, Connection};
use crate::constants::{MAX_PENDING_RESPONSES, MAX_SUPPORTED_EVENTS};
use crate::events::{Event, EventSink};
use crate::features::PeerFeatures;
use crate::label::LabelPool;
use crate::packets::PduId;
use crate::processor::LinkEvent;
use crate::settings::SettingsAccumulator;
use crate::timer::TimerService;
use crate::transport::Transport;
use crate::{AvrcpOptions, BluetoothAddress};
use heapless::{FnvIndexMap, Vec};

pub use bootstrap::BootstrapStage;

/// AVRCP protocol core for one control connection
///
/// Generic over the four platform seams:
/// - `C` the PDU [`Codec`]
/// - `T` the link [`Transport`]
/// - `M` the [`TimerService`]
/// - `S` the [`EventSink`]
pub struct AvrcpHost<C, T, M, S> {
    pub(crate) codec: C,
    pub(crate) transport: T,
    pub(crate) timers: M,
    pub(crate) sink: S,
    pub(crate) options: AvrcpOptions,
    pub(crate) labels: LabelPool,
    pub(crate) connection: Connection,
    pub(crate) audio: AudioPath,
    /// Events the controller role subscribes to, in registration order
    pub(crate) events: Vec<SupportedEvent, MAX_SUPPORTED_EVENTS>,
    pub(crate) settings: SettingsAccumulator,
    pub(crate) stage: BootstrapStage,
    /// Target-role commands waiting for a platform answer
    pub(crate) pending: FnvIndexMap<PduId, PendingResponse, MAX_PENDING_RESPONSES>,
}

impl<C, T, M, S> AvrcpHost<C, T, M, S>
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    /// Create a host with default options
    #[must_use]
    pub fn new(codec: C, transport: T, timers: M, sink: S) -> Self {
        Self::with_options(codec, transport, timers, sink, AvrcpOptions::default())
    }

    /// Create a host with custom options
    #[must_use]
    pub fn with_options(codec: C, transport: T, timers: M, sink: S, options: AvrcpOptions) -> Self {
        Self {
            codec,
            transport,
            timers,
            sink,
            options,
            labels: LabelPool::new(),
            connection: Connection::new(),
            audio: AudioPath::default(),
            events: Vec::new(),
            settings: SettingsAccumulator::default(),
            stage: BootstrapStage::Idle,
            pending: FnvIndexMap::new(),
        }
    }

    /// Get a reference to the options
    #[must_use]
    pub fn options(&self) -> &AvrcpOptions {
        &self.options
    }

    /// Whether a control connection is up
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.connected
    }

    /// Address of the connected peer
    #[must_use]
    pub fn peer_address(&self) -> Option<BluetoothAddress> {
        self.connection.connected.then_some(self.connection.address)
    }

    /// Features as negotiated, before local overrides
    #[must_use]
    pub fn peer_features(&self) -> PeerFeatures {
        self.connection.features
    }

    /// Last absolute volume reported by the peer, `0xFF` when unknown
    #[must_use]
    pub fn volume(&self) -> u8 {
        self.connection.volume
    }

    /// Current bootstrap stage
    #[must_use]
    pub fn bootstrap_stage(&self) -> BootstrapStage {
        self.stage
    }

    /// Event subscriptions of the controller role
    #[must_use]
    pub fn supported_events(&self) -> &[SupportedEvent] {
        &self.events
    }

    /// Number of transaction labels currently owned
    #[must_use]
    pub fn labels_in_use(&self) -> usize {
        self.labels.in_use()
    }

    /// A PLAY arrived before the audio path was up
    #[must_use]
    pub fn pending_play(&self) -> bool {
        self.connection.pending_play
    }

    /// Dispatch a link event received through the processor
    pub fn process_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Connected(peer) => {
                if let Err(e) = self.handle_connect(peer) {
                    warn!("[HOST] Connect refused: {}", e);
                }
            }
            LinkEvent::Features { address, features } => {
                if let Err(e) = self.handle_features(address, features) {
                    warn!("[HOST] Feature update ignored: {}", e);
                }
            }
            LinkEvent::Disconnected { session, address } => {
                self.handle_disconnect(session, address);
            }
            LinkEvent::Message(frame) => self.handle_inbound_message(&frame),
            LinkEvent::AudioPath(path) => self.update_audio_path(path),
        }
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.sink.on_event(event);
    }
}

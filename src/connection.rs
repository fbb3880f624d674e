//! Connection state
//!
//! A single AVRCP control connection is tracked. The record keeps the peer identity and
//! negotiated features together with the transient bookkeeping that must be wiped on
//! disconnect: volume registration, pending PLAY, the play status poll timer, the
//! one-shot bootstrap flags and the notifications the peer registered with us.

use crate::constants::{MAX_SUPPORTED_EVENTS, NO_TRACK_SELECTED, VOLUME_UNKNOWN};
use crate::features::PeerFeatures;
use crate::label::Label;
use crate::packets::EventId;
use crate::timer::TimerHandle;
use crate::{BluetoothAddress, ReconnectPolicy};
use heapless::FnvIndexMap;

/// Identity and features of a newly connected peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerInfo {
    /// Session handle of the control channel
    pub session: u16,
    /// Peer address
    pub address: BluetoothAddress,
    /// Folded SDP features
    pub features: PeerFeatures,
}

impl PeerInfo {
    /// Create peer information
    #[must_use]
    pub const fn new(session: u16, address: BluetoothAddress, features: PeerFeatures) -> Self {
        Self {
            session,
            address,
            features,
        }
    }
}

/// State of the audio (A2DP) path reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioPath {
    /// Peer of the audio stream, if any
    pub address: Option<BluetoothAddress>,
    /// Audio channel is open
    pub open: bool,
    /// Stream is started
    pub streaming: bool,
}

impl AudioPath {
    /// Audio path to `address` in the given state
    #[must_use]
    pub const fn new(address: BluetoothAddress, open: bool, streaming: bool) -> Self {
        Self {
            address: Some(address),
            open,
            streaming,
        }
    }
}

/// Notifications the peer registered with us, event to label
pub(crate) type Registrations = FnvIndexMap<EventId, u8, MAX_SUPPORTED_EVENTS>;

#[derive(Debug)]
pub(crate) struct Connection {
    pub connected: bool,
    pub session: u16,
    /// Session replaced by a repeat connect from the same peer
    pub retired_session: Option<u16>,
    pub address: BluetoothAddress,
    pub features: PeerFeatures,
    /// Last volume reported by the peer
    pub volume: u8,
    /// Label of our volume change registration
    pub volume_label: Option<Label>,
    pub pending_play: bool,
    pub poll_timer: Option<TimerHandle>,
    pub features_processed: bool,
    pub procedure_complete: bool,
    pub element_attributes_retried: bool,
    pub playing_uid: u64,
    pub registrations: Registrations,
}

impl Connection {
    pub const fn new() -> Self {
        Self {
            connected: false,
            session: 0,
            retired_session: None,
            address: BluetoothAddress([0; 6]),
            features: PeerFeatures::from_raw(0),
            volume: VOLUME_UNKNOWN,
            volume_label: None,
            pending_play: false,
            poll_timer: None,
            features_processed: false,
            procedure_complete: false,
            element_attributes_retried: false,
            playing_uid: NO_TRACK_SELECTED,
            registrations: FnvIndexMap::new(),
        }
    }

    /// Whether `session`/`address` refer to this connection under `policy`
    pub fn matches(&self, session: u16, address: BluetoothAddress, policy: ReconnectPolicy) -> bool {
        if self.retired_session == Some(session) && self.session != session {
            return false;
        }
        let same_session = self.session == session;
        let same_address = self.address == address;
        match policy {
            ReconnectPolicy::AcceptMatchingHandleOrAddress => same_session || same_address,
            ReconnectPolicy::RequireMatchingHandleAndAddress => same_session && same_address,
        }
    }

    pub fn reset_volume(&mut self) {
        self.volume = VOLUME_UNKNOWN;
        self.volume_label = None;
    }

    /// Back to the disconnected state
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

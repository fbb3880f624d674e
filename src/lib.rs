#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![allow(dead_code, clippy::unused_async, clippy::too_many_lines)]

#[macro_use]
mod fmt;

mod address;
pub mod api;
pub mod codec;
mod connection;
pub mod constants;
pub mod events;
mod features;
mod host;
mod label;
pub mod packets;
pub mod processor;
mod settings;
pub mod timer;
pub mod transport;

#[cfg(test)]
mod testing;

use crate::constants::{
    DEFAULT_CONTROL_TIMEOUT, DEFAULT_PLAY_STATUS_POLL_INTERVAL, DEFAULT_STATUS_TIMEOUT,
    MAX_APP_ATTRIBUTES, MAX_CHANNELS, MAX_DENY_LIST, MAX_ELEMENT_ATTRIBUTES,
};
use core::time::Duration;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

pub use address::BluetoothAddress;
pub use codec::{AvrcpCodec, Codec, CodecError, CommandFailure, DecodeError};
pub use connection::{AudioPath, PeerInfo};
pub use events::{Event, EventSink};
pub use features::{PeerFeatures, RemoteFeatures};
pub use host::{AvrcpHost, BootstrapStage, PendingResponse, RegistrationStatus, SupportedEvent};
pub use label::{ArmedTimer, Label, Transaction};
pub use packets::{
    Code, ElementAttribute, EventId, GroupNavigation, KeyState, MediaAttributeId, Notification,
    NotificationKind, PassThroughOp, PlaybackStatus, PlayerSetting,
};
pub use processor::LinkEvent;
pub use settings::{PlayerAppAttribute, PlayerAppAttributes};
pub use timer::{TimerExpiry, TimerService};
pub use transport::{Frame, Transport, TransportError};

pub(crate) static LINK_CHANNEL: Channel<CriticalSectionRawMutex, LinkEvent, MAX_CHANNELS> =
    Channel::new();

pub(crate) static TIMER_CHANNEL: Channel<CriticalSectionRawMutex, TimerExpiry, MAX_CHANNELS> =
    Channel::new();

pub(crate) static REQUEST_CHANNEL: Channel<CriticalSectionRawMutex, ApiRequest, MAX_CHANNELS> =
    Channel::new();

pub(crate) static RESPONSE_CHANNEL: Channel<CriticalSectionRawMutex, ApiResponse, MAX_CHANNELS> =
    Channel::new();

/// AVRCP Error
///
/// Represents errors returned by the host operations and the [`api`] functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AvrcpError {
    /// No control connection
    NotReady,
    /// Resource temporarily exhausted
    Busy,
    /// Command could not be sent
    Fail,
    /// Unknown peer or label
    NotFound,
    /// Another peer is already connected
    AlreadyConnected,
    /// Requested value equals the current one
    Unchanged,
    /// Peer or local configuration does not support the operation
    Unsupported,
    /// No peer request is waiting for this answer
    NotPending,
    /// Invalid parameter
    InvalidParameter,
    /// Static channel is full
    ChannelFull,
    /// Encoding failed
    Codec(CodecError),
    /// Link transport failed
    Transport,
}

impl core::fmt::Display for AvrcpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotReady => write!(f, "AVRCP not connected"),
            Self::Busy => write!(f, "AVRCP resources busy"),
            Self::Fail => write!(f, "AVRCP command failed"),
            Self::NotFound => write!(f, "AVRCP peer or label not found"),
            Self::AlreadyConnected => write!(f, "AVRCP already connected"),
            Self::Unchanged => write!(f, "AVRCP value unchanged"),
            Self::Unsupported => write!(f, "AVRCP operation not supported"),
            Self::NotPending => write!(f, "AVRCP no pending request"),
            Self::InvalidParameter => write!(f, "AVRCP invalid parameter"),
            Self::ChannelFull => write!(f, "AVRCP channel full"),
            Self::Codec(e) => write!(f, "AVRCP codec error: {e}"),
            Self::Transport => write!(f, "AVRCP transport error"),
        }
    }
}

/// Local AVRCP roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Roles {
    /// Act as target: answer the peer and control its absolute volume
    pub target: bool,
    /// Act as controller: discover the peer and subscribe to its events
    pub controller: bool,
}

impl Default for Roles {
    fn default() -> Self {
        Self {
            target: true,
            controller: true,
        }
    }
}

/// How a connect from a peer is treated while a connection exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReconnectPolicy {
    /// Same peer when either the session handle or the address matches
    #[default]
    AcceptMatchingHandleOrAddress,
    /// Same peer only when both the session handle and the address match
    RequireMatchingHandleAndAddress,
}

/// Configuration options for [`AvrcpHost`]
#[derive(Debug, Clone)]
pub struct AvrcpOptions {
    /// Enabled local roles
    pub roles: Roles,
    /// Local device is an audio sink; enables the bootstrap procedure
    pub sink_enabled: bool,
    /// Never use absolute volume
    pub disable_absolute_volume: bool,
    /// Peers whose absolute volume support is ignored
    pub absolute_volume_deny_list: Vec<BluetoothAddress, MAX_DENY_LIST>,
    /// Reconnect handling
    pub reconnect_policy: ReconnectPolicy,
    /// Response timeout of STATUS and NOTIFY commands
    pub status_timeout: Duration,
    /// Response timeout of CONTROL commands
    pub control_timeout: Duration,
    /// Play status polling interval while playing
    pub play_status_poll_interval: Duration,
}

impl Default for AvrcpOptions {
    fn default() -> Self {
        Self {
            roles: Roles::default(),
            sink_enabled: true,
            disable_absolute_volume: false,
            absolute_volume_deny_list: Vec::new(),
            reconnect_policy: ReconnectPolicy::default(),
            status_timeout: DEFAULT_STATUS_TIMEOUT,
            control_timeout: DEFAULT_CONTROL_TIMEOUT,
            play_status_poll_interval: DEFAULT_PLAY_STATUS_POLL_INTERVAL,
        }
    }
}

/// Snapshot of the current connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionInfo {
    /// Peer address
    pub address: BluetoothAddress,
    /// Session handle
    pub session: u16,
    /// Negotiated features
    pub features: PeerFeatures,
    /// Last volume reported by the peer
    pub volume: u8,
    /// Bootstrap progress
    pub stage: BootstrapStage,
}

#[derive(Debug, Clone)]
pub(crate) enum ApiRequest {
    SetVolume(u8),
    SendPassThrough {
        op: PassThroughOp,
        state: KeyState,
    },
    SendGroupNavigation {
        op: GroupNavigation,
        state: KeyState,
    },
    ChangePlayerSetting(Vec<PlayerSetting, MAX_APP_ATTRIBUTES>),
    SetVolumeResponse {
        volume: u8,
        label: u8,
    },
    VolumeChangeNotificationResponse {
        kind: NotificationKind,
        volume: u8,
        label: u8,
    },
    GetPlayStatusResponse {
        status: PlaybackStatus,
        length: u32,
        position: u32,
    },
    GetElementAttributesResponse(Vec<ElementAttribute, MAX_ELEMENT_ATTRIBUTES>),
    RegisterNotificationResponse {
        kind: NotificationKind,
        notification: Notification,
    },
    GetConnectionInfo,
}

#[derive(Debug, Clone)]
pub(crate) enum ApiResponse {
    Done,
    ConnectionInfo(Option<ConnectionInfo>),
    Error(AvrcpError),
}

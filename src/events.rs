//! Platform callback surface
//!
//! Everything the protocol core learns from the peer, and every request it needs the
//! platform to answer, is delivered as an [`Event`] through [`EventSink::on_event`].

use crate::codec::CommandFailure;
use crate::constants::{MAX_APP_ATTRIBUTES, MAX_ELEMENT_ATTRIBUTES};
use crate::features::{PeerFeatures, RemoteFeatures};
use crate::packets::{
    Code, ElementAttribute, EventId, GroupNavigation, KeyState, MediaAttributeId,
    PassThroughOp, PlaybackStatus, PlayerSetting,
};
use crate::settings::PlayerAppAttributes;
use crate::BluetoothAddress;
use heapless::Vec;

/// Notification delivered to the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Control channel connected or disconnected (controller role)
    ConnectionStateChanged {
        /// Connected
        connected: bool,
        /// Peer address
        address: BluetoothAddress,
    },
    /// Peer capabilities relevant to the target role
    RemoteFeatures {
        /// Peer address
        address: BluetoothAddress,
        /// Capabilities after local overrides
        features: RemoteFeatures,
    },
    /// Peer capabilities relevant to the controller role
    ControllerFeatures {
        /// Peer address
        address: BluetoothAddress,
        /// Negotiated features
        features: PeerFeatures,
    },
    /// Peer playback status
    PlayStatusChanged(PlaybackStatus),
    /// Play position from a `GetPlayStatus` poll
    PlayPositionChanged {
        /// Track length in milliseconds
        length: u32,
        /// Position in milliseconds
        position: u32,
    },
    /// Metadata of the now playing track
    TrackChanged(Vec<ElementAttribute, MAX_ELEMENT_ATTRIBUTES>),
    /// Discovered player application settings
    PlayerAppSettings(PlayerAppAttributes),
    /// Current player application setting values
    PlayerAppSettingsChanged(Vec<PlayerSetting, MAX_APP_ATTRIBUTES>),
    /// Outcome of [`crate::AvrcpHost::change_player_setting`]
    SetPlayerAppSettingResponse {
        /// Peer accepted the change
        accepted: bool,
    },
    /// Outcome of a pass-through command
    PassThroughResponse {
        /// Key
        op: PassThroughOp,
        /// Peer response code or failure
        result: Result<Code, CommandFailure>,
    },
    /// Outcome of a group navigation command
    GroupNavigationResponse {
        /// Navigation operation
        op: GroupNavigation,
        /// Peer response code or failure
        result: Result<Code, CommandFailure>,
    },
    /// Key pressed on the peer (target role)
    PassThroughCommand {
        /// Key
        op: PassThroughOp,
        /// Button state
        state: KeyState,
    },
    /// Absolute volume reported by the peer
    VolumeChanged {
        /// Volume (7-bit)
        volume: u8,
        /// Response code it arrived with
        code: Code,
    },
    /// `SetAbsoluteVolume` got no usable response
    VolumeCommandFailed(CommandFailure),
    /// Peer asks to change the local volume (controller role)
    SetAbsoluteVolumeRequest {
        /// Requested volume (7-bit)
        volume: u8,
        /// Label to answer on
        label: u8,
    },
    /// Peer registered for local volume changes (controller role)
    VolumeNotificationRequest {
        /// Label to answer on
        label: u8,
    },
    /// Peer asks for the play status (target role)
    GetPlayStatusRequest,
    /// Peer asks for now playing metadata (target role)
    GetElementAttributesRequest(Vec<MediaAttributeId, MAX_ELEMENT_ATTRIBUTES>),
    /// Peer registered for an event (target role)
    RegisterNotificationRequest {
        /// Event
        event: EventId,
        /// Playback interval in seconds
        interval: u32,
    },
}

/// Receives events from the protocol core
pub trait EventSink {
    /// Called from the processor context, must not block
    fn on_event(&mut self, event: Event);
}

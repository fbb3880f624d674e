//! AVRCP PDU Model
//!
//! Typed representation of the AV/C vendor-dependent metadata PDUs exchanged on the
//! AVRCP control channel, plus the pass-through operation identifiers.
//!
//! The byte layout of every PDU lives in [`crate::codec`]; this module only defines
//! the identifiers and the decoded forms.

mod command;
mod response;

pub use command::Command;
pub use response::{ElementAttribute, Notification, PlayerSetting, Response, SettingText};
pub(crate) use response::truncated;

/// Raw value could not be mapped to a known identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnknownValue(pub u8);

/// AVRCP metadata PDU identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PduId {
    /// Get capabilities (company ids, supported events)
    GetCapabilities = 0x10,
    /// List player application setting attributes
    ListPlayerAppAttributes = 0x11,
    /// List values of one player application setting attribute
    ListPlayerAppValues = 0x12,
    /// Get current player application setting values
    GetCurrentPlayerAppValue = 0x13,
    /// Set player application setting values
    SetPlayerAppValue = 0x14,
    /// Get display text of setting attributes
    GetPlayerAppAttributeText = 0x15,
    /// Get display text of setting values
    GetPlayerAppValueText = 0x16,
    /// Inform the target about displayable character sets
    InformDisplayCharset = 0x17,
    /// Inform the target about the controller battery status
    InformBatteryStatus = 0x18,
    /// Get media element attributes of the current track
    GetElementAttributes = 0x20,
    /// Get play status
    GetPlayStatus = 0x30,
    /// Register for an event notification
    RegisterNotification = 0x31,
    /// Request the next fragment of a continuing response
    RequestContinuingResponse = 0x40,
    /// Abort a continuing response
    AbortContinuingResponse = 0x41,
    /// Set absolute volume
    SetAbsoluteVolume = 0x50,
    /// Set addressed player
    SetAddressedPlayer = 0x60,
    /// Play an item
    PlayItem = 0x74,
    /// Search (browsing)
    Search = 0x80,
    /// Add an item to the now playing list
    AddToNowPlaying = 0x90,
}

impl PduId {
    /// Get the raw wire value
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PduId {
    type Error = UnknownValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x10 => Self::GetCapabilities,
            0x11 => Self::ListPlayerAppAttributes,
            0x12 => Self::ListPlayerAppValues,
            0x13 => Self::GetCurrentPlayerAppValue,
            0x14 => Self::SetPlayerAppValue,
            0x15 => Self::GetPlayerAppAttributeText,
            0x16 => Self::GetPlayerAppValueText,
            0x17 => Self::InformDisplayCharset,
            0x18 => Self::InformBatteryStatus,
            0x20 => Self::GetElementAttributes,
            0x30 => Self::GetPlayStatus,
            0x31 => Self::RegisterNotification,
            0x40 => Self::RequestContinuingResponse,
            0x41 => Self::AbortContinuingResponse,
            0x50 => Self::SetAbsoluteVolume,
            0x60 => Self::SetAddressedPlayer,
            0x74 => Self::PlayItem,
            0x80 => Self::Search,
            0x90 => Self::AddToNowPlaying,
            other => return Err(UnknownValue(other)),
        })
    }
}

/// Notification event identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum EventId {
    /// Playback status changed
    PlaybackStatusChanged = 0x01,
    /// Current track changed
    TrackChanged = 0x02,
    /// Reached end of a track
    TrackReachedEnd = 0x03,
    /// Reached start of a track
    TrackReachedStart = 0x04,
    /// Playback position changed
    PlaybackPosChanged = 0x05,
    /// Battery status changed
    BatteryStatusChanged = 0x06,
    /// System status changed
    SystemStatusChanged = 0x07,
    /// Player application setting changed
    PlayerAppSettingChanged = 0x08,
    /// Now playing list content changed
    NowPlayingContentChanged = 0x09,
    /// Available players changed
    AvailablePlayersChanged = 0x0A,
    /// Addressed player changed
    AddressedPlayerChanged = 0x0B,
    /// UID database changed
    UidsChanged = 0x0C,
    /// Absolute volume changed
    VolumeChanged = 0x0D,
}

impl EventId {
    /// Get the raw wire value
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Events a controller subscribes to during connection bootstrap
    #[must_use]
    pub const fn is_bootstrap_event(self) -> bool {
        matches!(
            self,
            Self::PlaybackStatusChanged | Self::TrackChanged | Self::PlayerAppSettingChanged
        )
    }
}

impl TryFrom<u8> for EventId {
    type Error = UnknownValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x01 => Self::PlaybackStatusChanged,
            0x02 => Self::TrackChanged,
            0x03 => Self::TrackReachedEnd,
            0x04 => Self::TrackReachedStart,
            0x05 => Self::PlaybackPosChanged,
            0x06 => Self::BatteryStatusChanged,
            0x07 => Self::SystemStatusChanged,
            0x08 => Self::PlayerAppSettingChanged,
            0x09 => Self::NowPlayingContentChanged,
            0x0A => Self::AvailablePlayersChanged,
            0x0B => Self::AddressedPlayerChanged,
            0x0C => Self::UidsChanged,
            0x0D => Self::VolumeChanged,
            other => return Err(UnknownValue(other)),
        })
    }
}

/// AVRCP error and status codes carried in REJECTED responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StatusCode {
    /// Invalid command (unknown PDU)
    InvalidCommand = 0x00,
    /// Invalid parameter (unknown parameter id)
    InvalidParameter = 0x01,
    /// Parameter content error
    ParameterContentError = 0x02,
    /// Internal error
    InternalError = 0x03,
    /// Operation completed without error
    Success = 0x04,
    /// UIDs changed
    UidChanged = 0x05,
    /// Invalid direction
    InvalidDirection = 0x07,
    /// Not a directory
    NotADirectory = 0x08,
    /// Does not exist
    DoesNotExist = 0x09,
    /// Invalid scope
    InvalidScope = 0x0A,
    /// Range out of bounds
    RangeOutOfBounds = 0x0B,
    /// Folder item is not playable
    FolderItemNotPlayable = 0x0C,
    /// Media in use
    MediaInUse = 0x0D,
    /// Now playing list full
    NowPlayingListFull = 0x0E,
    /// Search not supported
    SearchNotSupported = 0x0F,
    /// Search in progress
    SearchInProgress = 0x10,
    /// Invalid player id
    InvalidPlayerId = 0x11,
    /// Player not browsable
    PlayerNotBrowsable = 0x12,
    /// Player not addressed
    PlayerNotAddressed = 0x13,
    /// No valid search results
    NoValidSearchResults = 0x14,
    /// No available players
    NoAvailablePlayers = 0x15,
    /// Addressed player changed
    AddressedPlayerChanged = 0x16,
}

impl StatusCode {
    /// Get the raw wire value
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Map a raw status, treating unknown values as an internal error
    #[must_use]
    pub fn from_raw(value: u8) -> Self {
        match value {
            0x00 => Self::InvalidCommand,
            0x01 => Self::InvalidParameter,
            0x02 => Self::ParameterContentError,
            0x04 => Self::Success,
            0x05 => Self::UidChanged,
            0x07 => Self::InvalidDirection,
            0x08 => Self::NotADirectory,
            0x09 => Self::DoesNotExist,
            0x0A => Self::InvalidScope,
            0x0B => Self::RangeOutOfBounds,
            0x0C => Self::FolderItemNotPlayable,
            0x0D => Self::MediaInUse,
            0x0E => Self::NowPlayingListFull,
            0x0F => Self::SearchNotSupported,
            0x10 => Self::SearchInProgress,
            0x11 => Self::InvalidPlayerId,
            0x12 => Self::PlayerNotBrowsable,
            0x13 => Self::PlayerNotAddressed,
            0x14 => Self::NoValidSearchResults,
            0x15 => Self::NoAvailablePlayers,
            0x16 => Self::AddressedPlayerChanged,
            _ => Self::InternalError,
        }
    }
}

/// AV/C command types and response codes (the `ctype` / `response` nibble)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Code {
    /// Control command
    Control = 0x00,
    /// Status command
    Status = 0x01,
    /// Specific inquiry command
    SpecificInquiry = 0x02,
    /// Notify command
    Notify = 0x03,
    /// General inquiry command
    GeneralInquiry = 0x04,
    /// Not implemented response
    NotImplemented = 0x08,
    /// Accepted response
    Accepted = 0x09,
    /// Rejected response
    Rejected = 0x0A,
    /// In transition response
    InTransition = 0x0B,
    /// Implemented / stable response
    Stable = 0x0C,
    /// Changed response
    Changed = 0x0D,
    /// Interim response
    Interim = 0x0F,
}

impl Code {
    /// Get the raw wire value
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Command band (`ctype` up to general inquiry)
    #[must_use]
    pub const fn is_command(self) -> bool {
        (self as u8) <= Self::GeneralInquiry as u8
    }

    /// Response band (not implemented up to interim)
    #[must_use]
    pub const fn is_response(self) -> bool {
        (self as u8) >= Self::NotImplemented as u8
    }
}

impl TryFrom<u8> for Code {
    type Error = UnknownValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Self::Control,
            0x01 => Self::Status,
            0x02 => Self::SpecificInquiry,
            0x03 => Self::Notify,
            0x04 => Self::GeneralInquiry,
            0x08 => Self::NotImplemented,
            0x09 => Self::Accepted,
            0x0A => Self::Rejected,
            0x0B => Self::InTransition,
            0x0C => Self::Stable,
            0x0D => Self::Changed,
            0x0F => Self::Interim,
            other => return Err(UnknownValue(other)),
        })
    }
}

/// AV/C opcodes used on the control channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    /// Vendor-dependent (metadata PDUs)
    VendorDependent = 0x00,
    /// Unit info
    UnitInfo = 0x30,
    /// Subunit info
    SubunitInfo = 0x31,
    /// Pass-through (keys, group navigation)
    PassThrough = 0x7C,
}

impl Opcode {
    /// Get the raw wire value
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = UnknownValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Self::VendorDependent,
            0x30 => Self::UnitInfo,
            0x31 => Self::SubunitInfo,
            0x7C => Self::PassThrough,
            other => return Err(UnknownValue(other)),
        })
    }
}

/// Capability identifiers for `GetCapabilities`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CapabilityId {
    /// Supported company identifiers
    CompanyId = 0x02,
    /// Supported notification events
    EventsSupported = 0x03,
}

impl TryFrom<u8> for CapabilityId {
    type Error = UnknownValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x02 => Ok(Self::CompanyId),
            0x03 => Ok(Self::EventsSupported),
            other => Err(UnknownValue(other)),
        }
    }
}

/// Playback status reported by a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PlaybackStatus {
    /// Stopped
    Stopped = 0x00,
    /// Playing
    Playing = 0x01,
    /// Paused
    Paused = 0x02,
    /// Seeking forward
    FwdSeek = 0x03,
    /// Seeking backward
    RevSeek = 0x04,
    /// Error
    Error = 0xFF,
}

impl PlaybackStatus {
    /// Map a raw status, treating unknown values as an error state
    #[must_use]
    pub fn from_raw(value: u8) -> Self {
        match value {
            0x00 => Self::Stopped,
            0x01 => Self::Playing,
            0x02 => Self::Paused,
            0x03 => Self::FwdSeek,
            0x04 => Self::RevSeek,
            _ => Self::Error,
        }
    }
}

/// Media element attribute identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MediaAttributeId {
    /// Title of the media
    Title = 0x01,
    /// Name of the artist
    Artist = 0x02,
    /// Name of the album
    Album = 0x03,
    /// Number of the track
    TrackNumber = 0x04,
    /// Total number of tracks
    TotalTracks = 0x05,
    /// Genre
    Genre = 0x06,
    /// Playing time in milliseconds
    PlayingTime = 0x07,
}

impl MediaAttributeId {
    /// All attributes in wire order, as fetched after a track change
    pub const ALL: [MediaAttributeId; 7] = [
        Self::Title,
        Self::Artist,
        Self::Album,
        Self::TrackNumber,
        Self::TotalTracks,
        Self::Genre,
        Self::PlayingTime,
    ];

    /// Get the raw wire value
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u32> for MediaAttributeId {
    type Error = UnknownValue;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1..=7 => Ok(Self::ALL[value as usize - 1]),
            // Truncation is fine, only used for diagnostics
            other => Err(UnknownValue(other as u8)),
        }
    }
}

/// Pass-through operation identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PassThroughOp {
    /// Volume up
    VolumeUp = 0x41,
    /// Volume down
    VolumeDown = 0x42,
    /// Mute
    Mute = 0x43,
    /// Play
    Play = 0x44,
    /// Stop
    Stop = 0x45,
    /// Pause
    Pause = 0x46,
    /// Record
    Record = 0x47,
    /// Rewind
    Rewind = 0x48,
    /// Fast forward
    FastForward = 0x49,
    /// Eject
    Eject = 0x4A,
    /// Next track
    Forward = 0x4B,
    /// Previous track
    Backward = 0x4C,
    /// Vendor unique (group navigation)
    VendorUnique = 0x7E,
}

impl PassThroughOp {
    /// Get the raw wire value
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PassThroughOp {
    type Error = UnknownValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x41 => Self::VolumeUp,
            0x42 => Self::VolumeDown,
            0x43 => Self::Mute,
            0x44 => Self::Play,
            0x45 => Self::Stop,
            0x46 => Self::Pause,
            0x47 => Self::Record,
            0x48 => Self::Rewind,
            0x49 => Self::FastForward,
            0x4A => Self::Eject,
            0x4B => Self::Forward,
            0x4C => Self::Backward,
            0x7E => Self::VendorUnique,
            other => return Err(UnknownValue(other)),
        })
    }
}

/// Pass-through button state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyState {
    /// Button pushed
    Pressed,
    /// Button released
    Released,
}

impl KeyState {
    /// State flag in the operation id byte
    pub const RELEASED_FLAG: u8 = 0x80;

    /// Decode from the raw operation id byte
    #[must_use]
    pub const fn from_operation_byte(byte: u8) -> Self {
        if byte & Self::RELEASED_FLAG == 0 {
            Self::Pressed
        } else {
            Self::Released
        }
    }
}

/// Group navigation operations carried in vendor-unique pass-through frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum GroupNavigation {
    /// Move to the next group
    NextGroup = 0x0000,
    /// Move to the previous group
    PreviousGroup = 0x0001,
}

impl GroupNavigation {
    /// Get the raw vendor-unique operation id
    #[must_use]
    pub const fn raw(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for GroupNavigation {
    type Error = UnknownValue;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0000 => Ok(Self::NextGroup),
            0x0001 => Ok(Self::PreviousGroup),
            // Truncation is fine, only used for diagnostics
            other => Err(UnknownValue(other as u8)),
        }
    }
}

/// A decoded pass-through frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PassThrough {
    /// Plain key operation
    Key {
        /// Operation id
        op: PassThroughOp,
        /// Button state
        state: KeyState,
    },
    /// Vendor-unique group navigation
    Group {
        /// Navigation operation
        op: GroupNavigation,
        /// Button state
        state: KeyState,
    },
    /// Operation id not known to this crate
    Unknown {
        /// Raw operation id (without the state flag)
        op: u8,
        /// Button state
        state: KeyState,
    },
}

/// Kind of response a target sends for a registered notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotificationKind {
    /// First response to a registration
    Interim,
    /// Final response when the value changes
    Changed,
}

impl From<NotificationKind> for Code {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::Interim => Code::Interim,
            NotificationKind::Changed => Code::Changed,
        }
    }
}

use super::{EventId, MediaAttributeId, PduId, PlaybackStatus};
use crate::constants::{
    CHARSET_UTF8, MAX_APP_ATTRIBUTES, MAX_APP_VALUES, MAX_COMPANY_IDS, MAX_ELEMENT_ATTRIBUTES,
    MAX_ELEMENT_TEXT, MAX_SETTING_TEXT, MAX_SUPPORTED_EVENTS,
};
use heapless::Vec;

/// One attribute/value pair of the player application settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlayerSetting {
    /// Attribute id (equalizer, repeat, shuffle, scan or extended)
    pub attribute: u8,
    /// Value id
    pub value: u8,
}

impl PlayerSetting {
    /// Create a new pair
    #[must_use]
    pub const fn new(attribute: u8, value: u8) -> Self {
        Self { attribute, value }
    }
}

/// Display text of a setting attribute or value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingText {
    /// Attribute or value id
    pub id: u8,
    /// IANA character set
    pub charset: u16,
    /// Text bytes, truncated to capacity
    pub text: Vec<u8, MAX_SETTING_TEXT>,
}

impl SettingText {
    /// Build a UTF-8 entry, truncating to capacity
    #[must_use]
    pub fn utf8(id: u8, text: &str) -> Self {
        Self {
            id,
            charset: CHARSET_UTF8,
            text: truncated(text.as_bytes()),
        }
    }

    /// Text as `&str` when it is valid UTF-8
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.text).ok()
    }
}

/// One media element attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementAttribute {
    /// Attribute id
    pub id: MediaAttributeId,
    /// IANA character set
    pub charset: u16,
    /// Value bytes, truncated to capacity
    pub value: Vec<u8, MAX_ELEMENT_TEXT>,
}

impl ElementAttribute {
    /// Build a UTF-8 attribute, truncating to capacity
    #[must_use]
    pub fn utf8(id: MediaAttributeId, value: &str) -> Self {
        Self {
            id,
            charset: CHARSET_UTF8,
            value: truncated(value.as_bytes()),
        }
    }

    /// Value as `&str` when it is valid UTF-8
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.value).ok()
    }
}

/// Copy as many bytes as fit
pub(crate) fn truncated<const N: usize>(bytes: &[u8]) -> Vec<u8, N> {
    let len = bytes.len().min(N);
    Vec::from_slice(&bytes[..len]).unwrap_or_default()
}

/// Event payload of a register-notification response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// New playback status
    PlaybackStatusChanged(PlaybackStatus),
    /// New track identifier (`u64::MAX` when nothing is selected)
    TrackChanged(u64),
    /// Track reached its end
    TrackReachedEnd,
    /// Track reached its start
    TrackReachedStart,
    /// Playback position in milliseconds
    PlaybackPosChanged(u32),
    /// Battery status
    BatteryStatusChanged(u8),
    /// System status
    SystemStatusChanged(u8),
    /// Changed setting values
    PlayerAppSettingChanged(Vec<PlayerSetting, MAX_APP_ATTRIBUTES>),
    /// Now playing list changed
    NowPlayingContentChanged,
    /// Available players changed
    AvailablePlayersChanged,
    /// Addressed player changed
    AddressedPlayerChanged {
        /// Player id
        player_id: u16,
        /// UID counter
        uid_counter: u16,
    },
    /// UID database changed
    UidsChanged(u16),
    /// Absolute volume (7-bit)
    VolumeChanged(u8),
}

impl Notification {
    /// Event id this payload belongs to
    #[must_use]
    pub fn event_id(&self) -> EventId {
        match self {
            Self::PlaybackStatusChanged(_) => EventId::PlaybackStatusChanged,
            Self::TrackChanged(_) => EventId::TrackChanged,
            Self::TrackReachedEnd => EventId::TrackReachedEnd,
            Self::TrackReachedStart => EventId::TrackReachedStart,
            Self::PlaybackPosChanged(_) => EventId::PlaybackPosChanged,
            Self::BatteryStatusChanged(_) => EventId::BatteryStatusChanged,
            Self::SystemStatusChanged(_) => EventId::SystemStatusChanged,
            Self::PlayerAppSettingChanged(_) => EventId::PlayerAppSettingChanged,
            Self::NowPlayingContentChanged => EventId::NowPlayingContentChanged,
            Self::AvailablePlayersChanged => EventId::AvailablePlayersChanged,
            Self::AddressedPlayerChanged { .. } => EventId::AddressedPlayerChanged,
            Self::UidsChanged(_) => EventId::UidsChanged,
            Self::VolumeChanged(_) => EventId::VolumeChanged,
        }
    }
}

/// A successfully decoded vendor-dependent response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `GetCapabilities(CompanyId)`
    CompanyIds(Vec<u32, MAX_COMPANY_IDS>),
    /// `GetCapabilities(EventsSupported)`, unknown event ids dropped
    EventsSupported(Vec<EventId, MAX_SUPPORTED_EVENTS>),
    /// Attribute ids
    PlayerAppAttributes(Vec<u8, MAX_APP_ATTRIBUTES>),
    /// Value ids of one attribute
    PlayerAppValues(Vec<u8, MAX_APP_VALUES>),
    /// Current attribute values
    CurrentPlayerAppValues(Vec<PlayerSetting, MAX_APP_ATTRIBUTES>),
    /// Attribute display texts
    PlayerAppAttributeText(Vec<SettingText, MAX_APP_ATTRIBUTES>),
    /// Value display texts
    PlayerAppValueText(Vec<SettingText, MAX_APP_VALUES>),
    /// Element attributes of the requested track
    ElementAttributes(Vec<ElementAttribute, MAX_ELEMENT_ATTRIBUTES>),
    /// Play status
    PlayStatus {
        /// Track length in milliseconds
        length: u32,
        /// Position in milliseconds
        position: u32,
        /// Playback status
        status: PlaybackStatus,
    },
    /// Register-notification response (INTERIM or CHANGED)
    Notification(Notification),
    /// Volume applied by the peer
    AbsoluteVolume(u8),
    /// Response without parameters
    Accepted(PduId),
}

impl Response {
    /// PDU id this response answers
    #[must_use]
    pub fn pdu(&self) -> PduId {
        match self {
            Self::CompanyIds(_) | Self::EventsSupported(_) => PduId::GetCapabilities,
            Self::PlayerAppAttributes(_) => PduId::ListPlayerAppAttributes,
            Self::PlayerAppValues(_) => PduId::ListPlayerAppValues,
            Self::CurrentPlayerAppValues(_) => PduId::GetCurrentPlayerAppValue,
            Self::PlayerAppAttributeText(_) => PduId::GetPlayerAppAttributeText,
            Self::PlayerAppValueText(_) => PduId::GetPlayerAppValueText,
            Self::ElementAttributes(_) => PduId::GetElementAttributes,
            Self::PlayStatus { .. } => PduId::GetPlayStatus,
            Self::Notification(_) => PduId::RegisterNotification,
            Self::AbsoluteVolume(_) => PduId::SetAbsoluteVolume,
            Self::Accepted(pdu) => *pdu,
        }
    }
}

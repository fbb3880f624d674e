use super::{CapabilityId, Code, EventId, MediaAttributeId, PduId, PlayerSetting};
use crate::constants::{MAX_APP_ATTRIBUTES, MAX_APP_VALUES, MAX_ELEMENT_ATTRIBUTES};
use heapless::Vec;

/// Character sets listed in `InformDisplayCharset`
pub const MAX_CHARSETS: usize = 4;

/// A vendor-dependent AVRCP command
///
/// Used in both directions: the controller role encodes these towards the peer,
/// the target role decodes them from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Query company ids or supported events
    GetCapabilities(CapabilityId),
    /// List player application setting attributes
    ListPlayerAppAttributes,
    /// List the values of one attribute
    ListPlayerAppValues {
        /// Attribute id
        attribute: u8,
    },
    /// Get the current values of the given attributes
    GetCurrentPlayerAppValue {
        /// Attribute ids
        attributes: Vec<u8, MAX_APP_ATTRIBUTES>,
    },
    /// Change attribute values
    SetPlayerAppValue {
        /// Attribute/value pairs
        settings: Vec<PlayerSetting, MAX_APP_ATTRIBUTES>,
    },
    /// Get display text of attributes
    GetPlayerAppAttributeText {
        /// Attribute ids
        attributes: Vec<u8, MAX_APP_ATTRIBUTES>,
    },
    /// Get display text of the values of one attribute
    GetPlayerAppValueText {
        /// Attribute id
        attribute: u8,
        /// Value ids
        values: Vec<u8, MAX_APP_VALUES>,
    },
    /// Character sets the controller can display
    InformDisplayCharset {
        /// IANA character set ids
        charsets: Vec<u16, MAX_CHARSETS>,
    },
    /// Get media attributes of an element
    GetElementAttributes {
        /// Element identifier, 0 for the currently playing track
        identifier: u64,
        /// Requested attributes, empty meaning all
        attributes: Vec<MediaAttributeId, MAX_ELEMENT_ATTRIBUTES>,
    },
    /// Get play status
    GetPlayStatus,
    /// Register for a notification
    RegisterNotification {
        /// Event to subscribe to
        event: EventId,
        /// Playback interval in seconds (position events only)
        interval: u32,
    },
    /// Continue a fragmented response
    RequestContinuingResponse {
        /// PDU being continued
        target: u8,
    },
    /// Abort a fragmented response
    AbortContinuingResponse {
        /// PDU being aborted
        target: u8,
    },
    /// Set absolute volume (7-bit)
    SetAbsoluteVolume(u8),
}

impl Command {
    /// PDU id of the command
    #[must_use]
    pub fn pdu(&self) -> PduId {
        match self {
            Self::GetCapabilities(_) => PduId::GetCapabilities,
            Self::ListPlayerAppAttributes => PduId::ListPlayerAppAttributes,
            Self::ListPlayerAppValues { .. } => PduId::ListPlayerAppValues,
            Self::GetCurrentPlayerAppValue { .. } => PduId::GetCurrentPlayerAppValue,
            Self::SetPlayerAppValue { .. } => PduId::SetPlayerAppValue,
            Self::GetPlayerAppAttributeText { .. } => PduId::GetPlayerAppAttributeText,
            Self::GetPlayerAppValueText { .. } => PduId::GetPlayerAppValueText,
            Self::InformDisplayCharset { .. } => PduId::InformDisplayCharset,
            Self::GetElementAttributes { .. } => PduId::GetElementAttributes,
            Self::GetPlayStatus => PduId::GetPlayStatus,
            Self::RegisterNotification { .. } => PduId::RegisterNotification,
            Self::RequestContinuingResponse { .. } => PduId::RequestContinuingResponse,
            Self::AbortContinuingResponse { .. } => PduId::AbortContinuingResponse,
            Self::SetAbsoluteVolume(_) => PduId::SetAbsoluteVolume,
        }
    }

    /// AV/C command type used on the wire
    #[must_use]
    pub fn code(&self) -> Code {
        match self {
            Self::SetPlayerAppValue { .. }
            | Self::InformDisplayCharset { .. }
            | Self::RequestContinuingResponse { .. }
            | Self::AbortContinuingResponse { .. }
            | Self::SetAbsoluteVolume(_) => Code::Control,
            Self::RegisterNotification { .. } => Code::Notify,
            _ => Code::Status,
        }
    }

    /// Control commands use the control timeout, everything else the status timeout
    #[must_use]
    pub fn is_control(&self) -> bool {
        self.code() == Code::Control
    }

    /// Request all standard element attributes of the playing track
    #[must_use]
    pub fn now_playing_attributes() -> Self {
        Self::GetElementAttributes {
            identifier: 0,
            attributes: MediaAttributeId::ALL.iter().copied().collect(),
        }
    }
}

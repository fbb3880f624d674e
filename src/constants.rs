//! `Tunebird` Constants
//!
//! This module contains the limits, default timings and AVRCP wire values used
//! throughout the `Tunebird` library.

use core::time::Duration;

/// Depth of the static request, response, link and timer channels
pub const MAX_CHANNELS: usize = 8;

/// Number of transaction labels (4-bit AV/C label space)
pub const MAX_LABELS: usize = 16;

/// Maximum size of an encoded vendor-dependent payload in bytes
pub const MAX_PAYLOAD_SIZE: usize = 512;

/// Maximum number of notification events tracked per connection
pub const MAX_SUPPORTED_EVENTS: usize = 16;

/// Maximum number of company identifiers kept from a capability response
pub const MAX_COMPANY_IDS: usize = 8;

/// Maximum number of player application setting attributes
pub const MAX_APP_ATTRIBUTES: usize = 8;

/// Maximum number of values per player application setting attribute
pub const MAX_APP_VALUES: usize = 8;

/// Maximum length of a player application setting display text
pub const MAX_SETTING_TEXT: usize = 32;

/// Number of media element attributes (title .. playing time)
pub const MAX_ELEMENT_ATTRIBUTES: usize = 7;

/// Maximum length of a media element attribute value
pub const MAX_ELEMENT_TEXT: usize = 128;

/// Maximum number of pending target-role responses
pub const MAX_PENDING_RESPONSES: usize = 8;

/// Maximum number of peers on the absolute volume deny-list
pub const MAX_DENY_LIST: usize = 8;

/// Default timeout for STATUS class commands
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(2);

/// Default timeout for CONTROL class commands
pub const DEFAULT_CONTROL_TIMEOUT: Duration = Duration::from_secs(2);

/// Default play status polling interval while the peer is playing
pub const DEFAULT_PLAY_STATUS_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Bluetooth SIG company identifier used in vendor-dependent frames
pub const BLUETOOTH_SIG_COMPANY_ID: u32 = 0x0000_1958;

/// Track identifier reported when no track is selected
pub const NO_TRACK_SELECTED: u64 = u64::MAX;

/// Highest absolute volume value (7 bits)
pub const MAX_VOLUME: u8 = 0x7F;

/// Volume value meaning "not yet known"
pub const VOLUME_UNKNOWN: u8 = 0xFF;

/// IANA MIBenum for UTF-8
pub const CHARSET_UTF8: u16 = 0x006A;

/// First player application setting attribute id of the extended (menu) range
pub const FIRST_EXTENDED_ATTRIBUTE: u8 = 0x80;

/// Size of the vendor-dependent header (company id, pdu, packet type, length)
pub const VENDOR_HEADER_SIZE: usize = 7;

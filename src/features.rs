//! Peer feature bitmasks
//!
//! AVRCP peers advertise their roles and optional capabilities through the SDP
//! `SupportedFeatures` attribute and the profile version. The link layer folds these
//! into a single bitmask which is passed to [`crate::AvrcpHost::handle_connect`].
//!
//! ## Usage
//!
//! ```rust
//! use tunebird::PeerFeatures;
//!
//! let features = PeerFeatures::from_raw(PeerFeatures::TARGET | PeerFeatures::METADATA);
//! assert!(features.is_target());
//! assert!(!features.supports_absolute_volume());
//! ```

use core::fmt::Write;

/// Features negotiated with the remote peer
///
/// Bit layout of the folded feature mask:
/// - `0x0001` remote is a target (RCTG)
/// - `0x0002` remote is a controller (RCCT)
/// - `0x0004` content protection
/// - `0x0008` vendor-dependent commands
/// - `0x0010` browsing
/// - `0x0040` metadata PDUs
/// - `0x0200` advanced control (absolute volume)
/// - `0x2000` player application settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerFeatures {
    raw: u16,
}

impl PeerFeatures {
    /// Remote supports the target role
    pub const TARGET: u16 = 0x0001;
    /// Remote supports the controller role
    pub const CONTROLLER: u16 = 0x0002;
    /// Content protection
    pub const PROTECT: u16 = 0x0004;
    /// Vendor-dependent commands
    pub const VENDOR: u16 = 0x0008;
    /// Browsing channel
    pub const BROWSE: u16 = 0x0010;
    /// Metadata PDUs
    pub const METADATA: u16 = 0x0040;
    /// Advanced control (absolute volume, notifications)
    pub const ADVANCED_CONTROL: u16 = 0x0200;
    /// Player application settings
    pub const APP_SETTINGS: u16 = 0x2000;

    /// Create `PeerFeatures` from a raw mask
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    /// Get the raw mask
    #[must_use]
    pub const fn raw(&self) -> u16 {
        self.raw
    }

    /// No feature bits set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw == 0
    }

    /// Check a single bit or combination of bits
    #[must_use]
    pub const fn contains(&self, bits: u16) -> bool {
        self.raw & bits == bits
    }

    /// Return a copy without the given bits
    #[must_use]
    pub const fn without(self, bits: u16) -> Self {
        Self {
            raw: self.raw & !bits,
        }
    }

    /// Remote can act as target
    #[must_use]
    pub const fn is_target(&self) -> bool {
        self.contains(Self::TARGET)
    }

    /// Remote can act as controller
    #[must_use]
    pub const fn is_controller(&self) -> bool {
        self.contains(Self::CONTROLLER)
    }

    /// Remote supports metadata transactions over vendor-dependent frames
    #[must_use]
    pub const fn supports_metadata(&self) -> bool {
        self.contains(Self::METADATA | Self::VENDOR)
    }

    /// Remote target accepts absolute volume commands and notifications
    #[must_use]
    pub const fn supports_absolute_volume(&self) -> bool {
        self.contains(Self::TARGET | Self::ADVANCED_CONTROL)
    }

    /// Remote supports player application settings
    #[must_use]
    pub const fn supports_app_settings(&self) -> bool {
        self.contains(Self::APP_SETTINGS)
    }

    /// Names of all set bits
    #[must_use]
    pub fn descriptions(&self) -> heapless::Vec<&'static str, 8> {
        const NAMES: [(u16, &str); 8] = [
            (PeerFeatures::TARGET, "Target"),
            (PeerFeatures::CONTROLLER, "Controller"),
            (PeerFeatures::PROTECT, "Protect"),
            (PeerFeatures::VENDOR, "Vendor"),
            (PeerFeatures::BROWSE, "Browse"),
            (PeerFeatures::METADATA, "Metadata"),
            (PeerFeatures::ADVANCED_CONTROL, "Advanced Control"),
            (PeerFeatures::APP_SETTINGS, "App Settings"),
        ];

        NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl core::fmt::Display for PeerFeatures {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        for (i, name) in self.descriptions().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// Remote capabilities reported to the platform in [`crate::Event::RemoteFeatures`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RemoteFeatures {
    raw: u8,
}

impl RemoteFeatures {
    /// Metadata transactions
    pub const METADATA: u8 = 0x01;
    /// Absolute volume
    pub const ABSOLUTE_VOLUME: u8 = 0x02;
    /// Browsing
    pub const BROWSE: u8 = 0x04;

    /// Create `RemoteFeatures` from a raw mask
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self { raw }
    }

    /// Get the raw mask
    #[must_use]
    pub const fn raw(&self) -> u8 {
        self.raw
    }

    /// Metadata is supported
    #[must_use]
    pub const fn metadata(&self) -> bool {
        self.raw & Self::METADATA != 0
    }

    /// Absolute volume is supported
    #[must_use]
    pub const fn absolute_volume(&self) -> bool {
        self.raw & Self::ABSOLUTE_VOLUME != 0
    }

    /// Browsing is supported
    #[must_use]
    pub const fn browse(&self) -> bool {
        self.raw & Self::BROWSE != 0
    }

    /// Convert to a heapless string
    #[must_use]
    pub fn to_string<const N: usize>(&self) -> heapless::String<N> {
        let mut buffer = heapless::String::<N>::new();
        write!(buffer, "{self}").ok();
        buffer
    }
}

impl From<PeerFeatures> for RemoteFeatures {
    fn from(features: PeerFeatures) -> Self {
        let mut raw = 0;
        if features.contains(PeerFeatures::BROWSE) {
            raw |= Self::BROWSE;
        }
        if features.contains(PeerFeatures::METADATA) {
            raw |= Self::METADATA;
        }
        if features.contains(PeerFeatures::ADVANCED_CONTROL) {
            raw |= Self::ABSOLUTE_VOLUME;
        }
        Self { raw }
    }
}

impl core::fmt::Display for RemoteFeatures {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (set, name) in [
            (self.metadata(), "Metadata"),
            (self.absolute_volume(), "Absolute Volume"),
            (self.browse(), "Browse"),
        ] {
            if set {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("None")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_features_roles() {
        let features = PeerFeatures::from_raw(0x0001 | 0x0040 | 0x0008);
        assert!(features.is_target());
        assert!(!features.is_controller());
        assert!(features.supports_metadata());
        assert!(!features.supports_absolute_volume());
        assert!(!features.supports_app_settings());
    }

    #[test]
    fn test_peer_features_without() {
        let features = PeerFeatures::from_raw(PeerFeatures::TARGET | PeerFeatures::ADVANCED_CONTROL);
        assert!(features.supports_absolute_volume());

        let stripped = features.without(PeerFeatures::ADVANCED_CONTROL);
        assert!(stripped.is_target());
        assert!(!stripped.supports_absolute_volume());
        assert_eq!(stripped.raw(), PeerFeatures::TARGET);
    }

    #[test]
    fn test_remote_features_from_peer() {
        let peer = PeerFeatures::from_raw(
            PeerFeatures::TARGET | PeerFeatures::METADATA | PeerFeatures::ADVANCED_CONTROL,
        );
        let remote = RemoteFeatures::from(peer);
        assert!(remote.metadata());
        assert!(remote.absolute_volume());
        assert!(!remote.browse());
        assert_eq!(remote.raw(), 0x03);
    }

    #[test]
    fn test_feature_display() {
        let peer = PeerFeatures::from_raw(PeerFeatures::TARGET | PeerFeatures::APP_SETTINGS);
        let descriptions = peer.descriptions();
        assert_eq!(descriptions.as_slice(), &["Target", "App Settings"]);

        let remote = RemoteFeatures::from_raw(RemoteFeatures::ABSOLUTE_VOLUME);
        assert_eq!(remote.to_string::<32>().as_str(), "Absolute Volume");
        assert_eq!(RemoteFeatures::default().to_string::<8>().as_str(), "None");
    }
}

use crate::AvrcpError;
use core::fmt::Write;

/// A Bluetooth Device Address (`BD_ADDR`) identifying an AVRCP peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BluetoothAddress(pub [u8; 6]);

impl BluetoothAddress {
    /// Create a new Bluetooth address from bytes
    #[must_use]
    pub const fn new(addr: [u8; 6]) -> Self {
        Self(addr)
    }

    /// Get the raw address bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Format the address as a colon-separated upper-case hex string
    #[must_use]
    pub fn format_hex(&self) -> heapless::String<17> {
        let mut result = heapless::String::new();
        for (i, byte) in self.0.iter().enumerate() {
            let sep = if i == 0 { "" } else { ":" };
            // 17 bytes always fit
            write!(result, "{sep}{byte:02X}").ok();
        }
        result
    }

    /// Parse a Bluetooth address from a colon-separated hex string
    ///
    /// # Errors
    /// Returns `AvrcpError::InvalidParameter` if the string is not six colon-separated
    /// hex octets.
    pub fn from_hex(hex: &str) -> Result<Self, AvrcpError> {
        if hex.len() != 17 {
            return Err(AvrcpError::InvalidParameter);
        }

        let mut bytes = [0u8; 6];
        let mut octets = hex.split(':');
        for slot in &mut bytes {
            let octet = octets.next().ok_or(AvrcpError::InvalidParameter)?;
            if octet.len() != 2 {
                return Err(AvrcpError::InvalidParameter);
            }
            *slot = u8::from_str_radix(octet, 16).map_err(|_| AvrcpError::InvalidParameter)?;
        }
        if octets.next().is_some() {
            return Err(AvrcpError::InvalidParameter);
        }
        Ok(Self(bytes))
    }
}

impl From<[u8; 6]> for BluetoothAddress {
    fn from(addr: [u8; 6]) -> Self {
        Self(addr)
    }
}

impl From<BluetoothAddress> for bt_hci::param::BdAddr {
    fn from(addr: BluetoothAddress) -> Self {
        bt_hci::param::BdAddr::new(addr.0)
    }
}

impl From<bt_hci::param::BdAddr> for BluetoothAddress {
    fn from(bd_addr: bt_hci::param::BdAddr) -> Self {
        Self(bd_addr.raw().try_into().unwrap_or([0; 6]))
    }
}

impl TryFrom<&str> for BluetoothAddress {
    type Error = AvrcpError;

    fn try_from(hex: &str) -> Result<Self, Self::Error> {
        Self::from_hex(hex)
    }
}

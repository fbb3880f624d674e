//! Link transport seam
//!
//! AV/C frames travel over an L2CAP channel owned by the platform. The protocol core
//! only sees [`Frame`]s: the session handle, the transaction label, the `ctype` or
//! response code, the opcode and the operand bytes that follow the opcode.

use crate::codec::Payload;
use crate::packets::{Code, Opcode};

/// Errors reported by the link transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Session is not open
    NotConnected,
    /// Link is congested, try again later
    Busy,
    /// Lower layer failure
    Io,
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotConnected => write!(f, "AVRCP session not connected"),
            Self::Busy => write!(f, "AVRCP link busy"),
            Self::Io => write!(f, "AVRCP link I/O error"),
        }
    }
}

/// One AV/C frame on the control channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Session (link) handle
    pub session: u16,
    /// Transaction label (4 bits)
    pub label: u8,
    /// Raw `ctype` or response code
    pub code: u8,
    /// Raw AV/C opcode
    pub opcode: u8,
    /// Operands after the opcode
    pub payload: Payload,
}

impl Frame {
    /// Create a frame from raw header values
    #[must_use]
    pub const fn new(session: u16, label: u8, code: u8, opcode: u8, payload: Payload) -> Self {
        Self {
            session,
            label,
            code,
            opcode,
            payload,
        }
    }

    /// Vendor-dependent frame
    #[must_use]
    pub const fn vendor(session: u16, label: u8, code: Code, payload: Payload) -> Self {
        Self::new(
            session,
            label,
            code.raw(),
            Opcode::VendorDependent.raw(),
            payload,
        )
    }

    /// Pass-through frame
    #[must_use]
    pub const fn passthrough(session: u16, label: u8, code: Code, payload: Payload) -> Self {
        Self::new(session, label, code.raw(), Opcode::PassThrough.raw(), payload)
    }
}

/// Sends frames to the peer
pub trait Transport {
    /// Queue a frame on the session
    ///
    /// # Errors
    /// Returns `TransportError` when the frame could not be queued.
    fn send(&mut self, frame: &Frame) -> Result<(), TransportError>;

    /// Close a session, used to refuse a second connection
    fn close(&mut self, session: u16);
}

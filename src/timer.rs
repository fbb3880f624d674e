//! Timer service seam
//!
//! The protocol core never sleeps. Every outstanding transaction and the play status
//! poll are backed by a timer that the platform arms through [`TimerService`]. When a
//! timer fires, the platform hands a [`TimerExpiry`] back with [`notify_expired`]
//! (or calls [`crate::AvrcpHost::handle_timer_expired`] directly when it drives the
//! host itself).
//!
//! Expiries are validated against the handle currently armed for the label, so a timer
//! that fires after its transaction completed is dropped.

use crate::label::Label;
use crate::packets::{GroupNavigation, PassThroughOp, PduId};
use crate::{AvrcpError, TIMER_CHANNEL};
use core::time::Duration;

/// Opaque handle of an armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerHandle(pub u32);

/// Control-class operation a transaction timer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlCommand {
    /// Vendor-dependent control PDU (set player value, set absolute volume, ...)
    Vendor(PduId),
    /// Pass-through key
    PassThrough(PassThroughOp),
    /// Vendor-unique group navigation
    GroupNavigation(GroupNavigation),
}

/// What a transaction timer guards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerContext {
    /// STATUS or NOTIFY command
    Status {
        /// PDU of the command
        pdu: PduId,
        /// Owning label
        label: Label,
    },
    /// CONTROL command
    Control {
        /// Operation of the command
        command: ControlCommand,
        /// Owning label
        label: Label,
    },
}

impl TimerContext {
    /// Label the timer belongs to
    #[must_use]
    pub const fn label(&self) -> Label {
        match self {
            Self::Status { label, .. } | Self::Control { label, .. } => *label,
        }
    }

    /// Vendor-dependent PDU guarded by this timer, if any
    #[must_use]
    pub const fn pdu(&self) -> Option<PduId> {
        match self {
            Self::Status { pdu, .. }
            | Self::Control {
                command: ControlCommand::Vendor(pdu),
                ..
            } => Some(*pdu),
            Self::Control { .. } => None,
        }
    }
}

/// Purpose of an armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerKind {
    /// Response timeout of an outstanding transaction
    Transaction(TimerContext),
    /// Periodic `GetPlayStatus` while the peer is playing
    PlayStatusPoll,
}

/// A fired timer handed back to the protocol core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerExpiry {
    /// Handle returned by [`TimerService::arm`]
    pub handle: TimerHandle,
    /// Kind passed to [`TimerService::arm`]
    pub kind: TimerKind,
}

/// One-shot timers provided by the platform
pub trait TimerService {
    /// Start a one-shot timer
    fn arm(&mut self, duration: Duration, kind: TimerKind) -> TimerHandle;

    /// Stop a timer; unknown or fired handles are ignored
    fn cancel(&mut self, handle: TimerHandle);

    /// Whether the timer is still pending
    fn is_scheduled(&self, handle: TimerHandle) -> bool;
}

/// Hand a fired timer to the processor task
///
/// Non-blocking, callable from interrupt or timer context.
///
/// # Errors
/// Returns `AvrcpError::ChannelFull` when the timer channel is full.
pub fn notify_expired(expiry: TimerExpiry) -> Result<(), AvrcpError> {
    TIMER_CHANNEL.try_send(expiry).map_err(|_| {
        warn!("[TIMER] Timer channel full, dropping expiry {}", expiry.handle.0);
        AvrcpError::ChannelFull
    })
}

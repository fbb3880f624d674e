//! Transaction Label Pool
//!
//! AV/C correlates a response with its command through a 4-bit transaction label, so
//! at most 16 commands can be outstanding on a connection. The pool hands out the
//! lowest free label, remembers the session it was taken for and the response timer
//! armed for it, and gives the timer back on release so the caller can cancel it.
//!
//! The pool is guarded by a blocking critical-section mutex. Nothing calls back into
//! the pool while it is locked: timers come out of [`LabelPool::release`] and
//! [`LabelPool::release_all`] and are cancelled after the lock is dropped.

use crate::AvrcpError;
use crate::constants::MAX_LABELS;
use crate::timer::{TimerContext, TimerHandle};
use core::cell::RefCell;
use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use heapless::Vec;

/// A transaction label owned by an outstanding command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Label(u8);

impl Label {
    /// Validate a label received on the wire
    #[must_use]
    pub const fn from_wire(raw: u8) -> Option<Self> {
        if (raw as usize) < MAX_LABELS {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Wire value
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Response timer armed for a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArmedTimer {
    /// Handle returned by the timer service
    pub handle: TimerHandle,
    /// What the timer guards
    pub context: TimerContext,
}

/// Snapshot of an owned label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transaction {
    /// The label
    pub label: Label,
    /// Session the label was allocated on
    pub session: u16,
    /// Armed response timer, `None` after an interim response
    pub timer: Option<ArmedTimer>,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    in_use: bool,
    session: u16,
    timer: Option<ArmedTimer>,
}

impl Slot {
    const FREE: Slot = Slot {
        in_use: false,
        session: 0,
        timer: None,
    };
}

/// Fixed pool of the 16 AV/C transaction labels
pub struct LabelPool {
    slots: Mutex<CriticalSectionRawMutex, RefCell<[Slot; MAX_LABELS]>>,
}

impl LabelPool {
    /// Create a pool with every label free
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new([Slot::FREE; MAX_LABELS])),
        }
    }

    /// Take the lowest free label
    ///
    /// # Errors
    /// Returns `AvrcpError::Busy` when all 16 labels are in use.
    pub fn allocate(&self, session: u16) -> Result<Label, AvrcpError> {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            let (index, slot) = slots
                .iter_mut()
                .enumerate()
                .find(|(_, slot)| !slot.in_use)
                .ok_or(AvrcpError::Busy)?;
            *slot = Slot {
                in_use: true,
                session,
                timer: None,
            };
            // Index is below MAX_LABELS (16)
            Ok(Label(index as u8))
        })
    }

    /// Free a label, returning its timer for cancellation
    ///
    /// Releasing a free label is a no-op.
    pub fn release(&self, label: Label) -> Option<ArmedTimer> {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            let slot = &mut slots[label.index()];
            if !slot.in_use {
                return None;
            }
            let timer = slot.timer;
            *slot = Slot::FREE;
            timer
        })
    }

    /// Read an owned label
    ///
    /// # Errors
    /// Returns `AvrcpError::NotFound` when the label is free.
    pub fn lookup(&self, label: Label) -> Result<Transaction, AvrcpError> {
        self.slots.lock(|slots| {
            let slot = slots.borrow()[label.index()];
            if slot.in_use {
                Ok(Transaction {
                    label,
                    session: slot.session,
                    timer: slot.timer,
                })
            } else {
                Err(AvrcpError::NotFound)
            }
        })
    }

    /// Record the response timer of an owned label
    ///
    /// # Errors
    /// Returns `AvrcpError::NotFound` when the label is free.
    pub fn arm(
        &self,
        label: Label,
        handle: TimerHandle,
        context: TimerContext,
    ) -> Result<(), AvrcpError> {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            let slot = &mut slots[label.index()];
            if !slot.in_use {
                return Err(AvrcpError::NotFound);
            }
            slot.timer = Some(ArmedTimer { handle, context });
            Ok(())
        })
    }

    /// Detach the timer but keep the label owned
    pub fn disarm(&self, label: Label) -> Option<ArmedTimer> {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            let slot = &mut slots[label.index()];
            if slot.in_use { slot.timer.take() } else { None }
        })
    }

    /// Free every label, returning all armed timers
    pub fn release_all(&self) -> Vec<ArmedTimer, MAX_LABELS> {
        self.slots.lock(|slots| {
            let mut timers = Vec::new();
            for slot in slots.borrow_mut().iter_mut() {
                if let Some(timer) = slot.timer {
                    // At most one timer per slot
                    timers.push(timer).ok();
                }
                *slot = Slot::FREE;
            }
            timers
        })
    }

    /// Number of owned labels
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.slots
            .lock(|slots| slots.borrow().iter().filter(|slot| slot.in_use).count())
    }
}

impl Default for LabelPool {
    fn default() -> Self {
        Self::new()
    }
}

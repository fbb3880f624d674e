//! Notification subscription manager
//!
//! The controller role subscribes to the peer's events one at a time: the next
//! registration is only sent after the previous one produced an INTERIM response or
//! failed. A CHANGED response ends the subscription, so it is renewed right away.

use super::{AvrcpHost, LabelAction};
use crate::codec::{Codec, CommandFailure};
use crate::constants::NO_TRACK_SELECTED;
use crate::events::{Event, EventSink};
use crate::label::Label;
use crate::packets::{Code, Command, EventId, Notification, PlaybackStatus};
use crate::timer::TimerService;
use crate::transport::Transport;

/// Registration state of one peer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationStatus {
    /// Not subscribed
    NotRegistered,
    /// Registration sent, waiting for INTERIM
    Registered,
    /// INTERIM received, waiting for CHANGED
    Interim,
}

/// An event the peer supports and the controller role subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SupportedEvent {
    /// Event id
    pub event: EventId,
    /// Registration state
    pub status: RegistrationStatus,
    /// Label of the outstanding registration
    pub label: Option<Label>,
}

impl SupportedEvent {
    /// Event not yet registered
    #[must_use]
    pub const fn new(event: EventId) -> Self {
        Self {
            event,
            status: RegistrationStatus::NotRegistered,
            label: None,
        }
    }
}

impl<C, T, M, S> AvrcpHost<C, T, M, S>
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    /// Send `RegisterNotification` for a tracked event
    pub(crate) fn register_for_event(&mut self, event: EventId) -> bool {
        let command = Command::RegisterNotification { event, interval: 0 };
        match self.send_command(&command) {
            Ok(label) => {
                if let Some(entry) = self.events.iter_mut().find(|e| e.event == event) {
                    entry.status = RegistrationStatus::Registered;
                    entry.label = Some(label);
                }
                debug!("[NOTIFY] Registering event {} on label {}", event.raw(), label.raw());
                true
            }
            Err(e) => {
                warn!("[NOTIFY] Registration of event {} failed: {}", event.raw(), e);
                self.remove_event(event);
                false
            }
        }
    }

    /// Register the next unregistered event, or hand over to settings discovery
    pub(crate) fn advance_registration(&mut self) {
        if self
            .events
            .iter()
            .any(|e| e.status == RegistrationStatus::Registered)
        {
            return;
        }
        while let Some(event) = self
            .events
            .iter()
            .find(|e| e.status == RegistrationStatus::NotRegistered)
            .map(|e| e.event)
        {
            if self.register_for_event(event) {
                return;
            }
        }
        if !self.settings.query_started {
            self.start_settings_discovery();
        }
    }

    pub(crate) fn on_notification(
        &mut self,
        label: Label,
        code: Code,
        notification: Notification,
    ) -> LabelAction {
        let event = notification.event_id();
        let Some(index) = self.events.iter().position(|e| e.label == Some(label)) else {
            debug!("[NOTIFY] Event {} on unexpected label {}", event.raw(), label.raw());
            return LabelAction::Release;
        };

        match code {
            Code::Interim => {
                self.apply_interim(notification);
                if let Some(entry) = self.events.get_mut(index) {
                    entry.status = RegistrationStatus::Interim;
                }
                self.advance_registration();
                LabelAction::KeepDisarmed
            }
            Code::Changed => {
                if let Some(entry) = self.events.get_mut(index) {
                    entry.status = RegistrationStatus::NotRegistered;
                    entry.label = None;
                }
                self.register_for_event(event);
                self.apply_changed(notification);
                LabelAction::Release
            }
            _ => {
                warn!("[NOTIFY] Unexpected code {} for event {}", code.raw(), event.raw());
                LabelAction::Release
            }
        }
    }

    /// Timeout, reject or malformed response: drop the event for this connection
    pub(crate) fn on_notification_failure(&mut self, label: Label, failure: CommandFailure) {
        let Some(event) = self
            .events
            .iter()
            .find(|e| e.label == Some(label))
            .map(|e| e.event)
        else {
            return;
        };
        warn!("[NOTIFY] Event {} dropped: {}", event.raw(), failure);
        self.remove_event(event);
        self.advance_registration();
    }

    fn remove_event(&mut self, event: EventId) {
        self.events.retain(|e| e.event != event);
    }

    fn apply_interim(&mut self, notification: Notification) {
        match notification {
            Notification::PlaybackStatusChanged(status) => {
                if status == PlaybackStatus::Playing {
                    self.start_play_status_poll();
                }
                self.emit(Event::PlayStatusChanged(status));
            }
            Notification::TrackChanged(uid) if uid != NO_TRACK_SELECTED => {
                self.connection.playing_uid = uid;
            }
            _ => {}
        }
    }

    fn apply_changed(&mut self, notification: Notification) {
        match notification {
            Notification::PlaybackStatusChanged(status) => {
                if status == PlaybackStatus::Playing {
                    self.start_play_status_poll();
                } else {
                    self.stop_play_status_poll();
                }
                self.emit(Event::PlayStatusChanged(status));
            }
            Notification::TrackChanged(uid) if uid != NO_TRACK_SELECTED => {
                self.connection.playing_uid = uid;
                self.fetch_now_playing();
            }
            Notification::PlayerAppSettingChanged(settings) => {
                self.emit(Event::PlayerAppSettingsChanged(settings));
            }
            other => debug!("[NOTIFY] Event {} changed", other.event_id().raw()),
        }
    }
}

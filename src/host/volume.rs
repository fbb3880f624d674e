//! Absolute volume
//!
//! As target (local audio source) the host registers for the peer's volume changes and
//! sets the peer's volume. As controller (local sink) it forwards the peer's volume
//! commands to the platform and sends back the platform's answers.

use super::{AvrcpHost, LabelAction};
use crate::AvrcpError;
use crate::codec::{Codec, CommandFailure};
use crate::constants::MAX_VOLUME;
use crate::events::{Event, EventSink};
use crate::label::Label;
use crate::packets::{Code, Command, EventId, Notification, NotificationKind, Response};
use crate::timer::TimerService;
use crate::transport::Transport;

const VOLUME_REGISTRATION: Command = Command::RegisterNotification {
    event: EventId::VolumeChanged,
    interval: 0,
};

impl<C, T, M, S> AvrcpHost<C, T, M, S>
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    /// Subscribe to the peer's volume changes
    pub(crate) fn register_volume_change(&mut self) {
        if self.connection.volume_label.is_some() {
            debug!("[VOLUME] Registration already outstanding");
            return;
        }
        if !self.effective_features().supports_absolute_volume() {
            return;
        }
        match self.send_command(&VOLUME_REGISTRATION) {
            Ok(label) => self.connection.volume_label = Some(label),
            Err(e) => warn!("[VOLUME] Registration failed: {}", e),
        }
    }

    pub(crate) fn on_volume_notification(
        &mut self,
        label: Label,
        code: Code,
        volume: u8,
    ) -> LabelAction {
        if self.connection.volume_label != Some(label) {
            debug!("[VOLUME] Notification on foreign label {}", label.raw());
            return LabelAction::Keep;
        }
        let volume = volume & MAX_VOLUME;
        match code {
            Code::Interim => {
                self.connection.volume = volume;
                self.emit(Event::VolumeChanged { volume, code });
                LabelAction::KeepDisarmed
            }
            Code::Changed => {
                self.connection.volume = volume;
                self.emit(Event::VolumeChanged { volume, code });
                match self.resend_on_label(label, &VOLUME_REGISTRATION) {
                    Ok(()) => LabelAction::Keep,
                    Err(_) => {
                        self.connection.volume_label = None;
                        LabelAction::Release
                    }
                }
            }
            _ => {
                warn!("[VOLUME] Unexpected code {}", code.raw());
                self.connection.volume_label = None;
                LabelAction::Release
            }
        }
    }

    pub(crate) fn on_volume_registration_failure(&mut self, failure: CommandFailure) {
        self.connection.volume_label = None;
        let code = match failure {
            CommandFailure::Rejected(_) => Code::Rejected,
            CommandFailure::NotImplemented => Code::NotImplemented,
            CommandFailure::Malformed(_) | CommandFailure::Timeout => {
                warn!("[VOLUME] Registration ended: {}", failure);
                return;
            }
        };
        let volume = self.connection.volume;
        self.emit(Event::VolumeChanged { volume, code });
    }

    /// Set the peer's absolute volume (7-bit)
    ///
    /// # Errors
    /// - `NotReady` when no peer is connected
    /// - `Unchanged` when `volume` is the last volume the peer reported
    /// - `Unsupported` when the peer does not take absolute volume
    /// - `Fail` when the command could not be sent
    pub fn set_volume(&mut self, volume: u8) -> Result<(), AvrcpError> {
        if !self.connection.connected {
            return Err(AvrcpError::NotReady);
        }
        let volume = volume & MAX_VOLUME;
        if volume == self.connection.volume {
            return Err(AvrcpError::Unchanged);
        }
        if !self.effective_features().supports_absolute_volume() {
            return Err(AvrcpError::Unsupported);
        }
        info!("[VOLUME] Setting peer volume to {}", volume);
        self.send_command(&Command::SetAbsoluteVolume(volume))
            .map(|_| ())
    }

    pub(crate) fn on_set_volume_response(&mut self, volume: u8, code: Code) {
        let volume = volume & MAX_VOLUME;
        if code == Code::Accepted {
            self.connection.volume = volume;
        }
        self.emit(Event::VolumeChanged { volume, code });
    }

    pub(crate) fn on_set_volume_failure(&mut self, failure: CommandFailure) {
        let volume = self.connection.volume;
        match failure {
            CommandFailure::Rejected(_) => self.emit(Event::VolumeChanged {
                volume,
                code: Code::Rejected,
            }),
            CommandFailure::NotImplemented => self.emit(Event::VolumeChanged {
                volume,
                code: Code::NotImplemented,
            }),
            CommandFailure::Malformed(_) | CommandFailure::Timeout => {
                self.emit(Event::VolumeCommandFailed(failure));
            }
        }
    }

    /// Accept a `SetAbsoluteVolume` command received on `label`
    ///
    /// # Errors
    /// Returns `NotReady` when disconnected, `Transport` when the answer cannot be sent.
    pub fn set_volume_response(&mut self, volume: u8, label: u8) -> Result<(), AvrcpError> {
        self.send_response(label, Code::Accepted, &Response::AbsoluteVolume(volume & MAX_VOLUME))
    }

    /// Answer the peer's volume change registration
    ///
    /// A CHANGED answer ends the registration.
    ///
    /// # Errors
    /// Returns `NotReady` when disconnected, `Transport` when the answer cannot be sent.
    pub fn volume_change_notification_response(
        &mut self,
        kind: NotificationKind,
        volume: u8,
        label: u8,
    ) -> Result<(), AvrcpError> {
        let response = Response::Notification(Notification::VolumeChanged(volume & MAX_VOLUME));
        self.send_response(label, kind.into(), &response)?;
        if kind == NotificationKind::Changed {
            self.connection.registrations.remove(&EventId::VolumeChanged);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::AvrcpError;
    use crate::codec::CommandFailure;
    use crate::constants::VOLUME_UNKNOWN;
    use crate::events::Event;
    use crate::features::PeerFeatures;
    use crate::packets::{
        Code, Command, EventId, Notification, NotificationKind, PduId, Response, StatusCode,
    };
    use crate::testing::{self, connected_host};
    use crate::timer::TimerKind;

    const VOLUME_PEER: u16 = PeerFeatures::TARGET | PeerFeatures::ADVANCED_CONTROL;

    fn volume_notification(label: u8, code: Code, volume: u8) -> crate::transport::Frame {
        testing::response(
            label,
            code,
            &Response::Notification(Notification::VolumeChanged(volume)),
        )
    }

    #[test]
    fn test_registration_interim_then_changed() {
        let mut host = connected_host(VOLUME_PEER);
        host.register_volume_change();
        host.register_volume_change();
        assert_eq!(host.transport.sent.len(), 1);
        let label = host.connection.volume_label.unwrap();

        host.handle_inbound_message(&volume_notification(label.raw(), Code::Interim, 0x40));
        assert_eq!(host.volume(), 0x40);
        assert!(host.labels.lookup(label).unwrap().timer.is_none());

        host.handle_inbound_message(&volume_notification(label.raw(), Code::Changed, 0x50));
        assert_eq!(host.volume(), 0x50);
        // Registration re-sent on the same label with a fresh timer
        assert_eq!(host.transport.sent.len(), 2);
        assert_eq!(host.transport.sent[1].label, label.raw());
        assert!(host.labels.lookup(label).unwrap().timer.is_some());
        assert_eq!(
            host.sink.events.as_slice(),
            &[
                Event::VolumeChanged {
                    volume: 0x40,
                    code: Code::Interim
                },
                Event::VolumeChanged {
                    volume: 0x50,
                    code: Code::Changed
                },
            ]
        );
    }

    #[test]
    fn test_changed_without_interim_replaces_timer() {
        let mut host = connected_host(VOLUME_PEER);
        host.register_volume_change();
        let label = host.connection.volume_label.unwrap();
        let first = host.labels.lookup(label).unwrap().timer.unwrap().handle;

        host.handle_inbound_message(&volume_notification(label.raw(), Code::Changed, 0x22));
        let second = host.labels.lookup(label).unwrap().timer.unwrap().handle;
        assert_ne!(first, second);
        assert_eq!(host.timers.cancelled.as_slice(), &[first]);
        assert_eq!(host.timers.armed.len(), 1);
        assert_eq!(host.timers.armed[0].0, second);
        assert!(matches!(host.timers.armed[0].2, TimerKind::Transaction(_)));
    }

    #[test]
    fn test_notification_on_foreign_label_discarded() {
        let mut host = connected_host(VOLUME_PEER);
        host.register_volume_change();
        let other = host.send_command(&Command::GetPlayStatus).unwrap();

        host.handle_inbound_message(&volume_notification(other.raw(), Code::Interim, 0x10));
        assert_eq!(host.volume(), VOLUME_UNKNOWN);
        assert!(host.sink.events.is_empty());
        assert!(host.labels.lookup(other).is_ok());
    }

    #[test]
    fn test_rejected_registration_frees_label() {
        let mut host = connected_host(VOLUME_PEER);
        host.register_volume_change();
        let label = host.connection.volume_label.unwrap();

        host.handle_inbound_message(&testing::reject(
            label.raw(),
            PduId::RegisterNotification,
            StatusCode::InvalidCommand,
        ));
        assert!(host.connection.volume_label.is_none());
        assert_eq!(host.labels.in_use(), 0);
        assert_eq!(
            host.sink.events.as_slice(),
            &[Event::VolumeChanged {
                volume: VOLUME_UNKNOWN,
                code: Code::Rejected
            }]
        );
    }

    #[test]
    fn test_registration_requires_absolute_volume() {
        let mut host = connected_host(PeerFeatures::TARGET);
        host.register_volume_change();
        assert!(host.transport.sent.is_empty());
    }

    #[test]
    fn test_set_volume_checks() {
        let mut host = testing::host();
        assert_eq!(host.set_volume(10), Err(AvrcpError::NotReady));

        let mut host = connected_host(PeerFeatures::TARGET);
        assert_eq!(host.set_volume(10), Err(AvrcpError::Unsupported));

        let mut host = connected_host(VOLUME_PEER);
        host.connection.volume = 10;
        assert_eq!(host.set_volume(10), Err(AvrcpError::Unchanged));
        assert_eq!(host.set_volume(0x8A), Err(AvrcpError::Unchanged));

        host.set_volume(20).unwrap();
        assert_eq!(
            testing::decode_sent(&host.transport.sent[0]),
            Command::SetAbsoluteVolume(20)
        );
        assert_eq!(host.transport.sent[0].code, Code::Control.raw());
    }

    #[test]
    fn test_set_volume_accepted_and_timeout() {
        let mut host = connected_host(VOLUME_PEER);
        host.set_volume(20).unwrap();
        let label = host.transport.sent[0].label;
        host.handle_inbound_message(&testing::response(
            label,
            Code::Accepted,
            &Response::AbsoluteVolume(20),
        ));
        assert_eq!(host.volume(), 20);

        host.set_volume(30).unwrap();
        let expiry = host
            .timers
            .expire_where(|kind| matches!(kind, TimerKind::Transaction(_)))
            .unwrap();
        host.handle_timer_expired(expiry);
        assert_eq!(
            host.sink.events.as_slice(),
            &[
                Event::VolumeChanged {
                    volume: 20,
                    code: Code::Accepted
                },
                Event::VolumeCommandFailed(CommandFailure::Timeout),
            ]
        );
        assert_eq!(host.volume(), 20);
    }

    #[test]
    fn test_controller_volume_answers() {
        let mut host = connected_host(0);
        host.handle_inbound_message(&testing::command(
            4,
            Code::Control,
            &Command::SetAbsoluteVolume(0x33),
        ));
        host.handle_inbound_message(&testing::command(
            5,
            Code::Notify,
            &Command::RegisterNotification {
                event: EventId::VolumeChanged,
                interval: 0,
            },
        ));
        assert_eq!(
            host.sink.events.as_slice(),
            &[
                Event::SetAbsoluteVolumeRequest {
                    volume: 0x33,
                    label: 4
                },
                Event::VolumeNotificationRequest { label: 5 },
            ]
        );

        host.set_volume_response(0x33, 4).unwrap();
        host.volume_change_notification_response(NotificationKind::Interim, 0x33, 5)
            .unwrap();
        assert!(host.connection.registrations.contains_key(&EventId::VolumeChanged));
        host.volume_change_notification_response(NotificationKind::Changed, 0x34, 5)
            .unwrap();
        assert!(!host.connection.registrations.contains_key(&EventId::VolumeChanged));

        let codes: heapless::Vec<(u8, u8), 4> = host
            .transport
            .sent
            .iter()
            .map(|frame| (frame.label, frame.code))
            .collect();
        assert_eq!(
            codes.as_slice(),
            &[
                (4, Code::Accepted.raw()),
                (5, Code::Interim.raw()),
                (5, Code::Changed.raw()),
            ]
        );
    }
}

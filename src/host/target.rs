//! Target-role responder
//!
//! Commands from the peer are either answered straight away (capabilities, display
//! charset) or recorded and forwarded to the platform, which answers later through the
//! `*_response` methods. At most one answer per PDU is outstanding; a newer command
//! replaces the older one.

use super::AvrcpHost;
use crate::AvrcpError;
use crate::codec::Codec;
use crate::constants::{BLUETOOTH_SIG_COMPANY_ID, MAX_ELEMENT_ATTRIBUTES};
use crate::events::{Event, EventSink};
use crate::packets::{
    CapabilityId, Code, Command, ElementAttribute, EventId, MediaAttributeId, Notification,
    NotificationKind, PduId, PlaybackStatus, Response, StatusCode,
};
use crate::timer::TimerService;
use crate::transport::{Frame, Transport};
use heapless::Vec;

/// A peer command waiting for the platform's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingResponse {
    /// Label the command arrived on
    pub label: u8,
    /// Command type it arrived with
    pub code: Code,
}

impl PendingResponse {
    /// Record a command
    #[must_use]
    pub const fn new(label: u8, code: Code) -> Self {
        Self { label, code }
    }
}

/// Response type for a command received with `command`
pub(crate) fn response_code(command: Code, error: bool) -> Code {
    if error {
        return Code::Rejected;
    }
    match command {
        Code::Notify => Code::Interim,
        Code::Status => Code::Stable,
        code if code.is_response() => code,
        _ => Code::Accepted,
    }
}

impl<C, T, M, S> AvrcpHost<C, T, M, S>
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    /// Handle a vendor-dependent command from the peer
    pub(crate) fn handle_vendor_command(&mut self, label: u8, code: Code, payload: &[u8]) {
        let command = match self.codec.decode_command(payload) {
            Ok(command) => command,
            Err(err) => {
                warn!("[TARGET] Rejecting pdu {}: status {}", err.pdu, err.status.raw());
                self.reject_logged(label, err.pdu, err.status);
                return;
            }
        };
        debug!("[TARGET] Command pdu {} on label {}", command.pdu().raw(), label);

        match command {
            Command::GetCapabilities(capability) => self.answer_capabilities(label, code, capability),
            Command::SetAbsoluteVolume(volume) if self.options.roles.controller => {
                self.emit(Event::SetAbsoluteVolumeRequest { volume, label });
            }
            Command::RegisterNotification {
                event: EventId::VolumeChanged,
                ..
            } if self.options.roles.controller => {
                self.register_peer_event(EventId::VolumeChanged, label);
                self.emit(Event::VolumeNotificationRequest { label });
            }
            Command::GetPlayStatus => {
                self.record_pending(PduId::GetPlayStatus, label, code);
                self.emit(Event::GetPlayStatusRequest);
            }
            Command::GetElementAttributes { attributes, .. } => {
                let attributes = if attributes.is_empty() {
                    Vec::from_iter(MediaAttributeId::ALL)
                } else {
                    attributes
                };
                self.record_pending(PduId::GetElementAttributes, label, code);
                self.emit(Event::GetElementAttributesRequest(attributes));
            }
            Command::RegisterNotification {
                event: EventId::UidsChanged,
                ..
            } => {
                // No browsing, so the UID counter never moves
                let response = Response::Notification(Notification::UidsChanged(0));
                self.respond_logged(label, Code::Interim, &response);
                self.respond_logged(label, Code::Changed, &response);
            }
            Command::RegisterNotification {
                event: EventId::VolumeChanged,
                ..
            } => {
                self.reject_logged(
                    label,
                    PduId::RegisterNotification.raw(),
                    StatusCode::InvalidParameter,
                );
            }
            Command::RegisterNotification {
                event: EventId::PlaybackPosChanged,
                interval: 0,
            } => {
                self.connection
                    .registrations
                    .remove(&EventId::PlaybackPosChanged);
                self.reject_logged(
                    label,
                    PduId::RegisterNotification.raw(),
                    StatusCode::InvalidParameter,
                );
            }
            Command::RegisterNotification { event, interval } => {
                self.register_peer_event(event, label);
                self.emit(Event::RegisterNotificationRequest { event, interval });
            }
            Command::InformDisplayCharset { .. }
            | Command::RequestContinuingResponse { .. }
            | Command::AbortContinuingResponse { .. } => {
                let response = Response::Accepted(command.pdu());
                self.respond_logged(label, response_code(code, false), &response);
            }
            other => {
                self.reject_logged(label, other.pdu().raw(), StatusCode::InvalidCommand);
            }
        }
    }

    fn answer_capabilities(&mut self, label: u8, code: Code, capability: CapabilityId) {
        let response = match capability {
            CapabilityId::CompanyId => {
                Response::CompanyIds(Vec::from_iter([BLUETOOTH_SIG_COMPANY_ID]))
            }
            CapabilityId::EventsSupported => {
                let mut events = Vec::from_iter([
                    EventId::PlaybackStatusChanged,
                    EventId::TrackChanged,
                    EventId::PlaybackPosChanged,
                ]);
                if self.options.roles.controller {
                    events.push(EventId::VolumeChanged).ok();
                }
                Response::EventsSupported(events)
            }
        };
        self.respond_logged(label, response_code(code, false), &response);
    }

    fn register_peer_event(&mut self, event: EventId, label: u8) {
        if self.connection.registrations.insert(event, label).is_err() {
            warn!("[TARGET] Registration table full, event {}", event.raw());
        }
    }

    fn record_pending(&mut self, pdu: PduId, label: u8, code: Code) {
        if self
            .pending
            .insert(pdu, PendingResponse::new(label, code))
            .is_err()
        {
            warn!("[TARGET] Pending table full, pdu {}", pdu.raw());
        }
    }

    fn take_pending(&mut self, pdu: PduId) -> Result<PendingResponse, AvrcpError> {
        self.pending.remove(&pdu).ok_or(AvrcpError::NotPending)
    }

    /// Answer the peer's `GetPlayStatus`
    ///
    /// # Errors
    /// Returns `NotPending` when no request is outstanding, `Transport` when the answer
    /// cannot be sent.
    pub fn get_play_status_response(
        &mut self,
        status: PlaybackStatus,
        length: u32,
        position: u32,
    ) -> Result<(), AvrcpError> {
        let pending = self.take_pending(PduId::GetPlayStatus)?;
        let response = Response::PlayStatus {
            length,
            position,
            status,
        };
        self.send_response(pending.label, response_code(pending.code, false), &response)
    }

    /// Answer the peer's `GetElementAttributes`
    ///
    /// An empty list is sent as a reject with `InvalidParameter`.
    ///
    /// # Errors
    /// Returns `NotPending` when no request is outstanding, `Transport` when the answer
    /// cannot be sent.
    pub fn get_element_attributes_response(
        &mut self,
        attributes: &[ElementAttribute],
    ) -> Result<(), AvrcpError> {
        let pending = self.take_pending(PduId::GetElementAttributes)?;
        if attributes.is_empty() {
            return self.send_reject(
                pending.label,
                PduId::GetElementAttributes.raw(),
                StatusCode::InvalidParameter,
            );
        }
        let attributes: Vec<ElementAttribute, MAX_ELEMENT_ATTRIBUTES> =
            attributes.iter().take(MAX_ELEMENT_ATTRIBUTES).cloned().collect();
        self.send_response(
            pending.label,
            response_code(pending.code, false),
            &Response::ElementAttributes(attributes),
        )
    }

    /// Answer a notification the peer registered for
    ///
    /// # Errors
    /// - `NotReady` when the peer has not registered for the event
    /// - `Unsupported` for events other than play status, track and position
    /// - `Transport` when the answer cannot be sent
    pub fn register_notification_response(
        &mut self,
        kind: NotificationKind,
        notification: Notification,
    ) -> Result<(), AvrcpError> {
        let event = notification.event_id();
        let Some(&label) = self.connection.registrations.get(&event) else {
            return Err(AvrcpError::NotReady);
        };
        if !matches!(
            event,
            EventId::PlaybackStatusChanged | EventId::TrackChanged | EventId::PlaybackPosChanged
        ) {
            return Err(AvrcpError::Unsupported);
        }
        self.send_response(label, kind.into(), &Response::Notification(notification))?;
        if kind == NotificationKind::Changed {
            self.connection.registrations.remove(&event);
        }
        Ok(())
    }

    pub(crate) fn send_response(
        &mut self,
        label: u8,
        code: Code,
        response: &Response,
    ) -> Result<(), AvrcpError> {
        if !self.connection.connected {
            return Err(AvrcpError::NotReady);
        }
        let payload = self.codec.encode_response(response).map_err(AvrcpError::Codec)?;
        self.send_frame(Frame::vendor(self.connection.session, label, code, payload))
    }

    pub(crate) fn send_reject(
        &mut self,
        label: u8,
        pdu: u8,
        status: StatusCode,
    ) -> Result<(), AvrcpError> {
        if !self.connection.connected {
            return Err(AvrcpError::NotReady);
        }
        let payload = self.codec.encode_reject(pdu, status).map_err(AvrcpError::Codec)?;
        self.send_frame(Frame::vendor(
            self.connection.session,
            label,
            Code::Rejected,
            payload,
        ))
    }

    fn send_frame(&mut self, frame: Frame) -> Result<(), AvrcpError> {
        self.transport.send(&frame).map_err(|e| {
            warn!("[TARGET] Send on label {} failed: {}", frame.label, e);
            AvrcpError::Transport
        })
    }

    fn respond_logged(&mut self, label: u8, code: Code, response: &Response) {
        if let Err(e) = self.send_response(label, code, response) {
            warn!("[TARGET] Response failed: {}", e);
        }
    }

    fn reject_logged(&mut self, label: u8, pdu: u8, status: StatusCode) {
        if let Err(e) = self.send_reject(label, pdu, status) {
            warn!("[TARGET] Reject failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AvrcpOptions;
    use crate::Roles;
    use crate::codec::{AvrcpCodec, CommandFailure};
    use crate::testing::{self, connected_host};

    fn decode_reply(frame: &Frame) -> Result<Response, CommandFailure> {
        AvrcpCodec
            .decode_response(Code::try_from(frame.code).unwrap(), &frame.payload)
            .unwrap()
            .body
    }

    #[test]
    fn test_response_code_mapping() {
        assert_eq!(response_code(Code::Status, false), Code::Stable);
        assert_eq!(response_code(Code::Notify, false), Code::Interim);
        assert_eq!(response_code(Code::Control, false), Code::Accepted);
        assert_eq!(response_code(Code::SpecificInquiry, false), Code::Accepted);
        assert_eq!(response_code(Code::Changed, false), Code::Changed);
        assert_eq!(response_code(Code::Status, true), Code::Rejected);
    }

    #[test]
    fn test_capabilities_answered() {
        let mut host = connected_host(0);
        host.handle_inbound_message(&testing::command(
            1,
            Code::Status,
            &Command::GetCapabilities(CapabilityId::EventsSupported),
        ));
        let reply = &host.transport.sent[0];
        assert_eq!(reply.code, Code::Stable.raw());
        assert_eq!(
            decode_reply(reply),
            Ok(Response::EventsSupported(Vec::from_iter([
                EventId::PlaybackStatusChanged,
                EventId::TrackChanged,
                EventId::PlaybackPosChanged,
                EventId::VolumeChanged,
            ])))
        );
    }

    #[test]
    fn test_play_status_round_trip() {
        let mut host = connected_host(0);
        assert_eq!(
            host.get_play_status_response(PlaybackStatus::Paused, 1, 2),
            Err(AvrcpError::NotPending)
        );

        host.handle_inbound_message(&testing::command(7, Code::Status, &Command::GetPlayStatus));
        assert_eq!(host.sink.events.as_slice(), &[Event::GetPlayStatusRequest]);

        host.get_play_status_response(PlaybackStatus::Playing, 200_000, 5_000)
            .unwrap();
        let reply = &host.transport.sent[0];
        assert_eq!(reply.label, 7);
        assert_eq!(reply.code, Code::Stable.raw());
        assert_eq!(
            decode_reply(reply),
            Ok(Response::PlayStatus {
                length: 200_000,
                position: 5_000,
                status: PlaybackStatus::Playing,
            })
        );
        assert_eq!(
            host.get_play_status_response(PlaybackStatus::Playing, 0, 0),
            Err(AvrcpError::NotPending)
        );
    }

    #[test]
    fn test_element_attributes_request_and_empty_answer() {
        let mut host = connected_host(0);
        host.handle_inbound_message(&testing::command(
            2,
            Code::Status,
            &Command::GetElementAttributes {
                identifier: 0,
                attributes: Vec::new(),
            },
        ));
        assert_eq!(
            host.sink.events.as_slice(),
            &[Event::GetElementAttributesRequest(Vec::from_iter(
                MediaAttributeId::ALL
            ))]
        );

        host.get_element_attributes_response(&[]).unwrap();
        let reply = &host.transport.sent[0];
        assert_eq!(reply.code, Code::Rejected.raw());
        assert_eq!(
            decode_reply(reply),
            Err(CommandFailure::Rejected(StatusCode::InvalidParameter))
        );
    }

    #[test]
    fn test_uids_changed_dual_response() {
        let mut host = connected_host(0);
        host.handle_inbound_message(&testing::command(
            3,
            Code::Notify,
            &Command::RegisterNotification {
                event: EventId::UidsChanged,
                interval: 0,
            },
        ));
        let codes: Vec<u8, 2> = host.transport.sent.iter().map(|f| f.code).collect();
        assert_eq!(codes.as_slice(), &[Code::Interim.raw(), Code::Changed.raw()]);
        assert!(host.sink.events.is_empty());
    }

    #[test]
    fn test_position_interval_zero_rejected() {
        let mut host = connected_host(0);
        host.connection
            .registrations
            .insert(EventId::PlaybackPosChanged, 1)
            .unwrap();
        host.handle_inbound_message(&testing::command(
            4,
            Code::Notify,
            &Command::RegisterNotification {
                event: EventId::PlaybackPosChanged,
                interval: 0,
            },
        ));
        assert!(!host.connection.registrations.contains_key(&EventId::PlaybackPosChanged));
        assert_eq!(
            decode_reply(&host.transport.sent[0]),
            Err(CommandFailure::Rejected(StatusCode::InvalidParameter))
        );
    }

    #[test]
    fn test_notification_answers() {
        let mut host = connected_host(0);
        assert_eq!(
            host.register_notification_response(
                NotificationKind::Interim,
                Notification::TrackChanged(0)
            ),
            Err(AvrcpError::NotReady)
        );

        host.handle_inbound_message(&testing::command(
            6,
            Code::Notify,
            &Command::RegisterNotification {
                event: EventId::TrackChanged,
                interval: 0,
            },
        ));
        assert_eq!(
            host.sink.events.as_slice(),
            &[Event::RegisterNotificationRequest {
                event: EventId::TrackChanged,
                interval: 0
            }]
        );

        host.register_notification_response(NotificationKind::Interim, Notification::TrackChanged(0))
            .unwrap();
        host.register_notification_response(NotificationKind::Changed, Notification::TrackChanged(1))
            .unwrap();
        assert_eq!(
            host.register_notification_response(
                NotificationKind::Changed,
                Notification::TrackChanged(2)
            ),
            Err(AvrcpError::NotReady)
        );
        assert_eq!(host.transport.sent.len(), 2);
        assert_eq!(host.transport.sent[1].code, Code::Changed.raw());
    }

    #[test]
    fn test_unsupported_notification_answer() {
        let mut host = connected_host(0);
        host.handle_inbound_message(&testing::command(
            6,
            Code::Notify,
            &Command::RegisterNotification {
                event: EventId::BatteryStatusChanged,
                interval: 0,
            },
        ));
        assert_eq!(
            host.register_notification_response(
                NotificationKind::Interim,
                Notification::BatteryStatusChanged(0)
            ),
            Err(AvrcpError::Unsupported)
        );
    }

    #[test]
    fn test_settings_commands_rejected() {
        let mut host = connected_host(0);
        host.handle_inbound_message(&testing::command(
            8,
            Code::Status,
            &Command::ListPlayerAppAttributes,
        ));
        assert_eq!(
            decode_reply(&host.transport.sent[0]),
            Err(CommandFailure::Rejected(StatusCode::InvalidCommand))
        );
    }

    #[test]
    fn test_volume_commands_need_controller_role() {
        let options = AvrcpOptions {
            roles: Roles {
                target: true,
                controller: false,
            },
            ..AvrcpOptions::default()
        };
        let mut host = testing::connected_host_with(0, options);
        host.handle_inbound_message(&testing::command(
            9,
            Code::Control,
            &Command::SetAbsoluteVolume(0x20),
        ));
        assert!(host.sink.events.is_empty());
        assert_eq!(host.transport.sent[0].code, Code::Rejected.raw());
    }
}

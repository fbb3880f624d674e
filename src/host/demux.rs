//! Response/event demultiplexer
//!
//! Classifies inbound frames by opcode and code band and routes them to the handler
//! that owns the transaction. Responses on a free label are stale and dropped.

use super::{AvrcpHost, LabelAction};
use crate::codec::{Codec, CommandFailure};
use crate::events::{Event, EventSink};
use crate::label::Label;
use crate::packets::{Code, Notification, Opcode, PduId, Response, UnknownValue};
use crate::timer::TimerService;
use crate::transport::{Frame, Transport};

impl<C, T, M, S> AvrcpHost<C, T, M, S>
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    /// Handle a frame received on the control channel
    pub fn handle_inbound_message(&mut self, frame: &Frame) {
        if !self.connection.connected || frame.session != self.connection.session {
            warn!("[DEMUX] Frame for unknown session {}", frame.session);
            return;
        }
        let Ok(code) = Code::try_from(frame.code) else {
            warn!("[DEMUX] Invalid code {}", frame.code);
            return;
        };

        match Opcode::try_from(frame.opcode) {
            Ok(Opcode::PassThrough) if code.is_command() => {
                match self.codec.decode_passthrough(&frame.payload) {
                    Ok(passthrough) => self.handle_passthrough_command(frame.label, passthrough),
                    Err(_) => warn!("[DEMUX] Malformed pass-through command"),
                }
            }
            Ok(Opcode::PassThrough) => self.handle_passthrough_response(frame.label, code),
            Ok(Opcode::VendorDependent) if code.is_response() => {
                self.handle_vendor_response(frame.label, code, &frame.payload);
            }
            Ok(Opcode::VendorDependent) => {
                self.handle_vendor_command(frame.label, code, &frame.payload);
            }
            Ok(other) => debug!("[DEMUX] Ignoring opcode {}", other.raw()),
            Err(UnknownValue(raw)) => debug!("[DEMUX] Ignoring unknown opcode {}", raw),
        }
    }

    fn handle_vendor_response(&mut self, label: u8, code: Code, payload: &[u8]) {
        let Some(label) = Label::from_wire(label) else {
            return;
        };
        let Ok(transaction) = self.labels.lookup(label) else {
            debug!("[DEMUX] Discarding response on free label {}", label.raw());
            return;
        };

        let decoded = match self.codec.decode_response(code, payload) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(
                    "[DEMUX] Malformed response for pdu {} on label {}",
                    err.pdu,
                    label.raw()
                );
                let pdu = transaction
                    .timer
                    .and_then(|timer| timer.context.pdu())
                    .or_else(|| PduId::try_from(err.pdu).ok());
                if let Some(pdu) = pdu {
                    self.handle_command_failure(label, pdu, CommandFailure::Malformed(err.status));
                }
                self.release_label(label);
                return;
            }
        };

        let action = match decoded.body {
            Ok(response) => self.route_response(label, code, response),
            Err(failure) => {
                self.handle_command_failure(label, decoded.pdu, failure);
                LabelAction::Release
            }
        };
        self.finish_transaction(label, action);
    }

    fn route_response(&mut self, label: Label, code: Code, response: Response) -> LabelAction {
        match response {
            Response::CompanyIds(_) | Response::EventsSupported(_) => {
                self.on_capabilities(response);
            }
            Response::PlayerAppAttributes(_)
            | Response::PlayerAppValues(_)
            | Response::CurrentPlayerAppValues(_)
            | Response::PlayerAppAttributeText(_)
            | Response::PlayerAppValueText(_) => self.on_settings_response(response),
            Response::ElementAttributes(attributes) => self.on_element_attributes(attributes),
            Response::PlayStatus {
                length,
                position,
                status,
            } => self.on_play_status(length, position, status),
            Response::Notification(Notification::VolumeChanged(volume)) => {
                return self.on_volume_notification(label, code, volume);
            }
            Response::Notification(notification) => {
                return self.on_notification(label, code, notification);
            }
            Response::AbsoluteVolume(volume) => self.on_set_volume_response(volume, code),
            Response::Accepted(PduId::SetPlayerAppValue) => {
                self.emit(Event::SetPlayerAppSettingResponse { accepted: true });
            }
            Response::Accepted(pdu) => debug!("[DEMUX] Pdu {} accepted", pdu.raw()),
        }
        LabelAction::Release
    }

    /// Route a terminal failure to the handler of the PDU that owns `label`
    pub(crate) fn handle_command_failure(
        &mut self,
        label: Label,
        pdu: PduId,
        failure: CommandFailure,
    ) {
        debug!("[DEMUX] Pdu {} failed: {}", pdu.raw(), failure);
        match pdu {
            PduId::GetCapabilities => self.on_capabilities_failure(failure),
            PduId::RegisterNotification if self.connection.volume_label == Some(label) => {
                self.on_volume_registration_failure(failure);
            }
            PduId::RegisterNotification => self.on_notification_failure(label, failure),
            PduId::ListPlayerAppAttributes
            | PduId::ListPlayerAppValues
            | PduId::GetCurrentPlayerAppValue
            | PduId::GetPlayerAppAttributeText
            | PduId::GetPlayerAppValueText => self.on_settings_failure(pdu, failure),
            PduId::SetPlayerAppValue => {
                self.emit(Event::SetPlayerAppSettingResponse { accepted: false });
            }
            PduId::GetElementAttributes => self.on_element_attributes_failure(failure),
            PduId::SetAbsoluteVolume => self.on_set_volume_failure(failure),
            _ => warn!("[DEMUX] Pdu {} failed without handler", pdu.raw()),
        }
    }
}

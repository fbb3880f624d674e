//! Command encoder/dispatcher
//!
//! Every outgoing command takes a label, is encoded, sent and guarded by a response
//! timer. A failed call leaves nothing behind: the label is released and no timer is
//! armed.

use super::AvrcpHost;
use crate::AvrcpError;
use crate::codec::{Codec, CodecError, Payload};
use crate::events::EventSink;
use crate::label::Label;
use crate::packets::{Code, Command, Opcode, PassThrough};
use crate::timer::{ControlCommand, TimerContext, TimerKind, TimerService};
use crate::transport::{Frame, Transport};

/// What happens to a label once its response has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LabelAction {
    /// Transaction finished, free the label
    Release,
    /// Interim response, keep the label without a timer
    KeepDisarmed,
    /// Handler reused the label
    Keep,
}

impl<C, T, M, S> AvrcpHost<C, T, M, S>
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    /// Send a vendor-dependent command on a fresh label
    pub(crate) fn send_command(&mut self, command: &Command) -> Result<Label, AvrcpError> {
        let pdu = command.pdu();
        let control = command.is_control();
        self.dispatch(
            command.code(),
            Opcode::VendorDependent,
            |codec| codec.encode_command(command),
            |label| {
                if control {
                    TimerContext::Control {
                        command: ControlCommand::Vendor(pdu),
                        label,
                    }
                } else {
                    TimerContext::Status { pdu, label }
                }
            },
        )
    }

    /// Send a pass-through or group navigation command on a fresh label
    pub(crate) fn send_passthrough_command(
        &mut self,
        passthrough: PassThrough,
    ) -> Result<Label, AvrcpError> {
        let command = match passthrough {
            PassThrough::Key { op, .. } => ControlCommand::PassThrough(op),
            PassThrough::Group { op, .. } => ControlCommand::GroupNavigation(op),
            PassThrough::Unknown { .. } => return Err(AvrcpError::InvalidParameter),
        };
        self.dispatch(
            Code::Control,
            Opcode::PassThrough,
            |codec| codec.encode_passthrough(passthrough),
            |label| TimerContext::Control { command, label },
        )
    }

    /// Re-send a status command on a label that is already owned
    pub(crate) fn resend_on_label(
        &mut self,
        label: Label,
        command: &Command,
    ) -> Result<(), AvrcpError> {
        let payload = self.codec.encode_command(command).map_err(AvrcpError::Codec)?;
        let frame = Frame::vendor(self.connection.session, label.raw(), command.code(), payload);
        self.transport.send(&frame).map_err(|e| {
            warn!("[DISPATCH] Resend on label {} failed: {}", label.raw(), e);
            AvrcpError::Transport
        })?;
        if let Some(previous) = self.labels.disarm(label) {
            self.timers.cancel(previous.handle);
        }
        let context = TimerContext::Status {
            pdu: command.pdu(),
            label,
        };
        self.arm_transaction_timer(label, context);
        Ok(())
    }

    fn dispatch(
        &mut self,
        code: Code,
        opcode: Opcode,
        encode: impl FnOnce(&C) -> Result<Payload, CodecError>,
        context: impl FnOnce(Label) -> TimerContext,
    ) -> Result<Label, AvrcpError> {
        if !self.connection.connected {
            return Err(AvrcpError::NotReady);
        }
        let session = self.connection.session;
        let label = self.labels.allocate(session).map_err(|_| {
            warn!("[DISPATCH] No free transaction label");
            AvrcpError::Fail
        })?;

        let payload = match encode(&self.codec) {
            Ok(payload) => payload,
            Err(e) => {
                error!("[DISPATCH] Encode failed: {}", e);
                self.release_label(label);
                return Err(AvrcpError::Fail);
            }
        };

        let frame = Frame::new(session, label.raw(), code.raw(), opcode.raw(), payload);
        if let Err(e) = self.transport.send(&frame) {
            warn!("[DISPATCH] Send on label {} failed: {}", label.raw(), e);
            self.release_label(label);
            return Err(AvrcpError::Fail);
        }

        self.arm_transaction_timer(label, context(label));
        debug!(
            "[DISPATCH] Sent code {} opcode {} on label {}",
            code.raw(),
            opcode.raw(),
            label.raw()
        );
        Ok(label)
    }

    fn arm_transaction_timer(&mut self, label: Label, context: TimerContext) {
        let timeout = match context {
            TimerContext::Status { .. } => self.options.status_timeout,
            TimerContext::Control { .. } => self.options.control_timeout,
        };
        let handle = self.timers.arm(timeout, TimerKind::Transaction(context));
        if self.labels.arm(label, handle, context).is_err() {
            self.timers.cancel(handle);
        }
    }

    /// Free a label and cancel its timer
    pub(crate) fn release_label(&mut self, label: Label) {
        if let Some(armed) = self.labels.release(label) {
            self.timers.cancel(armed.handle);
        }
    }

    /// Apply the outcome of a response handler
    pub(crate) fn finish_transaction(&mut self, label: Label, action: LabelAction) {
        match action {
            LabelAction::Release => self.release_label(label),
            LabelAction::KeepDisarmed => {
                if let Some(armed) = self.labels.disarm(label) {
                    self.timers.cancel(armed.handle);
                }
            }
            LabelAction::Keep => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::AvrcpError;
    use crate::constants::{DEFAULT_CONTROL_TIMEOUT, DEFAULT_STATUS_TIMEOUT, MAX_LABELS};
    use crate::packets::{CapabilityId, Code, Command, KeyState, Opcode, PassThrough, PassThroughOp};
    use crate::testing::{self, connected_host};
    use crate::timer::{TimerContext, TimerKind};

    #[test]
    fn test_send_requires_connection() {
        let mut host = testing::host();
        assert_eq!(
            host.send_command(&Command::GetPlayStatus),
            Err(AvrcpError::NotReady)
        );
        assert!(host.transport.sent.is_empty());
    }

    #[test]
    fn test_one_send_one_timer() {
        let mut host = connected_host(0);
        let label = host
            .send_command(&Command::GetCapabilities(CapabilityId::CompanyId))
            .unwrap();

        assert_eq!(host.transport.sent.len(), 1);
        let frame = &host.transport.sent[0];
        assert_eq!(frame.label, label.raw());
        assert_eq!(frame.code, Code::Status.raw());
        assert_eq!(frame.opcode, Opcode::VendorDependent.raw());

        assert_eq!(host.timers.armed.len(), 1);
        let (_, duration, kind) = host.timers.armed[0];
        assert_eq!(duration, DEFAULT_STATUS_TIMEOUT);
        assert!(matches!(
            kind,
            TimerKind::Transaction(TimerContext::Status { .. })
        ));
        assert!(host.labels.lookup(label).unwrap().timer.is_some());
    }

    #[test]
    fn test_control_commands_use_control_timer() {
        let mut host = connected_host(0);
        host.send_passthrough_command(PassThrough::Key {
            op: PassThroughOp::Play,
            state: KeyState::Pressed,
        })
        .unwrap();

        let (_, duration, kind) = host.timers.armed[0];
        assert_eq!(duration, DEFAULT_CONTROL_TIMEOUT);
        assert!(matches!(
            kind,
            TimerKind::Transaction(TimerContext::Control { .. })
        ));
        assert_eq!(host.transport.sent[0].opcode, Opcode::PassThrough.raw());
    }

    #[test]
    fn test_transport_failure_leaves_nothing() {
        let mut host = connected_host(0);
        host.transport.fail_sends = true;
        assert_eq!(
            host.send_command(&Command::GetPlayStatus),
            Err(AvrcpError::Fail)
        );
        assert_eq!(host.labels.in_use(), 0);
        assert!(host.timers.armed.is_empty());
    }

    #[test]
    fn test_label_exhaustion() {
        let mut host = connected_host(0);
        for _ in 0..MAX_LABELS {
            host.send_command(&Command::GetPlayStatus).unwrap();
        }
        assert_eq!(
            host.send_command(&Command::GetPlayStatus),
            Err(AvrcpError::Fail)
        );
        assert_eq!(host.transport.sent.len(), MAX_LABELS);
    }
}

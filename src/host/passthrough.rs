//! Pass-through keys and player setting changes
//!
//! Incoming keys are acknowledged on the wire before they are filtered. PLAY and PAUSE
//! are reported as a press immediately followed by a release, and their real release
//! is swallowed.

use super::AvrcpHost;
use crate::AvrcpError;
use crate::codec::Codec;
use crate::constants::MAX_APP_ATTRIBUTES;
use crate::events::{Event, EventSink};
use crate::label::Label;
use crate::packets::{
    Code, Command, GroupNavigation, KeyState, PassThrough, PassThroughOp, PlayerSetting,
};
use crate::timer::{ControlCommand, TimerContext, TimerService};
use crate::transport::{Frame, Transport};
use heapless::Vec;

impl<C, T, M, S> AvrcpHost<C, T, M, S>
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    /// Handle a pass-through command from the peer
    pub fn handle_passthrough_command(&mut self, label: u8, passthrough: PassThrough) {
        let code = match passthrough {
            PassThrough::Unknown { .. } => Code::NotImplemented,
            PassThrough::Key { .. } | PassThrough::Group { .. } => Code::Accepted,
        };
        match self.codec.encode_passthrough(passthrough) {
            Ok(payload) => {
                let frame = Frame::passthrough(self.connection.session, label, code, payload);
                if let Err(e) = self.transport.send(&frame) {
                    warn!("[PASSTHROUGH] Ack on label {} failed: {}", label, e);
                }
            }
            Err(e) => warn!("[PASSTHROUGH] Ack encode failed: {}", e),
        }

        match passthrough {
            PassThrough::Key { op, state } => self.filter_key(op, state),
            PassThrough::Group { op, .. } => {
                debug!("[PASSTHROUGH] Ignoring group navigation {}", op.raw());
            }
            PassThrough::Unknown { op, .. } => debug!("[PASSTHROUGH] Unknown key {}", op),
        }
    }

    fn filter_key(&mut self, op: PassThroughOp, state: KeyState) {
        match op {
            PassThroughOp::Play if !self.audio.open => {
                if state == KeyState::Pressed {
                    info!("[PASSTHROUGH] PLAY before audio is up, queued");
                    self.connection.pending_play = true;
                }
            }
            PassThroughOp::Pause if self.connection.pending_play => {
                info!("[PASSTHROUGH] PAUSE cancels queued PLAY");
                self.connection.pending_play = false;
            }
            PassThroughOp::VolumeUp | PassThroughOp::VolumeDown => {}
            PassThroughOp::Stop if !self.audio.streaming => {
                debug!("[PASSTHROUGH] STOP while not streaming");
            }
            PassThroughOp::Play | PassThroughOp::Pause => {
                if state == KeyState::Pressed {
                    self.emit_click(op);
                }
            }
            PassThroughOp::Stop
            | PassThroughOp::Forward
            | PassThroughOp::Backward
            | PassThroughOp::FastForward
            | PassThroughOp::Rewind => self.emit(Event::PassThroughCommand { op, state }),
            other => debug!("[PASSTHROUGH] Dropping key {}", other.raw()),
        }
    }

    fn emit_click(&mut self, op: PassThroughOp) {
        self.emit(Event::PassThroughCommand {
            op,
            state: KeyState::Pressed,
        });
        self.emit(Event::PassThroughCommand {
            op,
            state: KeyState::Released,
        });
    }

    /// Replay a PLAY that arrived before the audio path was up
    pub fn check_pending_play(&mut self, send_to_app: bool) {
        if !self.connection.pending_play {
            return;
        }
        self.connection.pending_play = false;
        if send_to_app {
            self.emit_click(PassThroughOp::Play);
        }
    }

    /// Send a key to the peer
    ///
    /// # Errors
    /// `NotReady` when disconnected, `Unsupported` when the peer is not a target, `Fail`
    /// when the command could not be sent.
    pub fn send_passthrough(&mut self, op: PassThroughOp, state: KeyState) -> Result<(), AvrcpError> {
        self.require_target()?;
        self.send_passthrough_command(PassThrough::Key { op, state })
            .map(|_| ())
    }

    /// Send a group navigation key to the peer
    ///
    /// # Errors
    /// Same as [`AvrcpHost::send_passthrough`].
    pub fn send_group_navigation(
        &mut self,
        op: GroupNavigation,
        state: KeyState,
    ) -> Result<(), AvrcpError> {
        self.require_target()?;
        self.send_passthrough_command(PassThrough::Group { op, state })
            .map(|_| ())
    }

    fn require_target(&self) -> Result<(), AvrcpError> {
        if !self.connection.connected {
            return Err(AvrcpError::NotReady);
        }
        if !self.effective_features().is_target() {
            return Err(AvrcpError::Unsupported);
        }
        Ok(())
    }

    pub(crate) fn handle_passthrough_response(&mut self, label: u8, code: Code) {
        let Some(label) = Label::from_wire(label) else {
            return;
        };
        let Ok(transaction) = self.labels.lookup(label) else {
            debug!("[PASSTHROUGH] Discarding response on free label {}", label.raw());
            return;
        };
        match transaction.timer.map(|timer| timer.context) {
            Some(TimerContext::Control {
                command: ControlCommand::PassThrough(op),
                ..
            }) => self.emit(Event::PassThroughResponse {
                op,
                result: Ok(code),
            }),
            Some(TimerContext::Control {
                command: ControlCommand::GroupNavigation(op),
                ..
            }) => self.emit(Event::GroupNavigationResponse {
                op,
                result: Ok(code),
            }),
            _ => {
                debug!("[PASSTHROUGH] Response on non pass-through label {}", label.raw());
                return;
            }
        }
        self.release_label(label);
    }

    /// Change player application settings on the peer
    ///
    /// # Errors
    /// `NotReady` when disconnected, `Unsupported` when the peer has no player settings,
    /// `InvalidParameter` for an empty list, `Fail` when the command could not be sent.
    pub fn change_player_setting(&mut self, settings: &[PlayerSetting]) -> Result<(), AvrcpError> {
        if !self.connection.connected {
            return Err(AvrcpError::NotReady);
        }
        if !self.connection.features.supports_app_settings() {
            return Err(AvrcpError::Unsupported);
        }
        if settings.is_empty() {
            return Err(AvrcpError::InvalidParameter);
        }
        let settings: Vec<PlayerSetting, MAX_APP_ATTRIBUTES> =
            settings.iter().take(MAX_APP_ATTRIBUTES).copied().collect();
        self.send_command(&Command::SetPlayerAppValue { settings })
            .map(|_| ())
    }
}

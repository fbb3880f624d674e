//! Timer expiry handling and play status polling

use super::AvrcpHost;
use crate::codec::{Codec, CommandFailure};
use crate::events::{Event, EventSink};
use crate::packets::{Command, PlaybackStatus};
use crate::timer::{ControlCommand, TimerContext, TimerExpiry, TimerKind, TimerService};
use crate::transport::Transport;

impl<C, T, M, S> AvrcpHost<C, T, M, S>
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    /// Handle a fired timer
    ///
    /// Expiries whose handle is no longer armed are stale and ignored, so a transaction
    /// ends with exactly one outcome even when its response and its timer race.
    pub fn handle_timer_expired(&mut self, expiry: TimerExpiry) {
        match expiry.kind {
            TimerKind::PlayStatusPoll => {
                if self.connection.poll_timer != Some(expiry.handle) {
                    debug!("[TIMER] Stale poll timer {}", expiry.handle.0);
                    return;
                }
                self.connection.poll_timer = None;
                if let Err(e) = self.send_command(&Command::GetPlayStatus) {
                    warn!("[TIMER] Play status poll failed: {}", e);
                }
                self.start_play_status_poll();
            }
            TimerKind::Transaction(context) => self.transaction_timeout(expiry, context),
        }
    }

    fn transaction_timeout(&mut self, expiry: TimerExpiry, context: TimerContext) {
        let label = context.label();
        let armed = self
            .labels
            .lookup(label)
            .ok()
            .and_then(|transaction| transaction.timer);
        if armed.map(|timer| timer.handle) != Some(expiry.handle) {
            debug!("[TIMER] Stale timer {} for label {}", expiry.handle.0, label.raw());
            return;
        }

        warn!("[TIMER] Label {} timed out", label.raw());
        self.release_label(label);
        match context {
            TimerContext::Status { pdu, .. }
            | TimerContext::Control {
                command: ControlCommand::Vendor(pdu),
                ..
            } => self.handle_command_failure(label, pdu, CommandFailure::Timeout),
            TimerContext::Control {
                command: ControlCommand::PassThrough(op),
                ..
            } => self.emit(Event::PassThroughResponse {
                op,
                result: Err(CommandFailure::Timeout),
            }),
            TimerContext::Control {
                command: ControlCommand::GroupNavigation(op),
                ..
            } => self.emit(Event::GroupNavigationResponse {
                op,
                result: Err(CommandFailure::Timeout),
            }),
        }
    }

    /// Arm the poll timer unless it is already pending
    pub(crate) fn start_play_status_poll(&mut self) {
        if let Some(handle) = self.connection.poll_timer {
            if self.timers.is_scheduled(handle) {
                return;
            }
        }
        let handle = self
            .timers
            .arm(self.options.play_status_poll_interval, TimerKind::PlayStatusPoll);
        self.connection.poll_timer = Some(handle);
    }

    pub(crate) fn stop_play_status_poll(&mut self) {
        if let Some(handle) = self.connection.poll_timer.take() {
            self.timers.cancel(handle);
        }
    }

    pub(crate) fn on_play_status(&mut self, length: u32, position: u32, status: PlaybackStatus) {
        trace!("[TIMER] Play status {}: {}/{}", status, position, length);
        self.emit(Event::PlayPositionChanged { length, position });
    }
}

#[cfg(test)]
mod tests {
    use crate::codec::CommandFailure;
    use crate::constants::{DEFAULT_PLAY_STATUS_POLL_INTERVAL, MAX_LABELS};
    use crate::events::Event;
    use crate::packets::{
        Code, Command, KeyState, PassThroughOp, PduId, PlaybackStatus, Response,
    };
    use crate::testing::{self, connected_host};
    use crate::timer::{TimerContext, TimerExpiry, TimerKind, TimerService};

    fn play_status() -> Response {
        Response::PlayStatus {
            length: 300_000,
            position: 1_000,
            status: PlaybackStatus::Playing,
        }
    }

    #[test]
    fn test_timeout_single_outcome_and_late_response_discarded() {
        let mut host = connected_host(0);
        let label = host
            .send_command(&Command::SetPlayerAppValue {
                settings: heapless::Vec::new(),
            })
            .unwrap();

        let expiry = host
            .timers
            .expire_where(|kind| matches!(kind, TimerKind::Transaction(_)))
            .unwrap();
        host.handle_timer_expired(expiry);
        assert_eq!(
            host.sink.events.as_slice(),
            &[Event::SetPlayerAppSettingResponse { accepted: false }]
        );
        assert_eq!(host.labels.in_use(), 0);

        // The same expiry delivered twice does nothing
        host.handle_timer_expired(expiry);
        // Neither does the response arriving late
        host.handle_inbound_message(&testing::response(
            label.raw(),
            Code::Accepted,
            &Response::Accepted(PduId::SetPlayerAppValue),
        ));
        assert_eq!(host.sink.events.len(), 1);
    }

    #[test]
    fn test_expiry_for_reused_label_is_stale() {
        let mut host = connected_host(0);
        let label = host.send_command(&Command::GetPlayStatus).unwrap();
        let (old_handle, _, old_kind) = host.timers.armed[0];
        host.handle_inbound_message(&testing::response(label.raw(), Code::Stable, &play_status()));

        // Label is taken again by a new command with a new timer
        let reused = host.send_command(&Command::GetPlayStatus).unwrap();
        assert_eq!(reused, label);

        host.handle_timer_expired(TimerExpiry {
            handle: old_handle,
            kind: old_kind,
        });
        assert_eq!(host.labels.in_use(), 1);
        assert_eq!(host.sink.events.len(), 1);
    }

    #[test]
    fn test_passthrough_timeout_reported() {
        let mut host = connected_host(crate::features::PeerFeatures::TARGET);
        host.send_passthrough(PassThroughOp::Play, KeyState::Pressed)
            .unwrap();
        let expiry = host
            .timers
            .expire_where(|kind| {
                matches!(kind, TimerKind::Transaction(TimerContext::Control { .. }))
            })
            .unwrap();
        host.handle_timer_expired(expiry);
        assert_eq!(
            host.sink.events.as_slice(),
            &[Event::PassThroughResponse {
                op: PassThroughOp::Play,
                result: Err(CommandFailure::Timeout),
            }]
        );
        assert_eq!(host.labels.in_use(), 0);
    }

    #[test]
    fn test_poll_sends_and_rearms() {
        let mut host = connected_host(0);
        host.start_play_status_poll();
        host.start_play_status_poll();
        assert_eq!(host.timers.armed.len(), 1);
        assert_eq!(host.timers.armed[0].1, DEFAULT_PLAY_STATUS_POLL_INTERVAL);

        let expiry = host
            .timers
            .expire_where(|kind| *kind == TimerKind::PlayStatusPoll)
            .unwrap();
        host.handle_timer_expired(expiry);
        assert_eq!(
            testing::decode_sent(&host.transport.sent[0]),
            Command::GetPlayStatus
        );
        assert!(host.connection.poll_timer.is_some());
        assert_ne!(host.connection.poll_timer, Some(expiry.handle));

        let label = host.transport.sent[0].label;
        host.handle_inbound_message(&testing::response(label, Code::Stable, &play_status()));
        assert_eq!(
            host.sink.events.as_slice(),
            &[Event::PlayPositionChanged {
                length: 300_000,
                position: 1_000
            }]
        );
    }

    #[test]
    fn test_poll_rearms_when_send_fails() {
        let mut host = connected_host(0);
        host.start_play_status_poll();
        for _ in 0..MAX_LABELS {
            host.labels.allocate(testing::SESSION).unwrap();
        }

        let expiry = host
            .timers
            .expire_where(|kind| *kind == TimerKind::PlayStatusPoll)
            .unwrap();
        host.handle_timer_expired(expiry);
        assert!(host.transport.sent.is_empty());
        let handle = host.connection.poll_timer.unwrap();
        assert_ne!(handle, expiry.handle);
        assert!(host.timers.is_scheduled(handle));
    }

    #[test]
    fn test_stopped_poll_ignores_expiry() {
        let mut host = connected_host(0);
        host.start_play_status_poll();
        let handle = host.connection.poll_timer.unwrap();
        host.stop_play_status_poll();
        assert_eq!(host.timers.cancelled.as_slice(), &[handle]);

        host.handle_timer_expired(TimerExpiry {
            handle,
            kind: TimerKind::PlayStatusPoll,
        });
        assert!(host.transport.sent.is_empty());
    }
}

//! Connection lifecycle and feature processing

use super::{AvrcpHost, BootstrapStage};
use crate::codec::Codec;
use crate::connection::{AudioPath, PeerInfo};
use crate::constants::NO_TRACK_SELECTED;
use crate::events::{Event, EventSink};
use crate::features::PeerFeatures;
use crate::timer::TimerService;
use crate::transport::Transport;
use crate::{AvrcpError, BluetoothAddress};

impl<C, T, M, S> AvrcpHost<C, T, M, S>
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    /// Control channel to `peer` is up
    ///
    /// A connect while already connected is checked against the reconnect policy: a
    /// matching peer is treated as a feature update, anything else is closed.
    ///
    /// # Errors
    /// Returns `AlreadyConnected` when the new link was refused.
    pub fn handle_connect(&mut self, peer: PeerInfo) -> Result<(), AvrcpError> {
        if self.connection.connected {
            if !self
                .connection
                .matches(peer.session, peer.address, self.options.reconnect_policy)
            {
                warn!(
                    "[CONNECTION] Refusing {} while connected to {}",
                    peer.address,
                    self.connection.address
                );
                self.transport.close(peer.session);
                return Err(AvrcpError::AlreadyConnected);
            }
            debug!(
                "[CONNECTION] Repeat connect from {} on session {}",
                peer.address,
                peer.session
            );
            if peer.session != self.connection.session {
                // The volume registration lived on the old link
                if let Some(label) = self.connection.volume_label {
                    self.release_label(label);
                }
                self.connection.reset_volume();
                self.connection.retired_session = Some(self.connection.session);
            }
            self.connection.session = peer.session;
            self.connection.address = peer.address;
            return self.handle_features(peer.address, peer.features);
        }

        info!(
            "[CONNECTION] Connected to {} on session {}, features {}",
            peer.address,
            peer.session,
            peer.features.raw()
        );
        self.connection.connected = true;
        self.connection.session = peer.session;
        self.connection.address = peer.address;
        self.connection.features = peer.features;
        self.connection.reset_volume();
        self.connection.playing_uid = NO_TRACK_SELECTED;

        if self.options.roles.target {
            self.process_target_features();
        }
        if self.options.roles.controller {
            self.emit(Event::ConnectionStateChanged {
                connected: true,
                address: peer.address,
            });
        }
        self.process_controller_features();
        Ok(())
    }

    /// Late feature report for the connected peer
    ///
    /// # Errors
    /// Returns `NotFound` when `address` is not the connected peer.
    pub fn handle_features(
        &mut self,
        address: BluetoothAddress,
        features: PeerFeatures,
    ) -> Result<(), AvrcpError> {
        if !self.connection.connected || self.connection.address != address {
            return Err(AvrcpError::NotFound);
        }
        debug!("[CONNECTION] Features of {} now {}", address, features.raw());
        self.connection.features = features;
        if self.options.roles.target {
            self.process_target_features();
        }
        self.process_controller_features();
        Ok(())
    }

    /// Control channel is gone; all per-connection state is dropped
    pub fn handle_disconnect(&mut self, session: u16, address: BluetoothAddress) {
        if !self.connection.connected
            || !self
                .connection
                .matches(session, address, self.options.reconnect_policy)
        {
            debug!("[CONNECTION] Disconnect of unknown device {}", address);
            return;
        }
        info!("[CONNECTION] Disconnected from {}", self.connection.address);

        self.stop_play_status_poll();
        self.settings.reset();
        self.events.clear();
        self.stage = BootstrapStage::Idle;
        self.pending.clear();
        for armed in self.labels.release_all() {
            self.timers.cancel(armed.handle);
        }
        let address = self.connection.address;
        self.connection.reset();
        self.emit(Event::ConnectionStateChanged {
            connected: false,
            address,
        });
    }

    /// Features after the local absolute volume overrides
    pub(crate) fn effective_features(&self) -> PeerFeatures {
        let features = self.connection.features;
        let address = self.connection.address;
        let denied = self.options.absolute_volume_deny_list.contains(&address);
        let foreign_audio = self.audio.address != Some(address);
        if denied || self.options.disable_absolute_volume || foreign_audio {
            features.without(PeerFeatures::ADVANCED_CONTROL)
        } else {
            features
        }
    }

    fn process_target_features(&mut self) {
        let features = self.effective_features();
        if features != self.connection.features {
            debug!("[CONNECTION] Absolute volume disabled for {}", self.connection.address);
        }
        self.emit(Event::RemoteFeatures {
            address: self.connection.address,
            features: features.into(),
        });
        self.register_volume_change();
    }

    fn process_controller_features(&mut self) {
        let features = self.connection.features;
        let relevant = features.is_target()
            || (features.is_controller() && features.contains(PeerFeatures::ADVANCED_CONTROL));
        if !relevant || !self.options.roles.controller {
            return;
        }
        self.emit(Event::ControllerFeatures {
            address: self.connection.address,
            features,
        });
        if features.supports_metadata()
            && !self.connection.features_processed
            && self.options.sink_enabled
        {
            self.start_bootstrap();
        }
    }

    /// Audio path state reported by the platform
    pub fn update_audio_path(&mut self, path: AudioPath) {
        let previous = self.audio;
        self.audio = path;
        if path.open && !previous.open {
            self.check_pending_play(true);
        }
        if self.connection.connected
            && self.options.roles.target
            && path.address != previous.address
        {
            self.process_target_features();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::connection::{AudioPath, PeerInfo};
    use crate::events::Event;
    use crate::features::{PeerFeatures, RemoteFeatures};
    use crate::host::BootstrapStage;
    use crate::packets::{CapabilityId, Code, Command, PlaybackStatus, Response};
    use crate::testing::{self, PEER, SESSION};
    use crate::{AvrcpError, AvrcpOptions, BluetoothAddress, ReconnectPolicy};

    const OTHER: BluetoothAddress = BluetoothAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    const FULL_TARGET: u16 = PeerFeatures::TARGET
        | PeerFeatures::METADATA
        | PeerFeatures::VENDOR
        | PeerFeatures::ADVANCED_CONTROL;

    fn remote_features(host: &testing::TestHost) -> Option<RemoteFeatures> {
        host.sink.events.iter().find_map(|event| match event {
            Event::RemoteFeatures { features, .. } => Some(*features),
            _ => None,
        })
    }

    fn host_with_audio(options: AvrcpOptions) -> testing::TestHost {
        let mut host = testing::host_with(options);
        host.audio = AudioPath::new(PEER, true, false);
        host
    }

    #[test]
    fn test_connect_registers_volume_and_bootstraps() {
        let mut host = host_with_audio(AvrcpOptions::default());
        host.handle_connect(testing::peer(FULL_TARGET)).unwrap();

        assert!(host.is_connected());
        assert!(remote_features(&host).unwrap().absolute_volume());
        let sent: heapless::Vec<Command, 4> = host
            .transport
            .sent
            .iter()
            .map(testing::decode_sent)
            .collect();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], Command::GetCapabilities(CapabilityId::CompanyId));
        assert!(host.connection.volume_label.is_some());
        assert_eq!(host.bootstrap_stage(), BootstrapStage::CompanyIds);
    }

    #[test]
    fn test_deny_list_strips_absolute_volume() {
        let mut options = AvrcpOptions::default();
        options.absolute_volume_deny_list.push(PEER).unwrap();
        let mut host = host_with_audio(options);
        host.handle_connect(testing::peer(FULL_TARGET)).unwrap();

        assert!(!remote_features(&host).unwrap().absolute_volume());
        assert!(host.connection.volume_label.is_none());
        assert_eq!(host.set_volume(10), Err(AvrcpError::Unsupported));
        // Raw features are kept
        assert!(host.peer_features().contains(PeerFeatures::ADVANCED_CONTROL));
    }

    #[test]
    fn test_disable_option_strips_absolute_volume() {
        let options = AvrcpOptions {
            disable_absolute_volume: true,
            ..AvrcpOptions::default()
        };
        let mut host = host_with_audio(options);
        host.handle_connect(testing::peer(FULL_TARGET)).unwrap();
        assert!(!remote_features(&host).unwrap().absolute_volume());
    }

    #[test]
    fn test_audio_path_peer_mismatch() {
        let mut host = testing::host();
        host.audio = AudioPath::new(OTHER, true, false);
        host.handle_connect(testing::peer(FULL_TARGET)).unwrap();
        assert!(!remote_features(&host).unwrap().absolute_volume());
        assert!(host.connection.volume_label.is_none());

        // Audio moves to the control peer, features are processed again
        host.sink.events.clear();
        host.update_audio_path(AudioPath::new(PEER, true, false));
        assert!(remote_features(&host).unwrap().absolute_volume());
        assert!(host.connection.volume_label.is_some());
    }

    #[test]
    fn test_second_peer_refused_and_closed() {
        let mut host = host_with_audio(AvrcpOptions::default());
        host.handle_connect(testing::peer(0)).unwrap();
        assert_eq!(
            host.handle_connect(PeerInfo::new(SESSION + 1, OTHER, PeerFeatures::from_raw(0))),
            Err(AvrcpError::AlreadyConnected)
        );
        assert_eq!(host.transport.closed.as_slice(), &[SESSION + 1]);
        assert_eq!(host.peer_address(), Some(PEER));
    }

    #[test]
    fn test_strict_policy_refuses_partial_match() {
        let options = AvrcpOptions {
            reconnect_policy: ReconnectPolicy::RequireMatchingHandleAndAddress,
            ..AvrcpOptions::default()
        };
        let mut host = host_with_audio(options);
        host.handle_connect(testing::peer(0)).unwrap();
        assert_eq!(
            host.handle_connect(PeerInfo::new(SESSION + 1, PEER, PeerFeatures::from_raw(0))),
            Err(AvrcpError::AlreadyConnected)
        );

        let mut host = host_with_audio(AvrcpOptions::default());
        host.handle_connect(testing::peer(0)).unwrap();
        host.handle_connect(PeerInfo::new(
            SESSION + 1,
            PEER,
            PeerFeatures::from_raw(PeerFeatures::TARGET),
        ))
        .unwrap();
        assert!(host.transport.closed.is_empty());
        assert!(host.peer_features().is_target());
    }

    #[test]
    fn test_repeat_connect_moves_to_new_session() {
        const VOLUME_TARGET: u16 = PeerFeatures::TARGET | PeerFeatures::ADVANCED_CONTROL;
        let new_session = SESSION + 1;
        let mut host = host_with_audio(AvrcpOptions::default());
        host.handle_connect(testing::peer(VOLUME_TARGET)).unwrap();
        host.connection.volume = 0x30;
        assert!(host.connection.volume_label.is_some());

        host.handle_connect(PeerInfo::new(
            new_session,
            PEER,
            PeerFeatures::from_raw(VOLUME_TARGET),
        ))
        .unwrap();
        assert!(host.transport.closed.is_empty());
        assert_eq!(host.connection.session, new_session);
        assert_eq!(host.connection.volume, crate::constants::VOLUME_UNKNOWN);

        // Volume registration is redone on the new link
        let registration = host.transport.sent.last().unwrap();
        assert_eq!(registration.session, new_session);
        assert!(host.connection.volume_label.is_some());
        assert_eq!(host.labels.in_use(), 1);

        let label = host.send_command(&Command::GetPlayStatus).unwrap();
        assert_eq!(host.transport.sent.last().unwrap().session, new_session);
        let mut frame = testing::response(
            label.raw(),
            Code::Stable,
            &Response::PlayStatus {
                length: 200_000,
                position: 5_000,
                status: PlaybackStatus::Playing,
            },
        );
        frame.session = new_session;
        host.handle_inbound_message(&frame);
        assert_eq!(
            host.sink.events.last(),
            Some(&Event::PlayPositionChanged {
                length: 200_000,
                position: 5_000
            })
        );

        // Close of the replaced link leaves the live one alone
        host.handle_disconnect(SESSION, PEER);
        assert!(host.is_connected());
        host.handle_disconnect(new_session, PEER);
        assert!(!host.is_connected());
    }

    #[test]
    fn test_late_features_start_bootstrap() {
        let mut host = host_with_audio(AvrcpOptions::default());
        host.handle_connect(testing::peer(PeerFeatures::CONTROLLER)).unwrap();
        assert!(host.transport.sent.is_empty());
        assert_eq!(
            host.handle_features(OTHER, PeerFeatures::from_raw(FULL_TARGET)),
            Err(AvrcpError::NotFound)
        );

        host.handle_features(PEER, PeerFeatures::from_raw(FULL_TARGET))
            .unwrap();
        assert_eq!(host.bootstrap_stage(), BootstrapStage::CompanyIds);
        // A repeated report does not restart discovery
        host.handle_features(PEER, PeerFeatures::from_raw(FULL_TARGET))
            .unwrap();
        let discovery = host
            .transport
            .sent
            .iter()
            .filter(|frame| {
                testing::decode_sent(frame) == Command::GetCapabilities(CapabilityId::CompanyId)
            })
            .count();
        assert_eq!(discovery, 1);
    }

    #[test]
    fn test_sink_disabled_skips_bootstrap() {
        let options = AvrcpOptions {
            sink_enabled: false,
            ..AvrcpOptions::default()
        };
        let mut host = host_with_audio(options);
        host.handle_connect(testing::peer(FULL_TARGET)).unwrap();
        assert_eq!(host.bootstrap_stage(), BootstrapStage::Idle);
        assert!(
            host.sink
                .events
                .iter()
                .any(|event| matches!(event, Event::ControllerFeatures { .. }))
        );
    }

    #[test]
    fn test_disconnect_resets_everything() {
        let mut host = host_with_audio(AvrcpOptions::default());
        host.handle_connect(testing::peer(FULL_TARGET)).unwrap();
        host.start_play_status_poll();
        host.connection.pending_play = true;
        assert!(host.labels.in_use() > 0);

        host.handle_disconnect(SESSION + 5, OTHER);
        assert!(host.is_connected());

        host.sink.events.clear();
        host.handle_disconnect(SESSION, PEER);
        assert!(!host.is_connected());
        assert_eq!(host.labels.in_use(), 0);
        assert!(host.timers.armed.is_empty());
        assert!(host.connection.volume_label.is_none());
        assert!(host.connection.poll_timer.is_none());
        assert!(!host.pending_play());
        assert!(!host.connection.features_processed);
        assert_eq!(host.bootstrap_stage(), BootstrapStage::Idle);
        assert!(host.supported_events().is_empty());
        assert!(host.pending.is_empty());
        assert_eq!(
            host.sink.events.as_slice(),
            &[Event::ConnectionStateChanged {
                connected: false,
                address: PEER
            }]
        );

        // The next connection bootstraps again
        host.transport.sent.clear();
        host.handle_connect(testing::peer(FULL_TARGET)).unwrap();
        assert_eq!(host.bootstrap_stage(), BootstrapStage::CompanyIds);
    }
}

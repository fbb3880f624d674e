//! Discovery/bootstrap sequencer
//!
//! After the control channel comes up the controller role walks the peer through a
//! fixed sequence:
//!
//! ```text
//! CompanyIds -> EventsSupported -> RegisteringEvents -> ListingAttributes
//!     -> ListingValues -> AttributeText -> ValueText -> CurrentValues -> Complete
//! ```
//!
//! Each stage has one success and one failure transition. Failures degrade the sequence
//! instead of aborting it: a peer that refuses the settings queries still gets its
//! events registered and its now playing metadata fetched.

use super::AvrcpHost;
use crate::codec::{Codec, CommandFailure};
use crate::constants::{MAX_APP_ATTRIBUTES, MAX_ELEMENT_ATTRIBUTES, MAX_SUPPORTED_EVENTS};
use crate::events::{Event, EventSink};
use crate::host::SupportedEvent;
use crate::packets::{CapabilityId, Command, ElementAttribute, EventId, PduId, Response};
use crate::timer::TimerService;
use crate::transport::Transport;
use heapless::Vec;

/// Position in the connection bootstrap sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootstrapStage {
    /// Not started on this connection
    Idle,
    /// Waiting for the company id capability
    CompanyIds,
    /// Waiting for the supported events capability
    EventsSupported,
    /// Registering for events one at a time
    RegisteringEvents,
    /// Waiting for the setting attribute list
    ListingAttributes,
    /// Waiting for the values of one attribute
    ListingValues,
    /// Waiting for extended attribute texts
    AttributeText,
    /// Waiting for extended value texts
    ValueText,
    /// Waiting for the current setting values
    CurrentValues,
    /// Sequence finished
    Complete,
}

impl<C, T, M, S> AvrcpHost<C, T, M, S>
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    /// Start the sequence once per connection
    pub(crate) fn start_bootstrap(&mut self) {
        if self.connection.features_processed {
            debug!("[BOOTSTRAP] Already started");
            return;
        }
        self.connection.features_processed = true;
        info!("[BOOTSTRAP] Starting capability discovery");
        self.stage = BootstrapStage::CompanyIds;
        if self
            .send_command(&Command::GetCapabilities(CapabilityId::CompanyId))
            .is_err()
        {
            self.request_supported_events();
        }
    }

    fn request_supported_events(&mut self) {
        self.stage = BootstrapStage::EventsSupported;
        if self
            .send_command(&Command::GetCapabilities(CapabilityId::EventsSupported))
            .is_err()
        {
            self.seed_events(&[]);
        }
    }

    /// Track the bootstrap events the peer supports, in order and without duplicates
    fn seed_events(&mut self, supported: &[EventId]) {
        let mut events: Vec<SupportedEvent, MAX_SUPPORTED_EVENTS> = Vec::new();
        for event in supported.iter().copied().filter(|e| e.is_bootstrap_event()) {
            if !events.iter().any(|e| e.event == event) {
                events.push(SupportedEvent::new(event)).ok();
            }
        }
        debug!("[BOOTSTRAP] {} events to register", events.len());
        self.events = events;
        self.stage = BootstrapStage::RegisteringEvents;
        self.advance_registration();
    }

    pub(crate) fn on_capabilities(&mut self, response: Response) {
        match response {
            Response::CompanyIds(ids) if self.stage == BootstrapStage::CompanyIds => {
                debug!("[BOOTSTRAP] Peer reports {} company ids", ids.len());
                self.request_supported_events();
            }
            Response::EventsSupported(events) if self.stage == BootstrapStage::EventsSupported => {
                self.seed_events(&events);
            }
            _ => debug!("[BOOTSTRAP] Capability response outside discovery"),
        }
    }

    pub(crate) fn on_capabilities_failure(&mut self, failure: CommandFailure) {
        warn!("[BOOTSTRAP] Capability query failed: {}", failure);
        match self.stage {
            BootstrapStage::CompanyIds => self.request_supported_events(),
            BootstrapStage::EventsSupported => self.seed_events(&[]),
            _ => {}
        }
    }

    /// Player application settings discovery, run once after event registration
    pub(crate) fn start_settings_discovery(&mut self) {
        if self.settings.query_started {
            return;
        }
        self.settings.query_started = true;
        if !self.connection.features.supports_app_settings() {
            self.complete_bootstrap();
            return;
        }
        self.settings_request(BootstrapStage::ListingAttributes, &Command::ListPlayerAppAttributes);
    }

    fn settings_request(&mut self, stage: BootstrapStage, command: &Command) {
        self.stage = stage;
        if self.send_command(command).is_err() {
            self.complete_bootstrap();
        }
    }

    fn request_values(&mut self) -> bool {
        match self.settings.next_value_query() {
            Some(attribute) => {
                self.settings_request(
                    BootstrapStage::ListingValues,
                    &Command::ListPlayerAppValues { attribute },
                );
                true
            }
            None => false,
        }
    }

    fn request_current_values(&mut self, attributes: Vec<u8, MAX_APP_ATTRIBUTES>) {
        if attributes.is_empty() {
            self.complete_bootstrap();
            return;
        }
        self.settings_request(
            BootstrapStage::CurrentValues,
            &Command::GetCurrentPlayerAppValue { attributes },
        );
    }

    /// Flush the standard attributes and read their current values
    fn finish_with_standard(&mut self) {
        self.settings.drop_extended();
        self.emit(Event::PlayerAppSettings(self.settings.snapshot(false)));
        let ids = self.settings.standard_ids();
        self.request_current_values(ids);
    }

    /// Flush standard and extended attributes and read all current values
    fn finish_with_all(&mut self) {
        self.emit(Event::PlayerAppSettings(self.settings.snapshot(true)));
        let ids = self.settings.all_ids();
        self.request_current_values(ids);
    }

    fn request_value_text(&mut self) {
        match self.settings.next_value_text_query() {
            Some((attribute, values)) => self.settings_request(
                BootstrapStage::ValueText,
                &Command::GetPlayerAppValueText { attribute, values },
            ),
            None => self.finish_with_all(),
        }
    }

    pub(crate) fn on_settings_response(&mut self, response: Response) {
        match (self.stage, response) {
            (BootstrapStage::ListingAttributes, Response::PlayerAppAttributes(ids)) => {
                self.settings.load_attributes(&ids);
                if self.settings.is_empty() || !self.request_values() {
                    self.complete_bootstrap();
                }
            }
            (BootstrapStage::ListingValues, Response::PlayerAppValues(values)) => {
                self.settings.store_values(&values);
                if self.request_values() {
                    return;
                }
                if self.settings.has_extended() {
                    let attributes = self.settings.extended_ids();
                    self.settings_request(
                        BootstrapStage::AttributeText,
                        &Command::GetPlayerAppAttributeText { attributes },
                    );
                } else {
                    self.finish_with_standard();
                }
            }
            (BootstrapStage::AttributeText, Response::PlayerAppAttributeText(texts)) => {
                self.settings.store_attribute_texts(&texts);
                self.request_value_text();
            }
            (BootstrapStage::ValueText, Response::PlayerAppValueText(texts)) => {
                self.settings.store_value_texts(&texts);
                self.request_value_text();
            }
            (BootstrapStage::CurrentValues, Response::CurrentPlayerAppValues(settings)) => {
                self.emit(Event::PlayerAppSettingsChanged(settings));
                self.complete_bootstrap();
            }
            (BootstrapStage::Complete, Response::CurrentPlayerAppValues(settings)) => {
                self.emit(Event::PlayerAppSettingsChanged(settings));
            }
            _ => debug!("[BOOTSTRAP] Settings response outside discovery"),
        }
    }

    pub(crate) fn on_settings_failure(&mut self, pdu: PduId, failure: CommandFailure) {
        warn!("[BOOTSTRAP] Settings pdu {} failed: {}", pdu.raw(), failure);
        match self.stage {
            BootstrapStage::ListingAttributes | BootstrapStage::CurrentValues => {
                self.complete_bootstrap();
            }
            BootstrapStage::ListingValues
            | BootstrapStage::AttributeText
            | BootstrapStage::ValueText => self.finish_with_standard(),
            _ => {}
        }
    }

    fn complete_bootstrap(&mut self) {
        self.stage = BootstrapStage::Complete;
        if self.connection.procedure_complete {
            return;
        }
        self.connection.procedure_complete = true;
        info!("[BOOTSTRAP] Connection procedure complete");
        self.fetch_now_playing();
    }

    /// Request all standard attributes of the playing track
    pub(crate) fn fetch_now_playing(&mut self) {
        if let Err(e) = self.send_command(&Command::now_playing_attributes()) {
            warn!("[BOOTSTRAP] Metadata request failed: {}", e);
        }
    }

    pub(crate) fn on_element_attributes(
        &mut self,
        attributes: Vec<ElementAttribute, MAX_ELEMENT_ATTRIBUTES>,
    ) {
        self.connection.element_attributes_retried = false;
        self.emit(Event::TrackChanged(attributes));
    }

    pub(crate) fn on_element_attributes_failure(&mut self, failure: CommandFailure) {
        if failure == CommandFailure::Timeout && !self.connection.element_attributes_retried {
            self.connection.element_attributes_retried = true;
            debug!("[BOOTSTRAP] Retrying metadata request");
            self.fetch_now_playing();
            return;
        }
        self.connection.element_attributes_retried = false;
        warn!("[BOOTSTRAP] Metadata request failed: {}", failure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::PeerFeatures;
    use crate::host::RegistrationStatus;
    use crate::packets::{
        Code, MediaAttributeId, Notification, PlaybackStatus, PlayerSetting, SettingText, StatusCode,
    };
    use crate::settings::PlayerAppAttribute;
    use crate::testing::{self, connected_host};
    use crate::timer::{TimerContext, TimerKind};

    const METADATA_PEER: u16 =
        PeerFeatures::TARGET | PeerFeatures::METADATA | PeerFeatures::VENDOR;

    /// Answer the most recent command with `response`
    fn answer(host: &mut testing::TestHost, code: Code, response: &Response) {
        let label = host.transport.sent.last().unwrap().label;
        host.handle_inbound_message(&testing::response(label, code, response));
    }

    fn last_command(host: &testing::TestHost) -> Command {
        testing::decode_sent(host.transport.sent.last().unwrap())
    }

    fn sent_count(host: &testing::TestHost, pdu: PduId) -> usize {
        host.transport
            .sent
            .iter()
            .filter(|f| testing::decode_sent(f).pdu() == pdu)
            .count()
    }

    fn outstanding_registrations(host: &testing::TestHost) -> usize {
        host.events
            .iter()
            .filter(|e| e.status == RegistrationStatus::Registered)
            .count()
    }

    fn company_ids() -> Response {
        Response::CompanyIds(Vec::from_slice(&[crate::constants::BLUETOOTH_SIG_COMPANY_ID]).unwrap())
    }

    #[test]
    fn test_bootstrap_is_idempotent() {
        let mut host = connected_host(METADATA_PEER);
        host.start_bootstrap();
        host.start_bootstrap();
        assert_eq!(host.transport.sent.len(), 1);
        assert_eq!(
            last_command(&host),
            Command::GetCapabilities(CapabilityId::CompanyId)
        );
        assert_eq!(host.stage, BootstrapStage::CompanyIds);
    }

    #[test]
    fn test_events_filtered_and_deduplicated() {
        let mut host = connected_host(METADATA_PEER);
        host.start_bootstrap();
        answer(&mut host, Code::Stable, &company_ids());
        assert_eq!(
            last_command(&host),
            Command::GetCapabilities(CapabilityId::EventsSupported)
        );

        answer(
            &mut host,
            Code::Stable,
            &Response::EventsSupported(
                Vec::from_slice(&[
                    EventId::TrackChanged,
                    EventId::PlaybackPosChanged,
                    EventId::PlaybackStatusChanged,
                    EventId::TrackChanged,
                    EventId::VolumeChanged,
                ])
                .unwrap(),
            ),
        );
        let tracked: Vec<EventId, 4> = host.events.iter().map(|e| e.event).collect();
        assert_eq!(
            tracked.as_slice(),
            &[EventId::TrackChanged, EventId::PlaybackStatusChanged]
        );
        assert_eq!(host.stage, BootstrapStage::RegisteringEvents);
        assert_eq!(
            last_command(&host),
            Command::RegisterNotification {
                event: EventId::TrackChanged,
                interval: 0
            }
        );
    }

    #[test]
    fn test_company_id_failure_degrades() {
        let mut host = connected_host(METADATA_PEER);
        host.start_bootstrap();
        let label = host.transport.sent[0].label;
        host.handle_inbound_message(&testing::reject(
            label,
            PduId::GetCapabilities,
            StatusCode::InvalidCommand,
        ));
        assert_eq!(host.stage, BootstrapStage::EventsSupported);
        assert_eq!(
            last_command(&host),
            Command::GetCapabilities(CapabilityId::EventsSupported)
        );
    }

    #[test]
    fn test_no_events_no_settings_completes() {
        let mut host = connected_host(METADATA_PEER);
        host.start_bootstrap();
        answer(&mut host, Code::Stable, &company_ids());
        answer(&mut host, Code::Stable, &Response::EventsSupported(Vec::new()));

        assert_eq!(host.stage, BootstrapStage::Complete);
        assert!(host.connection.procedure_complete);
        assert_eq!(last_command(&host), Command::now_playing_attributes());
    }

    #[test]
    fn test_settings_discovery_with_extended_attributes() {
        let mut host = connected_host(METADATA_PEER | PeerFeatures::APP_SETTINGS);
        host.start_settings_discovery();
        assert_eq!(last_command(&host), Command::ListPlayerAppAttributes);

        answer(
            &mut host,
            Code::Stable,
            &Response::PlayerAppAttributes(Vec::from_slice(&[0x02, 0x81]).unwrap()),
        );
        assert_eq!(last_command(&host), Command::ListPlayerAppValues { attribute: 0x02 });
        answer(
            &mut host,
            Code::Stable,
            &Response::PlayerAppValues(Vec::from_slice(&[1, 2]).unwrap()),
        );
        assert_eq!(last_command(&host), Command::ListPlayerAppValues { attribute: 0x81 });
        answer(
            &mut host,
            Code::Stable,
            &Response::PlayerAppValues(Vec::from_slice(&[3]).unwrap()),
        );
        assert_eq!(
            last_command(&host),
            Command::GetPlayerAppAttributeText {
                attributes: Vec::from_slice(&[0x81]).unwrap()
            }
        );
        answer(
            &mut host,
            Code::Stable,
            &Response::PlayerAppAttributeText(Vec::from_slice(&[SettingText::utf8(0x81, "Bass")]).unwrap()),
        );
        assert_eq!(
            last_command(&host),
            Command::GetPlayerAppValueText {
                attribute: 0x81,
                values: Vec::from_slice(&[3]).unwrap()
            }
        );
        answer(
            &mut host,
            Code::Stable,
            &Response::PlayerAppValueText(Vec::from_slice(&[SettingText::utf8(3, "Boost")]).unwrap()),
        );
        assert_eq!(
            last_command(&host),
            Command::GetCurrentPlayerAppValue {
                attributes: Vec::from_slice(&[0x02, 0x81]).unwrap()
            }
        );
        match &host.sink.events[0] {
            Event::PlayerAppSettings(attributes) => {
                assert_eq!(attributes.len(), 2);
                assert_eq!(attributes[0].values.as_slice(), &[1, 2]);
                assert_eq!(attributes[1].value_names[0].as_str(), Some("Boost"));
            }
            other => panic!("unexpected event {other:?}"),
        }

        let current = Vec::from_slice(&[PlayerSetting::new(0x02, 1), PlayerSetting::new(0x81, 3)]).unwrap();
        answer(&mut host, Code::Stable, &Response::CurrentPlayerAppValues(current));
        assert!(matches!(host.sink.events[1], Event::PlayerAppSettingsChanged(_)));
        assert_eq!(host.stage, BootstrapStage::Complete);
        assert_eq!(last_command(&host), Command::now_playing_attributes());
    }

    #[test]
    fn test_value_text_failure_falls_back_to_standard() {
        let mut host = connected_host(METADATA_PEER | PeerFeatures::APP_SETTINGS);
        host.start_settings_discovery();
        answer(
            &mut host,
            Code::Stable,
            &Response::PlayerAppAttributes(Vec::from_slice(&[0x01, 0x90]).unwrap()),
        );
        answer(&mut host, Code::Stable, &Response::PlayerAppValues(Vec::from_slice(&[1]).unwrap()));
        answer(&mut host, Code::Stable, &Response::PlayerAppValues(Vec::from_slice(&[2]).unwrap()));
        answer(&mut host, Code::Stable, &Response::PlayerAppAttributeText(Vec::new()));

        let label = host.transport.sent.last().unwrap().label;
        host.handle_inbound_message(&testing::reject(
            label,
            PduId::GetPlayerAppValueText,
            StatusCode::InternalError,
        ));

        assert_eq!(
            last_command(&host),
            Command::GetCurrentPlayerAppValue {
                attributes: Vec::from_slice(&[0x01]).unwrap()
            }
        );
        let expected: Vec<PlayerAppAttribute, 8> = {
            let mut attribute = PlayerAppAttribute::new(0x01);
            attribute.values = Vec::from_slice(&[1]).unwrap();
            Vec::from_slice(&[attribute]).unwrap()
        };
        assert_eq!(host.sink.events.as_slice(), &[Event::PlayerAppSettings(expected)]);
    }

    #[test]
    fn test_list_attributes_failure_completes() {
        let mut host = connected_host(METADATA_PEER | PeerFeatures::APP_SETTINGS);
        host.start_settings_discovery();
        let label = host.transport.sent[0].label;
        host.handle_inbound_message(&testing::reject(
            label,
            PduId::ListPlayerAppAttributes,
            StatusCode::InvalidCommand,
        ));
        assert_eq!(host.stage, BootstrapStage::Complete);
        assert_eq!(sent_count(&host, PduId::GetElementAttributes), 1);
        assert!(host.sink.events.is_empty());
    }

    #[test]
    fn test_element_attributes_retry_once() {
        let mut host = connected_host(METADATA_PEER);
        host.fetch_now_playing();

        for _ in 0..2 {
            let expiry = host
                .timers
                .expire_where(|kind| {
                    matches!(
                        kind,
                        TimerKind::Transaction(TimerContext::Status {
                            pdu: PduId::GetElementAttributes,
                            ..
                        })
                    )
                })
                .unwrap();
            host.handle_timer_expired(expiry);
        }
        assert_eq!(sent_count(&host, PduId::GetElementAttributes), 2);
        assert_eq!(host.labels.in_use(), 0);
        assert!(host.sink.events.is_empty());
    }

    #[test]
    fn test_events_registered_one_at_a_time_before_settings() {
        let mut host = connected_host(METADATA_PEER | PeerFeatures::APP_SETTINGS);
        host.start_bootstrap();
        answer(&mut host, Code::Stable, &company_ids());
        answer(
            &mut host,
            Code::Stable,
            &Response::EventsSupported(
                Vec::from_slice(&[
                    EventId::PlaybackStatusChanged,
                    EventId::TrackChanged,
                    EventId::PlayerAppSettingChanged,
                ])
                .unwrap(),
            ),
        );

        let interims = [
            Notification::PlaybackStatusChanged(PlaybackStatus::Paused),
            Notification::TrackChanged(7),
            Notification::PlayerAppSettingChanged(
                Vec::from_slice(&[PlayerSetting::new(0x02, 1)]).unwrap(),
            ),
        ];
        for interim in interims {
            assert_eq!(outstanding_registrations(&host), 1);
            assert_eq!(
                last_command(&host),
                Command::RegisterNotification {
                    event: interim.event_id(),
                    interval: 0
                }
            );
            assert_eq!(sent_count(&host, PduId::ListPlayerAppAttributes), 0);
            answer(&mut host, Code::Interim, &Response::Notification(interim));
        }

        assert_eq!(outstanding_registrations(&host), 0);
        assert_eq!(sent_count(&host, PduId::RegisterNotification), 3);
        assert_eq!(sent_count(&host, PduId::ListPlayerAppAttributes), 1);
        assert_eq!(last_command(&host), Command::ListPlayerAppAttributes);
        assert_eq!(host.stage, BootstrapStage::ListingAttributes);
        // Three interim registrations held plus the attribute query
        assert_eq!(host.labels.in_use(), 4);
    }

    #[test]
    fn test_track_change_delivers_metadata() {
        let mut host = connected_host(METADATA_PEER);
        host.start_bootstrap();
        answer(&mut host, Code::Stable, &company_ids());
        answer(
            &mut host,
            Code::Stable,
            &Response::EventsSupported(Vec::from_slice(&[EventId::TrackChanged]).unwrap()),
        );
        let registration = host.transport.sent.last().unwrap().label;
        answer(
            &mut host,
            Code::Interim,
            &Response::Notification(Notification::TrackChanged(1)),
        );
        // Bootstrap metadata fetch
        answer(&mut host, Code::Stable, &Response::ElementAttributes(Vec::new()));
        host.sink.events.clear();
        host.transport.sent.clear();

        let uid = 0x0011_2233_4455_6677;
        host.handle_inbound_message(&testing::response(
            registration,
            Code::Changed,
            &Response::Notification(Notification::TrackChanged(uid)),
        ));
        assert_eq!(host.connection.playing_uid, uid);
        assert_eq!(last_command(&host), Command::now_playing_attributes());

        let title = ElementAttribute::utf8(MediaAttributeId::Title, "Blue in Green");
        let artist = ElementAttribute::utf8(MediaAttributeId::Artist, "Miles Davis");
        answer(
            &mut host,
            Code::Stable,
            &Response::ElementAttributes(Vec::from_slice(&[title.clone(), artist.clone()]).unwrap()),
        );
        assert_eq!(
            host.sink.events.as_slice(),
            &[Event::TrackChanged(Vec::from_slice(&[title, artist]).unwrap())]
        );
        // Only the renewed registration is left
        assert_eq!(host.labels.in_use(), 1);
        assert_eq!(outstanding_registrations(&host), 1);
    }

    #[test]
    fn test_end_to_end_connection_procedure() {
        let mut host = testing::host();
        host.handle_connect(testing::peer(METADATA_PEER)).unwrap();
        assert!(matches!(
            host.sink.events[0],
            Event::RemoteFeatures { .. }
        ));
        assert!(matches!(
            host.sink.events[1],
            Event::ConnectionStateChanged { connected: true, .. }
        ));
        host.sink.events.clear();

        answer(&mut host, Code::Stable, &company_ids());
        answer(
            &mut host,
            Code::Stable,
            &Response::EventsSupported(
                Vec::from_slice(&[EventId::PlaybackStatusChanged, EventId::TrackChanged]).unwrap(),
            ),
        );
        answer(
            &mut host,
            Code::Interim,
            &Response::Notification(Notification::PlaybackStatusChanged(PlaybackStatus::Stopped)),
        );
        answer(
            &mut host,
            Code::Interim,
            &Response::Notification(Notification::TrackChanged(1)),
        );

        assert_eq!(host.stage, BootstrapStage::Complete);
        assert_eq!(last_command(&host), Command::now_playing_attributes());
        // Two interim registrations held plus the metadata request
        assert_eq!(host.labels.in_use(), 3);

        let title = ElementAttribute::utf8(MediaAttributeId::Title, "So What");
        answer(
            &mut host,
            Code::Stable,
            &Response::ElementAttributes(Vec::from_slice(&[title.clone()]).unwrap()),
        );
        assert_eq!(
            host.sink.events.as_slice(),
            &[
                Event::PlayStatusChanged(PlaybackStatus::Stopped),
                Event::TrackChanged(Vec::from_slice(&[title]).unwrap()),
            ]
        );
        assert_eq!(host.labels.in_use(), 2);
    }
}

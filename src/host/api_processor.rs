use super::AvrcpHost;
use crate::codec::Codec;
use crate::events::EventSink;
use crate::timer::TimerService;
use crate::transport::Transport;
use crate::{ApiRequest, ApiResponse, ConnectionInfo};

impl<C, T, M, S> AvrcpHost<C, T, M, S>
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    /// Process an API request
    pub(crate) fn process_api_request(&mut self, request: ApiRequest) -> ApiResponse {
        let result = match request {
            ApiRequest::SetVolume(volume) => self.set_volume(volume),
            ApiRequest::SendPassThrough { op, state } => self.send_passthrough(op, state),
            ApiRequest::SendGroupNavigation { op, state } => self.send_group_navigation(op, state),
            ApiRequest::ChangePlayerSetting(settings) => self.change_player_setting(&settings),
            ApiRequest::SetVolumeResponse { volume, label } => {
                self.set_volume_response(volume, label)
            }
            ApiRequest::VolumeChangeNotificationResponse {
                kind,
                volume,
                label,
            } => self.volume_change_notification_response(kind, volume, label),
            ApiRequest::GetPlayStatusResponse {
                status,
                length,
                position,
            } => self.get_play_status_response(status, length, position),
            ApiRequest::GetElementAttributesResponse(attributes) => {
                self.get_element_attributes_response(&attributes)
            }
            ApiRequest::RegisterNotificationResponse { kind, notification } => {
                self.register_notification_response(kind, notification)
            }
            ApiRequest::GetConnectionInfo => {
                return ApiResponse::ConnectionInfo(self.connection_info());
            }
        };
        match result {
            Ok(()) => ApiResponse::Done,
            Err(e) => ApiResponse::Error(e),
        }
    }

    /// Snapshot of the current connection
    #[must_use]
    pub fn connection_info(&self) -> Option<ConnectionInfo> {
        self.connection.connected.then(|| ConnectionInfo {
            address: self.connection.address,
            session: self.connection.session,
            features: self.connection.features,
            volume: self.connection.volume,
            stage: self.stage,
        })
    }
}

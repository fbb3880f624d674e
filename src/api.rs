//! `Tunebird` API Functions
//!
//! Async functions that forward outward commands and target-role answers to the
//! processor task over static channels. They can be called from any task while
//! [`crate::processor::run`] owns the host.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tunebird::api::{get_play_status_response, send_passthrough, set_volume};
//! use tunebird::{KeyState, PassThroughOp, PlaybackStatus};
//!
//! set_volume(0x40).await?;
//! send_passthrough(PassThroughOp::Play, KeyState::Pressed).await?;
//!
//! // After an `Event::GetPlayStatusRequest`
//! get_play_status_response(PlaybackStatus::Playing, 215_000, 12_000).await?;
//! ```

use crate::constants::{MAX_APP_ATTRIBUTES, MAX_ELEMENT_ATTRIBUTES};
use crate::packets::{
    ElementAttribute, GroupNavigation, KeyState, Notification, NotificationKind, PassThroughOp,
    PlaybackStatus, PlayerSetting,
};
use crate::{ApiRequest, ApiResponse, AvrcpError, ConnectionInfo, REQUEST_CHANNEL, RESPONSE_CHANNEL};
use heapless::Vec;

async fn request(request: ApiRequest) -> Result<(), AvrcpError> {
    REQUEST_CHANNEL.sender().send(request).await;
    match RESPONSE_CHANNEL.receiver().receive().await {
        ApiResponse::Done => Ok(()),
        ApiResponse::Error(e) => Err(e),
        ApiResponse::ConnectionInfo(_) => Err(AvrcpError::Fail),
    }
}

/// Set the peer's absolute volume (7-bit).
///
/// # Errors
///
/// Returns `NotReady` when disconnected, `Unchanged` when the peer already reports this
/// volume, `Unsupported` when the peer does not take absolute volume, or `Fail` when the
/// command could not be sent.
pub async fn set_volume(volume: u8) -> Result<(), AvrcpError> {
    request(ApiRequest::SetVolume(volume)).await
}

/// Send a pass-through key to the peer.
///
/// # Errors
///
/// Returns `NotReady` when disconnected, `Unsupported` when the peer is not a target, or
/// `Fail` when the command could not be sent.
pub async fn send_passthrough(op: PassThroughOp, state: KeyState) -> Result<(), AvrcpError> {
    request(ApiRequest::SendPassThrough { op, state }).await
}

/// Send a group navigation key to the peer.
///
/// # Errors
///
/// Same as [`send_passthrough`].
pub async fn send_group_navigation(
    op: GroupNavigation,
    state: KeyState,
) -> Result<(), AvrcpError> {
    request(ApiRequest::SendGroupNavigation { op, state }).await
}

/// Change player application settings on the peer.
///
/// Settings beyond the supported attribute count are ignored.
///
/// # Errors
///
/// Returns `NotReady` when disconnected, `Unsupported` when the peer has no player
/// settings, `InvalidParameter` for an empty list, or `Fail` when the command could not
/// be sent.
pub async fn change_player_setting(settings: &[PlayerSetting]) -> Result<(), AvrcpError> {
    let settings: Vec<PlayerSetting, MAX_APP_ATTRIBUTES> =
        settings.iter().take(MAX_APP_ATTRIBUTES).copied().collect();
    request(ApiRequest::ChangePlayerSetting(settings)).await
}

/// Accept the peer's `SetAbsoluteVolume` received on `label`.
///
/// # Errors
///
/// Returns `NotReady` when disconnected or `Transport` when the answer cannot be sent.
pub async fn set_volume_response(volume: u8, label: u8) -> Result<(), AvrcpError> {
    request(ApiRequest::SetVolumeResponse { volume, label }).await
}

/// Answer the peer's volume change registration.
///
/// # Errors
///
/// Returns `NotReady` when disconnected or `Transport` when the answer cannot be sent.
pub async fn volume_change_notification_response(
    kind: NotificationKind,
    volume: u8,
    label: u8,
) -> Result<(), AvrcpError> {
    request(ApiRequest::VolumeChangeNotificationResponse {
        kind,
        volume,
        label,
    })
    .await
}

/// Answer the peer's `GetPlayStatus`.
///
/// # Errors
///
/// Returns `NotPending` when no request is outstanding or `Transport` when the answer
/// cannot be sent.
pub async fn get_play_status_response(
    status: PlaybackStatus,
    length: u32,
    position: u32,
) -> Result<(), AvrcpError> {
    request(ApiRequest::GetPlayStatusResponse {
        status,
        length,
        position,
    })
    .await
}

/// Answer the peer's `GetElementAttributes`.
///
/// # Errors
///
/// Returns `NotPending` when no request is outstanding or `Transport` when the answer
/// cannot be sent.
pub async fn get_element_attributes_response(
    attributes: &[ElementAttribute],
) -> Result<(), AvrcpError> {
    let attributes: Vec<ElementAttribute, MAX_ELEMENT_ATTRIBUTES> =
        attributes.iter().take(MAX_ELEMENT_ATTRIBUTES).cloned().collect();
    request(ApiRequest::GetElementAttributesResponse(attributes)).await
}

/// Answer a notification the peer registered for.
///
/// # Errors
///
/// Returns `NotReady` when the peer has not registered for the event, `Unsupported` for
/// events this crate does not serve, or `Transport` when the answer cannot be sent.
pub async fn register_notification_response(
    kind: NotificationKind,
    notification: Notification,
) -> Result<(), AvrcpError> {
    request(ApiRequest::RegisterNotificationResponse { kind, notification }).await
}

/// Get the current connection, if any.
///
/// # Errors
///
/// Returns an error if the response is unexpected.
pub async fn connection_info() -> Result<Option<ConnectionInfo>, AvrcpError> {
    REQUEST_CHANNEL
        .sender()
        .send(ApiRequest::GetConnectionInfo)
        .await;
    match RESPONSE_CHANNEL.receiver().receive().await {
        ApiResponse::ConnectionInfo(info) => Ok(info),
        ApiResponse::Error(e) => Err(e),
        ApiResponse::Done => Err(AvrcpError::Fail),
    }
}

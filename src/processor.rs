//! Processor - the single serial context that drives an [`AvrcpHost`]
//!
//! Three static channels feed the host:
//!
//! * **Link events** (`LINK_CHANNEL`): connect, disconnect, late features, inbound frames
//!   and audio path updates, submitted with [`submit_link_event`]
//! * **Timer expiries** (`TIMER_CHANNEL`): handed over with [`crate::timer::notify_expired`]
//! * **API requests** (`REQUEST_CHANNEL`): sent by the functions in [`crate::api`], answered
//!   on `RESPONSE_CHANNEL`
//!
//! [`run`] waits on all three and hands whichever is ready to the host. Handlers never
//! block, so one task is enough to own the host.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[embassy_executor::task]
//! async fn avrcp_task(mut host: MyHost) -> ! {
//!     tunebird::processor::run(&mut host).await
//! }
//!
//! // From the L2CAP receive path
//! tunebird::processor::submit_link_event(LinkEvent::Message(frame))?;
//! ```

use crate::codec::Codec;
use crate::connection::{AudioPath, PeerInfo};
use crate::events::EventSink;
use crate::features::PeerFeatures;
use crate::timer::TimerService;
use crate::transport::{Frame, Transport};
use crate::{
    AvrcpError, AvrcpHost, BluetoothAddress, LINK_CHANNEL, REQUEST_CHANNEL, RESPONSE_CHANNEL,
    TIMER_CHANNEL,
};
use embassy_futures::select::{Either3, select3};

/// Events from the link layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Control channel opened
    Connected(PeerInfo),
    /// Features of the connected peer became known or changed
    Features {
        /// Peer address
        address: BluetoothAddress,
        /// Folded SDP features
        features: PeerFeatures,
    },
    /// Control channel closed
    Disconnected {
        /// Session handle
        session: u16,
        /// Peer address
        address: BluetoothAddress,
    },
    /// Frame received on the control channel
    Message(Frame),
    /// Audio path state changed
    AudioPath(AudioPath),
}

/// Queue a link event for the processor
///
/// # Errors
/// Returns `AvrcpError::ChannelFull` when the link channel is full.
pub fn submit_link_event(event: LinkEvent) -> Result<(), AvrcpError> {
    LINK_CHANNEL.try_send(event).map_err(|_| {
        warn!("[PROCESSOR] Link channel full, dropping event");
        AvrcpError::ChannelFull
    })
}

/// Handle one link event, timer expiry or API request
pub(crate) async fn step<C, T, M, S>(host: &mut AvrcpHost<C, T, M, S>)
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    match select3(
        LINK_CHANNEL.receive(),
        TIMER_CHANNEL.receive(),
        REQUEST_CHANNEL.receive(),
    )
    .await
    {
        Either3::First(event) => {
            trace!("[PROCESSOR] Link event");
            host.process_link_event(event);
        }
        Either3::Second(expiry) => {
            trace!("[PROCESSOR] Timer {} expired", expiry.handle.0);
            host.handle_timer_expired(expiry);
        }
        Either3::Third(request) => {
            let response = host.process_api_request(request);
            RESPONSE_CHANNEL.send(response).await;
        }
    }
}

/// Drive `host` forever
pub async fn run<C, T, M, S>(host: &mut AvrcpHost<C, T, M, S>) -> !
where
    C: Codec,
    T: Transport,
    M: TimerService,
    S: EventSink,
{
    info!("[PROCESSOR] AVRCP processor started");
    loop {
        step(host).await;
    }
}

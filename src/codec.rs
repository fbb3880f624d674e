//! AVRCP Vendor-Dependent PDU Codec
//!
//! The protocol core never touches PDU bytes directly: it asks a [`Codec`] to build the
//! payload for a typed [`Command`] or [`Response`] and to parse inbound payloads back
//! into typed values. [`AvrcpCodec`] implements the AVRCP 1.6 single-packet format:
//!
//! ```text
//! +------------------+--------+-------------+--------------+------------+
//! | company id (3 B) | pdu id | packet type | param length | parameters |
//! |  00 19 58 (SIG)  |  1 B   |  1 B (0)    |   2 B (BE)   |   N bytes  |
//! +------------------+--------+-------------+--------------+------------+
//! ```
//!
//! Pass-through frames carry the operation id (with the release flag in bit 7), the
//! operand length and, for vendor-unique operations, a company id and a 16-bit
//! vendor operation.

use crate::constants::{
    BLUETOOTH_SIG_COMPANY_ID, MAX_PAYLOAD_SIZE, MAX_VOLUME, VENDOR_HEADER_SIZE,
};
use crate::packets::{
    CapabilityId, Code, Command, ElementAttribute, EventId, GroupNavigation, KeyState,
    MediaAttributeId, Notification, Opcode, PassThrough, PassThroughOp, PduId, PlaybackStatus,
    PlayerSetting, Response, SettingText, StatusCode, UnknownValue,
};
use heapless::Vec;

/// Encoded payload handed to the transport
pub type Payload = Vec<u8, MAX_PAYLOAD_SIZE>;

/// Errors raised while encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Encoded payload does not fit in [`Payload`]
    PayloadTooLarge,
    /// Value cannot be represented on the wire
    InvalidParameter,
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadTooLarge => write!(f, "AVRCP payload exceeds buffer capacity"),
            Self::InvalidParameter => write!(f, "AVRCP parameter cannot be encoded"),
        }
    }
}

/// Inbound payload could not be parsed
///
/// `pdu` is the raw PDU id found in the header (0 when the header itself is truncated)
/// and `status` is the AVRCP status to put in the REJECTED reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeError {
    /// Raw PDU id
    pub pdu: u8,
    /// Status for the reject response
    pub status: StatusCode,
}

impl DecodeError {
    const fn new(pdu: u8, status: StatusCode) -> Self {
        Self { pdu, status }
    }
}

/// Terminal failure of an outgoing command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandFailure {
    /// Peer answered REJECTED with a status
    Rejected(StatusCode),
    /// Peer answered NOT IMPLEMENTED
    NotImplemented,
    /// Peer response could not be parsed
    Malformed(StatusCode),
    /// No response before the transaction timer fired
    Timeout,
}

/// Outcome of parsing an inbound response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResponse {
    /// PDU id from the header
    pub pdu: PduId,
    /// Parsed parameters or the peer-reported failure
    pub body: Result<Response, CommandFailure>,
}

/// PDU encoder/decoder used by the protocol core
pub trait Codec {
    /// Build the vendor-dependent payload of a command
    ///
    /// # Errors
    /// Returns `CodecError` when the command does not fit or cannot be represented.
    fn encode_command(&self, command: &Command) -> Result<Payload, CodecError>;

    /// Build the vendor-dependent payload of a response
    ///
    /// # Errors
    /// Returns `CodecError` when the response does not fit or cannot be represented.
    fn encode_response(&self, response: &Response) -> Result<Payload, CodecError>;

    /// Build a REJECTED payload carrying `status`
    ///
    /// # Errors
    /// Returns `CodecError` when the payload cannot be built.
    fn encode_reject(&self, pdu: u8, status: StatusCode) -> Result<Payload, CodecError>;

    /// Parse an inbound command payload
    ///
    /// # Errors
    /// Returns `DecodeError` with the status to reject the command with.
    fn decode_command(&self, payload: &[u8]) -> Result<Command, DecodeError>;

    /// Parse an inbound response payload received with `code`
    ///
    /// # Errors
    /// Returns `DecodeError` when the header or the parameters are malformed.
    fn decode_response(&self, code: Code, payload: &[u8]) -> Result<DecodedResponse, DecodeError>;

    /// Build pass-through operands
    ///
    /// # Errors
    /// Returns `CodecError` when the operation cannot be represented.
    fn encode_passthrough(&self, passthrough: PassThrough) -> Result<Payload, CodecError>;

    /// Parse pass-through operands
    ///
    /// # Errors
    /// Returns `DecodeError` when the operands are truncated.
    fn decode_passthrough(&self, payload: &[u8]) -> Result<PassThrough, DecodeError>;
}

/// AVRCP 1.6 vendor-dependent codec (single packets only)
#[derive(Debug, Clone, Copy, Default)]
pub struct AvrcpCodec;

impl Codec for AvrcpCodec {
    fn encode_command(&self, command: &Command) -> Result<Payload, CodecError> {
        let mut w = Writer::vendor(command.pdu().raw())?;
        match command {
            Command::GetCapabilities(capability) => w.u8(*capability as u8)?,
            Command::ListPlayerAppAttributes | Command::GetPlayStatus => {}
            Command::ListPlayerAppValues { attribute } => w.u8(*attribute)?,
            Command::GetCurrentPlayerAppValue { attributes }
            | Command::GetPlayerAppAttributeText { attributes } => {
                w.count(attributes.len())?;
                w.bytes(attributes)?;
            }
            Command::SetPlayerAppValue { settings } => {
                w.count(settings.len())?;
                for setting in settings {
                    w.u8(setting.attribute)?;
                    w.u8(setting.value)?;
                }
            }
            Command::GetPlayerAppValueText { attribute, values } => {
                w.u8(*attribute)?;
                w.count(values.len())?;
                w.bytes(values)?;
            }
            Command::InformDisplayCharset { charsets } => {
                w.count(charsets.len())?;
                for charset in charsets {
                    w.u16(*charset)?;
                }
            }
            Command::GetElementAttributes {
                identifier,
                attributes,
            } => {
                w.u64(*identifier)?;
                w.count(attributes.len())?;
                for attribute in attributes {
                    w.u32(u32::from(attribute.raw()))?;
                }
            }
            Command::RegisterNotification { event, interval } => {
                w.u8(event.raw())?;
                w.u32(*interval)?;
            }
            Command::RequestContinuingResponse { target }
            | Command::AbortContinuingResponse { target } => w.u8(*target)?,
            Command::SetAbsoluteVolume(volume) => w.u8(volume & MAX_VOLUME)?,
        }
        w.finish()
    }

    fn encode_response(&self, response: &Response) -> Result<Payload, CodecError> {
        let mut w = Writer::vendor(response.pdu().raw())?;
        match response {
            Response::CompanyIds(ids) => {
                w.u8(CapabilityId::CompanyId as u8)?;
                w.count(ids.len())?;
                for id in ids {
                    w.u24(*id)?;
                }
            }
            Response::EventsSupported(events) => {
                w.u8(CapabilityId::EventsSupported as u8)?;
                w.count(events.len())?;
                for event in events {
                    w.u8(event.raw())?;
                }
            }
            Response::PlayerAppAttributes(ids) => {
                w.count(ids.len())?;
                w.bytes(ids)?;
            }
            Response::PlayerAppValues(ids) => {
                w.count(ids.len())?;
                w.bytes(ids)?;
            }
            Response::CurrentPlayerAppValues(settings) => {
                w.count(settings.len())?;
                for setting in settings {
                    w.u8(setting.attribute)?;
                    w.u8(setting.value)?;
                }
            }
            Response::PlayerAppAttributeText(texts) => w.setting_texts(texts)?,
            Response::PlayerAppValueText(texts) => w.setting_texts(texts)?,
            Response::ElementAttributes(attributes) => {
                w.count(attributes.len())?;
                for attribute in attributes {
                    w.u32(u32::from(attribute.id.raw()))?;
                    w.u16(attribute.charset)?;
                    let len =
                        u16::try_from(attribute.value.len()).map_err(|_| CodecError::InvalidParameter)?;
                    w.u16(len)?;
                    w.bytes(&attribute.value)?;
                }
            }
            Response::PlayStatus {
                length,
                position,
                status,
            } => {
                w.u32(*length)?;
                w.u32(*position)?;
                w.u8(*status as u8)?;
            }
            Response::Notification(notification) => w.notification(notification)?,
            Response::AbsoluteVolume(volume) => w.u8(volume & MAX_VOLUME)?,
            Response::Accepted(_) => {}
        }
        w.finish()
    }

    fn encode_reject(&self, pdu: u8, status: StatusCode) -> Result<Payload, CodecError> {
        let mut w = Writer::vendor(pdu)?;
        w.u8(status.raw())?;
        w.finish()
    }

    fn decode_command(&self, payload: &[u8]) -> Result<Command, DecodeError> {
        let (pdu_raw, params) = split_vendor(payload)?;
        let pdu = PduId::try_from(pdu_raw).map_err(|UnknownValue(raw)| {
            DecodeError::new(raw, StatusCode::InvalidCommand)
        })?;
        let bad_param = DecodeError::new(pdu_raw, StatusCode::InvalidParameter);
        let mut r = Reader::new(params);

        let command = match pdu {
            PduId::GetCapabilities => {
                let capability = r.u8().ok_or(bad_param)?;
                Command::GetCapabilities(CapabilityId::try_from(capability).map_err(|_| bad_param)?)
            }
            PduId::ListPlayerAppAttributes => Command::ListPlayerAppAttributes,
            PduId::ListPlayerAppValues => Command::ListPlayerAppValues {
                attribute: r.u8().ok_or(bad_param)?,
            },
            PduId::GetCurrentPlayerAppValue => Command::GetCurrentPlayerAppValue {
                attributes: r.counted_bytes().ok_or(bad_param)?,
            },
            PduId::SetPlayerAppValue => {
                let count = r.u8().ok_or(bad_param)?;
                let mut settings = Vec::new();
                for _ in 0..count {
                    let setting = PlayerSetting::new(
                        r.u8().ok_or(bad_param)?,
                        r.u8().ok_or(bad_param)?,
                    );
                    settings.push(setting).map_err(|_| bad_param)?;
                }
                Command::SetPlayerAppValue { settings }
            }
            PduId::GetPlayerAppAttributeText => Command::GetPlayerAppAttributeText {
                attributes: r.counted_bytes().ok_or(bad_param)?,
            },
            PduId::GetPlayerAppValueText => Command::GetPlayerAppValueText {
                attribute: r.u8().ok_or(bad_param)?,
                values: r.counted_bytes().ok_or(bad_param)?,
            },
            PduId::InformDisplayCharset => {
                let count = r.u8().ok_or(bad_param)?;
                let mut charsets = Vec::new();
                for _ in 0..count {
                    let charset = r.u16().ok_or(bad_param)?;
                    // Extra charsets beyond capacity are not needed to answer
                    charsets.push(charset).ok();
                }
                Command::InformDisplayCharset { charsets }
            }
            PduId::GetElementAttributes => {
                let identifier = r.u64().ok_or(bad_param)?;
                let count = r.u8().ok_or(bad_param)?;
                if count == 0xFF {
                    return Err(bad_param);
                }
                let mut attributes = Vec::new();
                for _ in 0..count {
                    let raw = r.u32().ok_or(bad_param)?;
                    if let Ok(id) = MediaAttributeId::try_from(raw) {
                        if !attributes.contains(&id) {
                            attributes.push(id).ok();
                        }
                    }
                }
                if count > 0 && attributes.is_empty() {
                    return Err(bad_param);
                }
                Command::GetElementAttributes {
                    identifier,
                    attributes,
                }
            }
            PduId::GetPlayStatus => Command::GetPlayStatus,
            PduId::RegisterNotification => {
                let event = r.u8().ok_or(bad_param)?;
                let event = EventId::try_from(event).map_err(|_| bad_param)?;
                let interval = r.u32().ok_or(bad_param)?;
                Command::RegisterNotification { event, interval }
            }
            PduId::RequestContinuingResponse => Command::RequestContinuingResponse {
                target: r.u8().ok_or(bad_param)?,
            },
            PduId::AbortContinuingResponse => Command::AbortContinuingResponse {
                target: r.u8().ok_or(bad_param)?,
            },
            PduId::SetAbsoluteVolume => {
                Command::SetAbsoluteVolume(r.u8().ok_or(bad_param)? & MAX_VOLUME)
            }
            PduId::Search => {
                return Err(DecodeError::new(pdu_raw, StatusCode::SearchNotSupported));
            }
            PduId::InformBatteryStatus
            | PduId::SetAddressedPlayer
            | PduId::PlayItem
            | PduId::AddToNowPlaying => {
                return Err(DecodeError::new(pdu_raw, StatusCode::InvalidCommand));
            }
        };
        Ok(command)
    }

    fn decode_response(&self, code: Code, payload: &[u8]) -> Result<DecodedResponse, DecodeError> {
        let (pdu_raw, params) = split_vendor(payload)?;
        let pdu = PduId::try_from(pdu_raw).map_err(|UnknownValue(raw)| {
            DecodeError::new(raw, StatusCode::InvalidCommand)
        })?;

        let body = match code {
            Code::NotImplemented => Err(CommandFailure::NotImplemented),
            Code::Rejected => {
                let status = params
                    .first()
                    .map_or(StatusCode::InternalError, |raw| StatusCode::from_raw(*raw));
                Err(CommandFailure::Rejected(status))
            }
            _ => {
                let response = parse_response(pdu, params).ok_or(DecodeError::new(
                    pdu_raw,
                    StatusCode::ParameterContentError,
                ))?;
                Ok(response)
            }
        };
        Ok(DecodedResponse { pdu, body })
    }

    fn encode_passthrough(&self, passthrough: PassThrough) -> Result<Payload, CodecError> {
        let (op, state) = match passthrough {
            PassThrough::Key { op, state } => (op.raw(), state),
            PassThrough::Group { state, .. } => (PassThroughOp::VendorUnique.raw(), state),
            PassThrough::Unknown { op, state } => (op, state),
        };
        let flag = match state {
            KeyState::Pressed => 0,
            KeyState::Released => KeyState::RELEASED_FLAG,
        };

        let mut w = Writer::new();
        w.u8((op & 0x7F) | flag)?;
        if let PassThrough::Group { op, .. } = passthrough {
            w.u8(5)?;
            w.u24(BLUETOOTH_SIG_COMPANY_ID)?;
            w.u16(op.raw())?;
        } else {
            w.u8(0)?;
        }
        Ok(w.buf)
    }

    fn decode_passthrough(&self, payload: &[u8]) -> Result<PassThrough, DecodeError> {
        // Pass-through errors carry the opcode in place of a PDU id
        let malformed = DecodeError::new(Opcode::PassThrough.raw(), StatusCode::InvalidCommand);
        let mut r = Reader::new(payload);
        let byte = r.u8().ok_or(malformed)?;
        let state = KeyState::from_operation_byte(byte);
        let op = byte & !KeyState::RELEASED_FLAG;
        // Operand length is optional in some stacks for plain keys
        let operands_len = r.u8().unwrap_or(0);

        if op == PassThroughOp::VendorUnique.raw() {
            if operands_len < 5 {
                return Err(malformed);
            }
            let _company = r.u24().ok_or(malformed)?;
            let vendor_op = r.u16().ok_or(malformed)?;
            return Ok(match GroupNavigation::try_from(vendor_op) {
                Ok(op) => PassThrough::Group { op, state },
                Err(_) => PassThrough::Unknown { op, state },
            });
        }

        Ok(match PassThroughOp::try_from(op) {
            Ok(op) => PassThrough::Key { op, state },
            Err(_) => PassThrough::Unknown { op, state },
        })
    }
}

/// Validate the vendor header and return the PDU id and its parameters
fn split_vendor(payload: &[u8]) -> Result<(u8, &[u8]), DecodeError> {
    if payload.len() < VENDOR_HEADER_SIZE {
        let pdu = payload.get(3).copied().unwrap_or(0);
        return Err(DecodeError::new(pdu, StatusCode::InvalidCommand));
    }
    let mut r = Reader::new(payload);
    let company = r.u24().unwrap_or(0);
    let pdu = r.u8().unwrap_or(0);
    let _packet_type = r.u8();
    let length = usize::from(r.u16().unwrap_or(0));

    if company != BLUETOOTH_SIG_COMPANY_ID {
        return Err(DecodeError::new(pdu, StatusCode::InvalidCommand));
    }
    let params = r.rest();
    if params.len() < length {
        return Err(DecodeError::new(pdu, StatusCode::InvalidCommand));
    }
    Ok((pdu, &params[..length]))
}

fn parse_response(pdu: PduId, params: &[u8]) -> Option<Response> {
    let mut r = Reader::new(params);
    let response = match pdu {
        PduId::GetCapabilities => {
            let capability = CapabilityId::try_from(r.u8()?).ok()?;
            let count = r.u8()?;
            match capability {
                CapabilityId::CompanyId => {
                    let mut ids = Vec::new();
                    for _ in 0..count {
                        let id = r.u24()?;
                        ids.push(id).ok();
                    }
                    Response::CompanyIds(ids)
                }
                CapabilityId::EventsSupported => {
                    let mut events = Vec::new();
                    for _ in 0..count {
                        if let Ok(event) = EventId::try_from(r.u8()?) {
                            events.push(event).ok();
                        }
                    }
                    Response::EventsSupported(events)
                }
            }
        }
        PduId::ListPlayerAppAttributes => Response::PlayerAppAttributes(r.counted_bytes()?),
        PduId::ListPlayerAppValues => Response::PlayerAppValues(r.counted_bytes()?),
        PduId::GetCurrentPlayerAppValue => Response::CurrentPlayerAppValues(r.settings()?),
        PduId::GetPlayerAppAttributeText => Response::PlayerAppAttributeText(r.setting_texts()?),
        PduId::GetPlayerAppValueText => Response::PlayerAppValueText(r.setting_texts()?),
        PduId::GetElementAttributes => {
            let count = r.u8()?;
            let mut attributes = Vec::new();
            for _ in 0..count {
                let id = r.u32()?;
                let charset = r.u16()?;
                let len = usize::from(r.u16()?);
                let value = r.bytes(len)?;
                if let Ok(id) = MediaAttributeId::try_from(id) {
                    attributes
                        .push(ElementAttribute {
                            id,
                            charset,
                            value: crate::packets::truncated(value),
                        })
                        .ok();
                }
            }
            Response::ElementAttributes(attributes)
        }
        PduId::GetPlayStatus => Response::PlayStatus {
            length: r.u32()?,
            position: r.u32()?,
            status: PlaybackStatus::from_raw(r.u8()?),
        },
        PduId::RegisterNotification => Response::Notification(r.notification()?),
        PduId::SetAbsoluteVolume => Response::AbsoluteVolume(r.u8()? & MAX_VOLUME),
        PduId::SetPlayerAppValue
        | PduId::InformDisplayCharset
        | PduId::InformBatteryStatus
        | PduId::RequestContinuingResponse
        | PduId::AbortContinuingResponse
        | PduId::SetAddressedPlayer
        | PduId::PlayItem
        | PduId::Search
        | PduId::AddToNowPlaying => Response::Accepted(pdu),
    };
    Some(response)
}

/// Big-endian cursor over a parameter block
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn rest(&self) -> &'a [u8] {
        self.buf
    }

    fn bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.buf.len() < n {
            return None;
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Some(head)
    }

    fn u8(&mut self) -> Option<u8> {
        let (&byte, tail) = self.buf.split_first()?;
        self.buf = tail;
        Some(byte)
    }

    fn u16(&mut self) -> Option<u16> {
        self.bytes(2)
            .and_then(|b| b.try_into().ok())
            .map(u16::from_be_bytes)
    }

    fn u24(&mut self) -> Option<u32> {
        self.bytes(3)
            .map(|b| u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    fn u32(&mut self) -> Option<u32> {
        self.bytes(4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_be_bytes)
    }

    fn u64(&mut self) -> Option<u64> {
        self.bytes(8)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_be_bytes)
    }

    /// Count byte followed by that many one-byte ids
    fn counted_bytes<const N: usize>(&mut self) -> Option<Vec<u8, N>> {
        let count = usize::from(self.u8()?);
        let ids = self.bytes(count)?;
        Some(crate::packets::truncated(ids))
    }

    fn settings<const N: usize>(&mut self) -> Option<Vec<PlayerSetting, N>> {
        let count = self.u8()?;
        let mut settings = Vec::new();
        for _ in 0..count {
            let setting = PlayerSetting::new(self.u8()?, self.u8()?);
            settings.push(setting).ok();
        }
        Some(settings)
    }

    fn setting_texts<const N: usize>(&mut self) -> Option<Vec<SettingText, N>> {
        let count = self.u8()?;
        let mut texts = Vec::new();
        for _ in 0..count {
            let id = self.u8()?;
            let charset = self.u16()?;
            let len = usize::from(self.u8()?);
            let text = self.bytes(len)?;
            texts
                .push(SettingText {
                    id,
                    charset,
                    text: crate::packets::truncated(text),
                })
                .ok();
        }
        Some(texts)
    }

    fn notification(&mut self) -> Option<Notification> {
        let event = EventId::try_from(self.u8()?).ok()?;
        Some(match event {
            EventId::PlaybackStatusChanged => {
                Notification::PlaybackStatusChanged(PlaybackStatus::from_raw(self.u8()?))
            }
            EventId::TrackChanged => Notification::TrackChanged(self.u64()?),
            EventId::TrackReachedEnd => Notification::TrackReachedEnd,
            EventId::TrackReachedStart => Notification::TrackReachedStart,
            EventId::PlaybackPosChanged => Notification::PlaybackPosChanged(self.u32()?),
            EventId::BatteryStatusChanged => Notification::BatteryStatusChanged(self.u8()?),
            EventId::SystemStatusChanged => Notification::SystemStatusChanged(self.u8()?),
            EventId::PlayerAppSettingChanged => {
                Notification::PlayerAppSettingChanged(self.settings()?)
            }
            EventId::NowPlayingContentChanged => Notification::NowPlayingContentChanged,
            EventId::AvailablePlayersChanged => Notification::AvailablePlayersChanged,
            EventId::AddressedPlayerChanged => Notification::AddressedPlayerChanged {
                player_id: self.u16()?,
                uid_counter: self.u16()?,
            },
            EventId::UidsChanged => Notification::UidsChanged(self.u16()?),
            EventId::VolumeChanged => Notification::VolumeChanged(self.u8()? & MAX_VOLUME),
        })
    }
}

/// Big-endian payload builder
struct Writer {
    buf: Payload,
}

impl Writer {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Start a vendor-dependent payload with a zero length placeholder
    fn vendor(pdu: u8) -> Result<Self, CodecError> {
        let mut w = Self::new();
        w.u24(BLUETOOTH_SIG_COMPANY_ID)?;
        w.u8(pdu)?;
        w.u8(0)?;
        w.u16(0)?;
        Ok(w)
    }

    fn finish(mut self) -> Result<Payload, CodecError> {
        let length = u16::try_from(self.buf.len() - VENDOR_HEADER_SIZE)
            .map_err(|_| CodecError::PayloadTooLarge)?;
        self.buf[5..VENDOR_HEADER_SIZE].copy_from_slice(&length.to_be_bytes());
        Ok(self.buf)
    }

    fn bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.buf
            .extend_from_slice(bytes)
            .map_err(|()| CodecError::PayloadTooLarge)
    }

    fn u8(&mut self, value: u8) -> Result<(), CodecError> {
        self.buf.push(value).map_err(|_| CodecError::PayloadTooLarge)
    }

    fn count(&mut self, len: usize) -> Result<(), CodecError> {
        self.u8(u8::try_from(len).map_err(|_| CodecError::InvalidParameter)?)
    }

    fn u16(&mut self, value: u16) -> Result<(), CodecError> {
        self.bytes(&value.to_be_bytes())
    }

    fn u24(&mut self, value: u32) -> Result<(), CodecError> {
        self.bytes(&value.to_be_bytes()[1..])
    }

    fn u32(&mut self, value: u32) -> Result<(), CodecError> {
        self.bytes(&value.to_be_bytes())
    }

    fn u64(&mut self, value: u64) -> Result<(), CodecError> {
        self.bytes(&value.to_be_bytes())
    }

    fn setting_texts(&mut self, texts: &[SettingText]) -> Result<(), CodecError> {
        self.count(texts.len())?;
        for text in texts {
            self.u8(text.id)?;
            self.u16(text.charset)?;
            self.count(text.text.len())?;
            self.bytes(&text.text)?;
        }
        Ok(())
    }

    fn notification(&mut self, notification: &Notification) -> Result<(), CodecError> {
        self.u8(notification.event_id().raw())?;
        match notification {
            Notification::PlaybackStatusChanged(status) => self.u8(*status as u8),
            Notification::TrackChanged(track) => self.u64(*track),
            Notification::TrackReachedEnd
            | Notification::TrackReachedStart
            | Notification::NowPlayingContentChanged
            | Notification::AvailablePlayersChanged => Ok(()),
            Notification::PlaybackPosChanged(position) => self.u32(*position),
            Notification::BatteryStatusChanged(status)
            | Notification::SystemStatusChanged(status) => self.u8(*status),
            Notification::PlayerAppSettingChanged(settings) => {
                self.count(settings.len())?;
                for setting in settings {
                    self.u8(setting.attribute)?;
                    self.u8(setting.value)?;
                }
                Ok(())
            }
            Notification::AddressedPlayerChanged {
                player_id,
                uid_counter,
            } => {
                self.u16(*player_id)?;
                self.u16(*uid_counter)
            }
            Notification::UidsChanged(counter) => self.u16(*counter),
            Notification::VolumeChanged(volume) => self.u8(volume & MAX_VOLUME),
        }
    }
}

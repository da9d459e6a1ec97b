//! Message dispatch: header + typed payload.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::command::CommandBody;
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{Result, WireError};
use crate::header::{MessageHeader, HEADER_SIZE};
use crate::object::ScanDataObjects;
use crate::scan::ScanDataPoints;
use crate::status::ErrorWarning;
use crate::time::NtpTime;
use crate::types::DataType;

/// Largest body the 32-bit size field can describe.
pub const MAX_BODY_SIZE: usize = u32::MAX as usize;

/// Typed message body, one variant per data type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Payload {
    Command(CommandBody),
    Reply(CommandBody),
    ScanData(ScanDataPoints),
    ObjectData(ScanDataObjects),
    ErrorWarning(ErrorWarning),
    /// Vehicle data layouts vary per sensor variant and are passed through as-is.
    VehicleData(Bytes),
    /// Data type this crate does not know. Known data types are rejected on
    /// encode.
    Unknown { data_type: u16, data: Bytes },
}

impl Payload {
    /// Raw data type tag for the frame header.
    pub fn data_type_tag(&self) -> u16 {
        match self {
            Self::Command(_) => DataType::CommandData.as_u16(),
            Self::Reply(_) => DataType::ReplyData.as_u16(),
            Self::ScanData(_) => DataType::ScanData.as_u16(),
            Self::ObjectData(_) => DataType::ObjectData.as_u16(),
            Self::ErrorWarning(_) => DataType::ErrorWarningData.as_u16(),
            Self::VehicleData(_) => DataType::VehicleData.as_u16(),
            Self::Unknown { data_type, .. } => *data_type,
        }
    }

    /// Data type tag for the header, or `None` for [`Payload::Unknown`].
    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_u16(self.data_type_tag())
    }

    /// Decode a body according to its header's data type.
    ///
    /// Fixed-layout payloads must consume the body exactly; leftover bytes are
    /// reported as [`WireError::LengthMismatch`].
    pub fn decode(data_type: u16, body: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(body);
        let payload = match DataType::from_u16(data_type) {
            Some(DataType::CommandData) => Self::Command(CommandBody::decode(&mut reader)?),
            Some(DataType::ReplyData) => Self::Reply(CommandBody::decode(&mut reader)?),
            Some(DataType::ScanData) => Self::ScanData(ScanDataPoints::decode(&mut reader)?),
            Some(DataType::ObjectData) => Self::ObjectData(ScanDataObjects::decode(&mut reader)?),
            Some(DataType::ErrorWarningData) => {
                Self::ErrorWarning(ErrorWarning::decode(&mut reader)?)
            }
            Some(DataType::VehicleData) => {
                Self::VehicleData(Bytes::copy_from_slice(reader.read_rest()))
            }
            None => {
                debug!(data_type, len = body.len(), "passing through unknown data type");
                Self::Unknown {
                    data_type,
                    data: Bytes::copy_from_slice(reader.read_rest()),
                }
            }
        };

        if !reader.is_empty() {
            return Err(WireError::LengthMismatch {
                declared: body.len(),
                consumed: reader.position(),
            });
        }
        Ok(payload)
    }

    /// Encode the body.
    ///
    /// [`Payload::Unknown`] with a data type this crate decodes is rejected
    /// with [`WireError::AmbiguousRaw`]; use the typed variant instead.
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        match self {
            Self::Unknown { data_type, .. } if DataType::from_u16(*data_type).is_some() => {
                Err(WireError::AmbiguousRaw {
                    record: "payload",
                    tag: *data_type,
                })
            }
            Self::Command(body) | Self::Reply(body) => body.encode(writer),
            Self::ScanData(scan) => scan.encode(writer),
            Self::ObjectData(objects) => objects.encode(writer),
            Self::ErrorWarning(record) => record.encode(writer),
            Self::VehicleData(data) | Self::Unknown { data, .. } => writer.write_bytes(data),
        }
    }
}

/// A decoded message.
///
/// Framing fields (magic word, sizes, reserved byte) are not part of the
/// message; they are recomputed on encode and available from [`Frame::header`]
/// on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub device_id: u8,
    pub ntp_time: NtpTime,
    pub payload: Payload,
}

impl Message {
    pub fn new(device_id: u8, ntp_time: NtpTime, payload: Payload) -> Self {
        Self {
            device_id,
            ntp_time,
            payload,
        }
    }

    /// Outbound command with a zero timestamp.
    pub fn command(device_id: u8, body: CommandBody) -> Self {
        Self::new(device_id, NtpTime::default(), Payload::Command(body))
    }

    /// Build a message from a header and the body that followed it.
    pub fn from_parts(header: &MessageHeader, body: &[u8]) -> Result<Self> {
        if body.len() != header.message_size as usize {
            return Err(WireError::LengthMismatch {
                declared: header.message_size as usize,
                consumed: body.len(),
            });
        }
        Ok(Self {
            device_id: header.device_id,
            ntp_time: header.ntp_time,
            payload: Payload::decode(header.data_type, body)?,
        })
    }

    /// Encode into a frame whose header records `previous_size` as the size of
    /// the frame sent before it (0 for the first frame of a session).
    pub fn to_frame(&self, previous_size: u32) -> Result<Frame> {
        let mut writer = ByteWriter::with_limit(MAX_BODY_SIZE);
        self.payload.encode(&mut writer)?;
        let body = writer.freeze();
        let message_size = u32::try_from(body.len()).map_err(|_| WireError::PayloadTooLarge {
            size: body.len(),
            max: MAX_BODY_SIZE,
        })?;
        let header = MessageHeader::new(
            self.payload.data_type_tag(),
            self.device_id,
            self.ntp_time,
            message_size,
            previous_size,
        );
        Ok(Frame { header, body })
    }
}

/// One complete header + body unit as found on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: MessageHeader,
    pub body: Bytes,
}

impl Frame {
    pub fn new(header: MessageHeader, body: impl Into<Bytes>) -> Self {
        Self {
            header,
            body: body.into(),
        }
    }

    /// Total wire size (header + body).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.header.data_type()
    }

    /// Decode the typed message carried by this frame.
    pub fn decode(&self) -> Result<Message> {
        Message::from_parts(&self.header, &self.body)
    }

    /// Append header and body to `dst`.
    pub fn write_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.wire_size());
        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.body);
    }

    /// Header and body as one contiguous buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        self.write_to(&mut dst);
        dst.freeze()
    }
}

/// Decode one complete frame held in `bytes`.
pub fn decode_frame(bytes: &[u8]) -> Result<Message> {
    let mut reader = ByteReader::new(bytes);
    let header = MessageHeader::decode(&mut reader)?;
    let declared = header.message_size as usize;
    let body = reader.read_bytes(declared)?;
    if !reader.is_empty() {
        return Err(WireError::LengthMismatch {
            declared,
            consumed: bytes.len() - HEADER_SIZE,
        });
    }
    Message::from_parts(&header, body)
}

/// Encode `message` as a complete frame.
pub fn encode_message(message: &Message, previous_size: u32) -> Result<Bytes> {
    Ok(message.to_frame(previous_size)?.to_bytes())
}

/// Encodes a session's outbound messages, chaining each frame's
/// `PreviousMessagesSize` to the frame before it.
#[derive(Debug, Default, Clone)]
pub struct MessageEncoder {
    previous_size: u32,
}

impl MessageEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size recorded for the last frame produced, 0 before the first.
    pub fn previous_size(&self) -> u32 {
        self.previous_size
    }

    /// Encode `message` chained onto the last frame this encoder produced.
    pub fn encode_frame(&mut self, message: &Message) -> Result<Frame> {
        let frame = message.to_frame(self.previous_size)?;
        // frame sizes above u32::MAX cannot be described by the next header
        self.previous_size = u32::try_from(frame.wire_size()).unwrap_or(u32::MAX);
        Ok(frame)
    }

    /// Like [`MessageEncoder::encode_frame`], returning the wire bytes.
    pub fn encode(&mut self, message: &Message) -> Result<Bytes> {
        Ok(self.encode_frame(message)?.to_bytes())
    }

    /// Start a new session.
    pub fn reset(&mut self) {
        self.previous_size = 0;
    }
}

//! Command and reply bodies.
//!
//! Both `CommandData` and `ReplyData` frames start with a 16-bit command tag
//! followed by command-specific data. Data that does not have the shape its tag
//! implies is kept as [`CommandBody::Raw`] so nothing is lost.

use bytes::Bytes;
use tracing::debug;

use crate::cursor::{ByteOrder, ByteReader, ByteWriter};
use crate::error::{Result, WireError};
use crate::status::{StatusMessage, STATUS_SIZE};
use crate::time::NtpTime;
use crate::types::{Command, ParameterIndex};

const ORDER: ByteOrder = ByteOrder::Little;

/// Size of one [`Parameter`] record.
pub const PARAMETER_SIZE: usize = 6;

/// One parameter index/value pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    /// Raw index; see [`ParameterIndex`].
    pub index: u16,
    pub value: u32,
}

impl Parameter {
    /// Pair a known index with its value.
    pub fn new(index: ParameterIndex, value: u32) -> Self {
        Self {
            index: index.as_u16(),
            value,
        }
    }

    /// Known index, or `None` for values this crate does not name.
    pub fn parameter_index(&self) -> Option<ParameterIndex> {
        ParameterIndex::from_u16(self.index)
    }

    /// Read one 6-byte index/value record.
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            index: reader.read_u16(ORDER)?,
            value: reader.read_u32(ORDER)?,
        })
    }

    /// Write the 6-byte record.
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_u16(self.index, ORDER)?;
        writer.write_u32(self.value, ORDER)
    }
}

/// Body of a command or reply frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandBody {
    Reset,
    GetStatus,
    SaveConfig,
    ResetDefaultParameters,
    StartMeasure,
    StopMeasure,
    /// `GetStatus` tag followed by a status record (the reply form).
    Status(StatusMessage),
    SetParameter(Vec<Parameter>),
    GetParameter(Vec<Parameter>),
    SetNtpTimestampSync(NtpTime),
    /// Unrecognized tag, or data that does not fit the tag's layout. A known
    /// tag with data that does fit is rejected on encode.
    Raw { command: u16, data: Bytes },
}

impl CommandBody {
    /// `SetParameter` with a single entry.
    pub fn set_parameter(index: ParameterIndex, value: u32) -> Self {
        Self::SetParameter(vec![Parameter::new(index, value)])
    }

    /// Request for one parameter; the value field is sent as zero.
    pub fn get_parameter(index: ParameterIndex) -> Self {
        Self::GetParameter(vec![Parameter::new(index, 0)])
    }

    /// `SetNtpTimestampSync` carrying `time`.
    pub fn ntp_sync(time: NtpTime) -> Self {
        Self::SetNtpTimestampSync(time)
    }

    /// Raw command tag written in front of the data.
    pub fn command_tag(&self) -> u16 {
        match self {
            Self::Reset => Command::Reset.as_u16(),
            Self::GetStatus | Self::Status(_) => Command::GetStatus.as_u16(),
            Self::SaveConfig => Command::SaveConfig.as_u16(),
            Self::ResetDefaultParameters => Command::ResetDefaultParameters.as_u16(),
            Self::StartMeasure => Command::StartMeasure.as_u16(),
            Self::StopMeasure => Command::StopMeasure.as_u16(),
            Self::SetParameter(_) => Command::SetParameter.as_u16(),
            Self::GetParameter(_) => Command::GetParameter.as_u16(),
            Self::SetNtpTimestampSync(_) => Command::SetNtpTimestampSync.as_u16(),
            Self::Raw { command, .. } => *command,
        }
    }

    /// Known command, or `None` for unrecognized tags.
    pub fn command(&self) -> Option<Command> {
        Command::from_u16(self.command_tag())
    }

    /// Decode a whole command/reply body. Consumes the reader.
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let tag = reader.read_u16(ORDER)?;
        let data_len = reader.remaining();

        let command = Command::from_u16(tag).filter(|cmd| has_typed_layout(*cmd, data_len));
        let body = match command {
            Some(Command::Reset) => Self::Reset,
            Some(Command::GetStatus) if data_len == 0 => Self::GetStatus,
            Some(Command::GetStatus) => Self::Status(StatusMessage::decode(reader)?),
            Some(Command::SaveConfig) => Self::SaveConfig,
            Some(Command::ResetDefaultParameters) => Self::ResetDefaultParameters,
            Some(Command::StartMeasure) => Self::StartMeasure,
            Some(Command::StopMeasure) => Self::StopMeasure,
            Some(Command::SetParameter) => Self::SetParameter(decode_parameters(reader)?),
            Some(Command::GetParameter) => Self::GetParameter(decode_parameters(reader)?),
            Some(Command::SetNtpTimestampSync) => {
                Self::SetNtpTimestampSync(NtpTime(reader.read_u64(ORDER)?))
            }
            None => {
                debug!(
                    command = tag,
                    known = Command::from_u16(tag).is_some(),
                    data_len,
                    "keeping command body as raw bytes"
                );
                Self::Raw {
                    command: tag,
                    data: Bytes::copy_from_slice(reader.read_rest()),
                }
            }
        };
        Ok(body)
    }

    /// Encode tag and data.
    ///
    /// A [`CommandBody::Raw`] whose tag and data length match a typed layout
    /// is rejected with [`WireError::AmbiguousRaw`]: it would decode as the
    /// typed variant.
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        if let Self::Raw { command, data } = self {
            let typed = Command::from_u16(*command)
                .is_some_and(|cmd| has_typed_layout(cmd, data.len()));
            if typed {
                return Err(WireError::AmbiguousRaw {
                    record: "command",
                    tag: *command,
                });
            }
        }
        writer.write_u16(self.command_tag(), ORDER)?;
        match self {
            Self::Reset
            | Self::GetStatus
            | Self::SaveConfig
            | Self::ResetDefaultParameters
            | Self::StartMeasure
            | Self::StopMeasure => Ok(()),
            Self::Status(status) => status.encode(writer),
            Self::SetParameter(params) | Self::GetParameter(params) => {
                for param in params {
                    param.encode(writer)?;
                }
                Ok(())
            }
            Self::SetNtpTimestampSync(time) => writer.write_u64(time.0, ORDER),
            Self::Raw { data, .. } => writer.write_bytes(data),
        }
    }
}

/// Whether `data_len` bytes after `command` decode as a typed variant.
fn has_typed_layout(command: Command, data_len: usize) -> bool {
    match command {
        Command::Reset
        | Command::SaveConfig
        | Command::ResetDefaultParameters
        | Command::StartMeasure
        | Command::StopMeasure => data_len == 0,
        Command::GetStatus => data_len == 0 || data_len == STATUS_SIZE,
        Command::SetParameter | Command::GetParameter => data_len % PARAMETER_SIZE == 0,
        Command::SetNtpTimestampSync => data_len == 8,
    }
}

fn decode_parameters(reader: &mut ByteReader<'_>) -> Result<Vec<Parameter>> {
    let mut params = Vec::with_capacity(reader.remaining() / PARAMETER_SIZE);
    while !reader.is_empty() {
        params.push(Parameter::decode(reader)?);
    }
    Ok(params)
}

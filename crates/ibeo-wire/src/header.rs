use crate::cursor::{ByteOrder, ByteReader, ByteWriter};
use crate::error::{Result, WireError};
use crate::time::NtpTime;
use crate::types::DataType;

/// Magic word that starts every frame.
pub const MAGIC_WORD: u32 = 0xAFFE_C0C2;

/// Magic word as it appears on the wire.
pub const MAGIC_BYTES: [u8; 4] = MAGIC_WORD.to_be_bytes();

/// Frame header size in bytes.
pub const HEADER_SIZE: usize = 24;

const ORDER: ByteOrder = ByteOrder::Big;

/// Frame header. Always transferred in network byte order.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────────┬─────────────┬──────────┬──────────┬──────────┬──────────┐
/// │ Magic (4B) │ PrevSize (4B)│ MsgSize (4B)│ Rsvd (1B)│ Dev (1B) │ Type (2B)│ NTP (8B) │
/// │ AF FE C0 C2│ prev frame   │ body only   │          │          │          │          │
/// └────────────┴──────────────┴─────────────┴──────────┴──────────┴──────────┴──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageHeader {
    pub magic_word: u32,
    /// Total size (header + body) of the frame sent before this one.
    pub previous_message_size: u32,
    /// Body size, excluding this header.
    pub message_size: u32,
    pub reserved: u8,
    pub device_id: u8,
    pub data_type: u16,
    pub ntp_time: NtpTime,
}

impl MessageHeader {
    /// Build a header for a body of `message_size` bytes.
    pub fn new(
        data_type: u16,
        device_id: u8,
        ntp_time: NtpTime,
        message_size: u32,
        previous_message_size: u32,
    ) -> Self {
        Self {
            magic_word: MAGIC_WORD,
            previous_message_size,
            message_size,
            reserved: 0,
            device_id,
            data_type,
            ntp_time,
        }
    }

    /// Known data type, or `None` for tags this crate does not decode.
    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_u16(self.data_type)
    }

    /// Header plus body size.
    pub fn frame_size(&self) -> usize {
        HEADER_SIZE + self.message_size as usize
    }

    /// Read a header, rejecting anything that does not start with the magic word.
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let magic_word = reader.read_u32(ORDER)?;
        if magic_word != MAGIC_WORD {
            return Err(WireError::InvalidMagicWord { found: magic_word });
        }
        Ok(Self {
            magic_word,
            previous_message_size: reader.read_u32(ORDER)?,
            message_size: reader.read_u32(ORDER)?,
            reserved: reader.read_u8()?,
            device_id: reader.read_u8()?,
            data_type: reader.read_u16(ORDER)?,
            ntp_time: NtpTime(reader.read_u64(ORDER)?),
        })
    }

    /// Write all 24 bytes, magic word included, in network byte order.
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_u32(self.magic_word, ORDER)?;
        writer.write_u32(self.previous_message_size, ORDER)?;
        writer.write_u32(self.message_size, ORDER)?;
        writer.write_u8(self.reserved)?;
        writer.write_u8(self.device_id)?;
        writer.write_u16(self.data_type, ORDER)?;
        writer.write_u64(self.ntp_time.0, ORDER)
    }

    /// Same bytes as [`MessageHeader::encode`], without a writer.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic_word.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.previous_message_size.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.message_size.to_be_bytes());
        bytes[12] = self.reserved;
        bytes[13] = self.device_id;
        bytes[14..16].copy_from_slice(&self.data_type.to_be_bytes());
        bytes[16..24].copy_from_slice(&self.ntp_time.0.to_be_bytes());
        bytes
    }
}

/// Decode the header at the start of `bytes`.
pub fn decode_header(bytes: &[u8]) -> Result<MessageHeader> {
    MessageHeader::decode(&mut ByteReader::new(bytes))
}

/// Encode `header` as its 24 wire bytes.
pub fn encode_header(header: &MessageHeader) -> [u8; HEADER_SIZE] {
    header.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MessageHeader {
        MessageHeader::new(
            DataType::ScanData.as_u16(),
            7,
            NtpTime(0x0102_0304_0506_0708),
            1234,
            56,
        )
    }

    #[test]
    fn header_is_big_endian() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[0..4], &[0xAF, 0xFE, 0xC0, 0xC2]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 56]);
        assert_eq!(&bytes[8..12], &[0, 0, 0x04, 0xD2]);
        assert_eq!(bytes[13], 7);
        assert_eq!(&bytes[14..16], &[0x22, 0x02]);
        assert_eq!(&bytes[16..24], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn encode_matches_to_bytes() {
        let header = sample();
        let mut writer = ByteWriter::new();
        header.encode(&mut writer).unwrap();
        assert_eq!(writer.freeze().as_ref(), &header.to_bytes());
    }

    #[test]
    fn decode_reads_back_fields() {
        let header = sample();
        let decoded = decode_header(&encode_header(&header)).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.data_type(), Some(DataType::ScanData));
        assert_eq!(decoded.frame_size(), HEADER_SIZE + 1234);
    }

    #[test]
    fn zero_magic_is_rejected() {
        let mut bytes = sample().to_bytes();
        bytes[0..4].copy_from_slice(&[0, 0, 0, 0]);
        assert_eq!(
            decode_header(&bytes).unwrap_err(),
            WireError::InvalidMagicWord { found: 0 }
        );
    }

    #[test]
    fn short_header_is_out_of_bounds() {
        let bytes = sample().to_bytes();
        assert!(matches!(
            decode_header(&bytes[..HEADER_SIZE - 1]),
            Err(WireError::OutOfBounds { .. })
        ));
    }
}

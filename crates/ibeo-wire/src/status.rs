//! Fixed-size health records: sensor status and error/warning registers.

use crate::cursor::{ByteOrder, ByteReader, ByteWriter};
use crate::error::Result;

const ORDER: ByteOrder = ByteOrder::Little;

/// Size of [`StatusMessage`] on the wire.
pub const STATUS_SIZE: usize = 30;

/// Size of [`ErrorWarning`] on the wire.
pub const ERROR_WARNING_SIZE: usize = 16;

/// Sensor health snapshot, returned in reply to `GetStatus`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusMessage {
    pub firmware_version: u16,
    pub fpga_version: u16,
    pub scanner_status: u16,
    pub reserved1: u32,
    pub temperature: u16,
    pub serial_number0: u16,
    pub serial_number1: u16,
    pub reserved2: u16,
    pub fpga_timestamp: [u16; 3],
    pub dsp_timestamp: [u16; 3],
}

impl StatusMessage {
    /// Read one 30-byte status record.
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            firmware_version: reader.read_u16(ORDER)?,
            fpga_version: reader.read_u16(ORDER)?,
            scanner_status: reader.read_u16(ORDER)?,
            reserved1: reader.read_u32(ORDER)?,
            temperature: reader.read_u16(ORDER)?,
            serial_number0: reader.read_u16(ORDER)?,
            serial_number1: reader.read_u16(ORDER)?,
            reserved2: reader.read_u16(ORDER)?,
            fpga_timestamp: read_triplet(reader)?,
            dsp_timestamp: read_triplet(reader)?,
        })
    }

    /// Write the 30-byte record.
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_u16(self.firmware_version, ORDER)?;
        writer.write_u16(self.fpga_version, ORDER)?;
        writer.write_u16(self.scanner_status, ORDER)?;
        writer.write_u32(self.reserved1, ORDER)?;
        writer.write_u16(self.temperature, ORDER)?;
        writer.write_u16(self.serial_number0, ORDER)?;
        writer.write_u16(self.serial_number1, ORDER)?;
        writer.write_u16(self.reserved2, ORDER)?;
        write_words(writer, &self.fpga_timestamp)?;
        write_words(writer, &self.dsp_timestamp)
    }
}

/// Error and warning registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorWarning {
    pub error_register1: u16,
    pub error_register2: u16,
    pub warning_register1: u16,
    pub warning_register2: u16,
    pub reserved: [u16; 4],
}

impl ErrorWarning {
    /// True when any error bit is set.
    pub fn has_errors(&self) -> bool {
        self.error_register1 != 0 || self.error_register2 != 0
    }

    /// True when any warning bit is set.
    pub fn has_warnings(&self) -> bool {
        self.warning_register1 != 0 || self.warning_register2 != 0
    }

    /// Read the 16-byte register block.
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            error_register1: reader.read_u16(ORDER)?,
            error_register2: reader.read_u16(ORDER)?,
            warning_register1: reader.read_u16(ORDER)?,
            warning_register2: reader.read_u16(ORDER)?,
            reserved: [
                reader.read_u16(ORDER)?,
                reader.read_u16(ORDER)?,
                reader.read_u16(ORDER)?,
                reader.read_u16(ORDER)?,
            ],
        })
    }

    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_u16(self.error_register1, ORDER)?;
        writer.write_u16(self.error_register2, ORDER)?;
        writer.write_u16(self.warning_register1, ORDER)?;
        writer.write_u16(self.warning_register2, ORDER)?;
        write_words(writer, &self.reserved)
    }
}

fn read_triplet(reader: &mut ByteReader<'_>) -> Result<[u16; 3]> {
    Ok([
        reader.read_u16(ORDER)?,
        reader.read_u16(ORDER)?,
        reader.read_u16(ORDER)?,
    ])
}

fn write_words(writer: &mut ByteWriter, words: &[u16]) -> Result<()> {
    for word in words {
        writer.write_u16(*word, ORDER)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WireError;

    fn status() -> StatusMessage {
        StatusMessage {
            firmware_version: 0x1234,
            fpga_version: 0x5678,
            scanner_status: 0x0003,
            reserved1: 0xDEAD_BEEF,
            temperature: 0x0FA0,
            serial_number0: 0x0A0B,
            serial_number1: 0x0C0D,
            reserved2: 0,
            fpga_timestamp: [1, 2, 3],
            dsp_timestamp: [4, 5, 6],
        }
    }

    #[test]
    fn status_layout_is_packed_little_endian() {
        let mut writer = ByteWriter::new();
        status().encode(&mut writer).unwrap();
        let bytes = writer.freeze();

        assert_eq!(bytes.len(), STATUS_SIZE);
        assert_eq!(&bytes[0..2], &[0x34, 0x12]);
        // reserved1 sits right after scanner_status with no padding
        assert_eq!(&bytes[6..10], &[0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(&bytes[18..20], &[0x01, 0x00]);
        assert_eq!(&bytes[28..30], &[0x06, 0x00]);

        let decoded = StatusMessage::decode(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(decoded, status());
    }

    #[test]
    fn short_status_is_out_of_bounds() {
        let bytes = [0u8; STATUS_SIZE - 2];
        let err = StatusMessage::decode(&mut ByteReader::new(&bytes)).unwrap_err();
        assert!(matches!(err, WireError::OutOfBounds { .. }));
    }

    #[test]
    fn error_warning_flags() {
        let record = ErrorWarning {
            warning_register2: 0x0040,
            ..ErrorWarning::default()
        };
        assert!(!record.has_errors());
        assert!(record.has_warnings());

        let mut writer = ByteWriter::new();
        record.encode(&mut writer).unwrap();
        let bytes = writer.freeze();
        assert_eq!(bytes.len(), ERROR_WARNING_SIZE);
        assert_eq!(&bytes[6..8], &[0x40, 0x00]);
    }
}

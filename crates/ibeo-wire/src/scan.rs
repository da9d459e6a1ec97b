//! Scan data: one rotation's worth of echo measurements.

use std::f64::consts::TAU;

use crate::cursor::{ByteOrder, ByteReader, ByteWriter};
use crate::error::{Result, WireError};
use crate::time::NtpTime;

const ORDER: ByteOrder = ByteOrder::Little;

/// Size of the scan data header, including the point count.
pub const SCAN_HEADER_SIZE: usize = 44;

/// Size of one [`ScanPoint`].
pub const SCAN_POINT_SIZE: usize = 10;

/// Scan metadata. The point count is implied by [`ScanDataPoints::points`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanDataHeader {
    pub scan_number: u16,
    pub scanner_status: u16,
    pub sync_phase_offset: u16,
    pub scan_start_time: NtpTime,
    pub scan_end_time: NtpTime,
    pub angle_ticks_per_rotation: u16,
    pub start_angle: i16,
    pub end_angle: i16,
    pub mount_yaw: i16,
    pub mount_pitch: i16,
    pub mount_roll: i16,
    pub mount_x: i16,
    pub mount_y: i16,
    pub mount_z: i16,
    pub flags: u16,
}

/// One echo measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanPoint {
    /// Layer in the low nibble, echo number in the high nibble.
    pub layer_echo: u8,
    pub flags: u8,
    /// Angle in ticks; see [`ScanDataHeader::angle_ticks_per_rotation`].
    pub horizontal_angle: i16,
    pub radial_distance: u16,
    pub echo_pulse_width: u16,
    pub reserved: u16,
}

impl ScanPoint {
    /// Scan layer, 0 to 3.
    pub fn layer(&self) -> u8 {
        self.layer_echo & 0x0F
    }

    /// Echo number within the layer.
    pub fn echo(&self) -> u8 {
        self.layer_echo >> 4
    }

    /// Horizontal angle in radians, or `None` when the resolution is unset.
    pub fn angle_radians(&self, ticks_per_rotation: u16) -> Option<f64> {
        if ticks_per_rotation == 0 {
            return None;
        }
        Some(f64::from(self.horizontal_angle) * TAU / f64::from(ticks_per_rotation))
    }

    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            layer_echo: reader.read_u8()?,
            flags: reader.read_u8()?,
            horizontal_angle: reader.read_i16(ORDER)?,
            radial_distance: reader.read_u16(ORDER)?,
            echo_pulse_width: reader.read_u16(ORDER)?,
            reserved: reader.read_u16(ORDER)?,
        })
    }

    fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_u8(self.layer_echo)?;
        writer.write_u8(self.flags)?;
        writer.write_i16(self.horizontal_angle, ORDER)?;
        writer.write_u16(self.radial_distance, ORDER)?;
        writer.write_u16(self.echo_pulse_width, ORDER)?;
        writer.write_u16(self.reserved, ORDER)
    }
}

/// Scan header plus its points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanDataPoints {
    pub header: ScanDataHeader,
    pub points: Vec<ScanPoint>,
}

impl ScanDataPoints {
    /// Decode the header, then exactly as many points as it declares.
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let scan_number = reader.read_u16(ORDER)?;
        let scanner_status = reader.read_u16(ORDER)?;
        let sync_phase_offset = reader.read_u16(ORDER)?;
        let scan_start_time = NtpTime(reader.read_u64(ORDER)?);
        let scan_end_time = NtpTime(reader.read_u64(ORDER)?);
        let angle_ticks_per_rotation = reader.read_u16(ORDER)?;
        let start_angle = reader.read_i16(ORDER)?;
        let end_angle = reader.read_i16(ORDER)?;
        let point_count = usize::from(reader.read_u16(ORDER)?);
        let header = ScanDataHeader {
            scan_number,
            scanner_status,
            sync_phase_offset,
            scan_start_time,
            scan_end_time,
            angle_ticks_per_rotation,
            start_angle,
            end_angle,
            mount_yaw: reader.read_i16(ORDER)?,
            mount_pitch: reader.read_i16(ORDER)?,
            mount_roll: reader.read_i16(ORDER)?,
            mount_x: reader.read_i16(ORDER)?,
            mount_y: reader.read_i16(ORDER)?,
            mount_z: reader.read_i16(ORDER)?,
            flags: reader.read_u16(ORDER)?,
        };

        let available = reader.remaining() / SCAN_POINT_SIZE;
        if available < point_count {
            return Err(WireError::TruncatedPayload {
                record: "scan point",
                declared: point_count,
                available,
            });
        }

        let points = (0..point_count)
            .map(|_| ScanPoint::decode(reader))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { header, points })
    }

    /// Encode the header with the point count taken from `points`.
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        let count = u16::try_from(self.points.len()).map_err(|_| WireError::TooManyRecords {
            record: "scan point",
            count: self.points.len(),
        })?;
        let h = &self.header;
        writer.write_u16(h.scan_number, ORDER)?;
        writer.write_u16(h.scanner_status, ORDER)?;
        writer.write_u16(h.sync_phase_offset, ORDER)?;
        writer.write_u64(h.scan_start_time.0, ORDER)?;
        writer.write_u64(h.scan_end_time.0, ORDER)?;
        writer.write_u16(h.angle_ticks_per_rotation, ORDER)?;
        writer.write_i16(h.start_angle, ORDER)?;
        writer.write_i16(h.end_angle, ORDER)?;
        writer.write_u16(count, ORDER)?;
        writer.write_i16(h.mount_yaw, ORDER)?;
        writer.write_i16(h.mount_pitch, ORDER)?;
        writer.write_i16(h.mount_roll, ORDER)?;
        writer.write_i16(h.mount_x, ORDER)?;
        writer.write_i16(h.mount_y, ORDER)?;
        writer.write_i16(h.mount_z, ORDER)?;
        writer.write_u16(h.flags, ORDER)?;
        for point in &self.points {
            point.encode(writer)?;
        }
        Ok(())
    }

    /// Encoded size in bytes.
    pub fn wire_size(&self) -> usize {
        SCAN_HEADER_SIZE + self.points.len() * SCAN_POINT_SIZE
    }
}

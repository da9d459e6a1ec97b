//! Object data: tracked obstacles with their contour polygons.
//!
//! Each object record is immediately followed by its contour points, so
//! records are variable-length and must be decoded strictly in sequence.

use crate::cursor::{ByteOrder, ByteReader, ByteWriter};
use crate::error::{Result, WireError};
use crate::time::NtpTime;

const ORDER: ByteOrder = ByteOrder::Little;

/// Size of the object data header, including the object count.
pub const OBJECT_HEADER_SIZE: usize = 10;

/// Size of one object record, including its contour point count but not the
/// contour itself.
pub const OBJECT_RECORD_SIZE: usize = 58;

/// Size of one [`Point2D`].
pub const POINT2D_SIZE: usize = 4;

/// Signed coordinate pair: a position, a velocity, or a contour vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point2D {
    pub x: i16,
    pub y: i16,
}

impl Point2D {
    /// Point at `(x, y)`.
    pub fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            x: reader.read_i16(ORDER)?,
            y: reader.read_i16(ORDER)?,
        })
    }

    fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_i16(self.x, ORDER)?;
        writer.write_i16(self.y, ORDER)
    }
}

/// Box extent, or the sigma of a velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size2D {
    pub width: u16,
    pub length: u16,
}

impl Size2D {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            width: reader.read_u16(ORDER)?,
            length: reader.read_u16(ORDER)?,
        })
    }

    fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_u16(self.width, ORDER)?;
        writer.write_u16(self.length, ORDER)
    }
}

/// One tracked object and its contour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackedObject {
    pub id: u16,
    pub age: u16,
    pub prediction_age: u16,
    pub relative_timestamp_ms: u16,
    pub reference_point: Point2D,
    pub reference_point_sigma: Point2D,
    pub closest_point: Point2D,
    pub bounding_box_center: Point2D,
    pub bounding_box_size: Size2D,
    pub object_box_center: Point2D,
    pub object_box_size: Size2D,
    pub object_box_orientation: i16,
    pub absolute_velocity: Point2D,
    pub absolute_velocity_sigma: Size2D,
    pub relative_velocity: Point2D,
    pub classification: u16,
    pub classification_age: u16,
    pub classification_certainty: u16,
    pub contour: Vec<Point2D>,
}

impl TrackedObject {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let mut object = Self {
            id: reader.read_u16(ORDER)?,
            age: reader.read_u16(ORDER)?,
            prediction_age: reader.read_u16(ORDER)?,
            relative_timestamp_ms: reader.read_u16(ORDER)?,
            reference_point: Point2D::decode(reader)?,
            reference_point_sigma: Point2D::decode(reader)?,
            closest_point: Point2D::decode(reader)?,
            bounding_box_center: Point2D::decode(reader)?,
            bounding_box_size: Size2D::decode(reader)?,
            object_box_center: Point2D::decode(reader)?,
            object_box_size: Size2D::decode(reader)?,
            object_box_orientation: reader.read_i16(ORDER)?,
            absolute_velocity: Point2D::decode(reader)?,
            absolute_velocity_sigma: Size2D::decode(reader)?,
            relative_velocity: Point2D::decode(reader)?,
            classification: reader.read_u16(ORDER)?,
            classification_age: reader.read_u16(ORDER)?,
            classification_certainty: reader.read_u16(ORDER)?,
            contour: Vec::new(),
        };

        let contour_count = usize::from(reader.read_u16(ORDER)?);
        let available = reader.remaining() / POINT2D_SIZE;
        if available < contour_count {
            return Err(WireError::TruncatedPayload {
                record: "contour point",
                declared: contour_count,
                available,
            });
        }
        object.contour = (0..contour_count)
            .map(|_| Point2D::decode(reader))
            .collect::<Result<Vec<_>>>()?;
        Ok(object)
    }

    fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        let contour_count =
            u16::try_from(self.contour.len()).map_err(|_| WireError::TooManyRecords {
                record: "contour point",
                count: self.contour.len(),
            })?;
        writer.write_u16(self.id, ORDER)?;
        writer.write_u16(self.age, ORDER)?;
        writer.write_u16(self.prediction_age, ORDER)?;
        writer.write_u16(self.relative_timestamp_ms, ORDER)?;
        self.reference_point.encode(writer)?;
        self.reference_point_sigma.encode(writer)?;
        self.closest_point.encode(writer)?;
        self.bounding_box_center.encode(writer)?;
        self.bounding_box_size.encode(writer)?;
        self.object_box_center.encode(writer)?;
        self.object_box_size.encode(writer)?;
        writer.write_i16(self.object_box_orientation, ORDER)?;
        self.absolute_velocity.encode(writer)?;
        self.absolute_velocity_sigma.encode(writer)?;
        self.relative_velocity.encode(writer)?;
        writer.write_u16(self.classification, ORDER)?;
        writer.write_u16(self.classification_age, ORDER)?;
        writer.write_u16(self.classification_certainty, ORDER)?;
        writer.write_u16(contour_count, ORDER)?;
        for point in &self.contour {
            point.encode(writer)?;
        }
        Ok(())
    }

    /// Encoded size including the contour.
    pub fn wire_size(&self) -> usize {
        OBJECT_RECORD_SIZE + self.contour.len() * POINT2D_SIZE
    }
}

/// Object list for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanDataObjects {
    pub scan_start_time: NtpTime,
    pub objects: Vec<TrackedObject>,
}

impl ScanDataObjects {
    /// Decode the object list, each object followed by its contour.
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let scan_start_time = NtpTime(reader.read_u64(ORDER)?);
        let object_count = usize::from(reader.read_u16(ORDER)?);

        let capacity = object_count.min(reader.remaining() / OBJECT_RECORD_SIZE);
        let mut objects = Vec::with_capacity(capacity);
        for decoded in 0..object_count {
            if reader.remaining() < OBJECT_RECORD_SIZE {
                return Err(WireError::TruncatedPayload {
                    record: "object",
                    declared: object_count,
                    available: decoded,
                });
            }
            objects.push(TrackedObject::decode(reader)?);
        }
        Ok(Self {
            scan_start_time,
            objects,
        })
    }

    /// Encode the list. Fails with [`WireError::TooManyRecords`] when there are
    /// more objects, or more contour points on one object, than a `u16` counts.
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        let count = u16::try_from(self.objects.len()).map_err(|_| WireError::TooManyRecords {
            record: "object",
            count: self.objects.len(),
        })?;
        writer.write_u64(self.scan_start_time.0, ORDER)?;
        writer.write_u16(count, ORDER)?;
        for object in &self.objects {
            object.encode(writer)?;
        }
        Ok(())
    }

    /// Encoded size in bytes.
    pub fn wire_size(&self) -> usize {
        OBJECT_HEADER_SIZE
            + self
                .objects
                .iter()
                .map(TrackedObject::wire_size)
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: u16, contour: Vec<Point2D>) -> TrackedObject {
        TrackedObject {
            id,
            age: 12,
            reference_point: Point2D::new(-150, 420),
            bounding_box_size: Size2D {
                width: 180,
                length: 450,
            },
            object_box_orientation: -90,
            absolute_velocity: Point2D::new(3, -1),
            classification: 5,
            contour,
            ..TrackedObject::default()
        }
    }

    fn encode(objects: &ScanDataObjects) -> bytes::Bytes {
        let mut writer = ByteWriter::new();
        objects.encode(&mut writer).unwrap();
        writer.freeze()
    }

    #[test]
    fn object_record_is_fixed_size_before_contour() {
        let list = ScanDataObjects {
            scan_start_time: NtpTime(1),
            objects: vec![object(1, Vec::new())],
        };
        let bytes = encode(&list);
        assert_eq!(bytes.len(), OBJECT_HEADER_SIZE + OBJECT_RECORD_SIZE);
        assert_eq!(bytes.len(), list.wire_size());
        // object count right after the 8-byte timestamp
        assert_eq!(&bytes[8..10], &[1, 0]);
        // contour count is the last field of the record
        assert_eq!(&bytes[bytes.len() - 2..], &[0, 0]);
    }

    #[test]
    fn contour_points_belong_to_their_object() {
        let contour = vec![Point2D::new(1, 2), Point2D::new(3, 4), Point2D::new(5, 6)];
        let list = ScanDataObjects {
            scan_start_time: NtpTime(99),
            objects: vec![object(10, Vec::new()), object(11, contour.clone())],
        };
        let bytes = encode(&list);

        let mut reader = ByteReader::new(&bytes);
        let decoded = ScanDataObjects::decode(&mut reader).unwrap();
        assert!(reader.is_empty());
        assert_eq!(decoded.objects.len(), 2);
        assert_eq!(decoded.objects[0].id, 10);
        assert!(decoded.objects[0].contour.is_empty());
        assert_eq!(decoded.objects[1].id, 11);
        assert_eq!(decoded.objects[1].contour, contour);
        assert_eq!(decoded, list);
    }

    #[test]
    fn missing_object_is_truncated() {
        let list = ScanDataObjects {
            scan_start_time: NtpTime(0),
            objects: vec![object(1, Vec::new()), object(2, Vec::new())],
        };
        let bytes = encode(&list);
        let short = &bytes[..bytes.len() - 10];
        let err = ScanDataObjects::decode(&mut ByteReader::new(short)).unwrap_err();
        assert_eq!(
            err,
            WireError::TruncatedPayload {
                record: "object",
                declared: 2,
                available: 1,
            }
        );
    }

    #[test]
    fn object_count_must_fit_u16() {
        let list = ScanDataObjects {
            scan_start_time: NtpTime(0),
            objects: vec![TrackedObject::default(); usize::from(u16::MAX) + 1],
        };
        let mut writer = ByteWriter::new();
        let err = list.encode(&mut writer).unwrap_err();
        assert_eq!(
            err,
            WireError::TooManyRecords {
                record: "object",
                count: 65_536,
            }
        );
        assert!(writer.is_empty());
    }

    #[test]
    fn contour_length_must_fit_u16() {
        let list = ScanDataObjects {
            scan_start_time: NtpTime(0),
            objects: vec![object(
                1,
                vec![Point2D::default(); usize::from(u16::MAX) + 1],
            )],
        };
        let err = list.encode(&mut ByteWriter::new()).unwrap_err();
        assert_eq!(
            err,
            WireError::TooManyRecords {
                record: "contour point",
                count: 65_536,
            }
        );
    }

    #[test]
    fn missing_contour_points_are_truncated() {
        let list = ScanDataObjects {
            scan_start_time: NtpTime(0),
            objects: vec![object(1, vec![Point2D::new(0, 0); 4])],
        };
        let bytes = encode(&list);
        let short = &bytes[..bytes.len() - POINT2D_SIZE];
        let err = ScanDataObjects::decode(&mut ByteReader::new(short)).unwrap_err();
        assert_eq!(
            err,
            WireError::TruncatedPayload {
                record: "contour point",
                declared: 4,
                available: 3,
            }
        );
    }
}

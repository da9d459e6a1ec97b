//! Bounds-checked byte cursors.
//!
//! The frame header is big-endian while every payload record is little-endian,
//! so each accessor takes an explicit [`ByteOrder`]. Reads past the end of the
//! buffer return [`WireError::OutOfBounds`] instead of panicking.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Byte order of a multi-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Network order, used by the frame header.
    Big,
    /// Used by every payload record.
    Little,
}

/// Reads fixed-width integers from a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Start reading at offset 0 of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the current offset and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once every byte has been read.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Move to an absolute offset. Seeking to exactly the end is allowed.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(WireError::OutOfBounds {
                offset: pos,
                needed: 0,
                len: self.buf.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(WireError::OutOfBounds {
                offset: self.pos,
                needed: n,
                len: self.buf.len(),
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Borrow everything that is left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let bytes = &self.buf[self.pos..];
        self.pos = self.buf.len();
        bytes
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    /// Read a single signed byte.
    pub fn read_i8(&mut self) -> Result<i8> {
        let raw = self.read_array::<1>()?;
        Ok(i8::from_le_bytes(raw))
    }

    /// Read a `u16` in `order`. The remaining multi-byte readers work the same way.
    pub fn read_u16(&mut self, order: ByteOrder) -> Result<u16> {
        let raw = self.read_array::<2>()?;
        Ok(match order {
            ByteOrder::Big => u16::from_be_bytes(raw),
            ByteOrder::Little => u16::from_le_bytes(raw),
        })
    }

    pub fn read_i16(&mut self, order: ByteOrder) -> Result<i16> {
        let raw = self.read_array::<2>()?;
        Ok(match order {
            ByteOrder::Big => i16::from_be_bytes(raw),
            ByteOrder::Little => i16::from_le_bytes(raw),
        })
    }

    pub fn read_u32(&mut self, order: ByteOrder) -> Result<u32> {
        let raw = self.read_array::<4>()?;
        Ok(match order {
            ByteOrder::Big => u32::from_be_bytes(raw),
            ByteOrder::Little => u32::from_le_bytes(raw),
        })
    }

    pub fn read_i32(&mut self, order: ByteOrder) -> Result<i32> {
        let raw = self.read_array::<4>()?;
        Ok(match order {
            ByteOrder::Big => i32::from_be_bytes(raw),
            ByteOrder::Little => i32::from_le_bytes(raw),
        })
    }

    pub fn read_u64(&mut self, order: ByteOrder) -> Result<u64> {
        let raw = self.read_array::<8>()?;
        Ok(match order {
            ByteOrder::Big => u64::from_be_bytes(raw),
            ByteOrder::Little => u64::from_le_bytes(raw),
        })
    }

    /// Read an eight-byte signed integer.
    pub fn read_i64(&mut self, order: ByteOrder) -> Result<i64> {
        let raw = self.read_array::<8>()?;
        Ok(match order {
            ByteOrder::Big => i64::from_be_bytes(raw),
            ByteOrder::Little => i64::from_le_bytes(raw),
        })
    }
}

/// Appends fixed-width integers to a growable buffer, up to a byte limit.
#[derive(Debug)]
pub struct ByteWriter {
    buf: BytesMut,
    limit: usize,
}

impl ByteWriter {
    /// Writer without a practical limit.
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// Writer that refuses to grow past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            limit,
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Space left before the limit is reached.
    pub fn remaining(&self) -> usize {
        self.limit - self.buf.len()
    }

    fn reserve(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(WireError::OutOfBounds {
                offset: self.buf.len(),
                needed: n,
                len: self.limit,
            });
        }
        self.buf.reserve(n);
        Ok(())
    }

    /// Append `bytes` unchanged.
    ///
    /// Every `write_*` method fails with [`WireError::OutOfBounds`] and writes
    /// nothing when the value would cross the limit.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.reserve(1)?;
        self.buf.put_u8(value);
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.reserve(1)?;
        self.buf.put_i8(value);
        Ok(())
    }

    /// Write a `u16` in `order`.
    pub fn write_u16(&mut self, value: u16, order: ByteOrder) -> Result<()> {
        self.reserve(2)?;
        match order {
            ByteOrder::Big => self.buf.put_u16(value),
            ByteOrder::Little => self.buf.put_u16_le(value),
        }
        Ok(())
    }

    pub fn write_i16(&mut self, value: i16, order: ByteOrder) -> Result<()> {
        self.reserve(2)?;
        match order {
            ByteOrder::Big => self.buf.put_i16(value),
            ByteOrder::Little => self.buf.put_i16_le(value),
        }
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32, order: ByteOrder) -> Result<()> {
        self.reserve(4)?;
        match order {
            ByteOrder::Big => self.buf.put_u32(value),
            ByteOrder::Little => self.buf.put_u32_le(value),
        }
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32, order: ByteOrder) -> Result<()> {
        self.reserve(4)?;
        match order {
            ByteOrder::Big => self.buf.put_i32(value),
            ByteOrder::Little => self.buf.put_i32_le(value),
        }
        Ok(())
    }

    pub fn write_u64(&mut self, value: u64, order: ByteOrder) -> Result<()> {
        self.reserve(8)?;
        match order {
            ByteOrder::Big => self.buf.put_u64(value),
            ByteOrder::Little => self.buf.put_u64_le(value),
        }
        Ok(())
    }

    /// Append an eight-byte signed integer.
    pub fn write_i64(&mut self, value: i64, order: ByteOrder) -> Result<()> {
        self.reserve(8)?;
        match order {
            ByteOrder::Big => self.buf.put_i64(value),
            ByteOrder::Little => self.buf.put_i64_le(value),
        }
        Ok(())
    }

    /// Written bytes as a mutable buffer.
    pub fn into_inner(self) -> BytesMut {
        self.buf
    }

    /// Written bytes as an immutable buffer.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_mixed_byte_orders() {
        let bytes = [0xAF, 0xFE, 0xC0, 0xC2, 0x34, 0x12, 0xFE, 0xFF];
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(reader.read_u32(ByteOrder::Big).unwrap(), 0xAFFE_C0C2);
        assert_eq!(reader.read_u16(ByteOrder::Little).unwrap(), 0x1234);
        assert_eq!(reader.read_i16(ByteOrder::Little).unwrap(), -2);
        assert!(reader.is_empty());
    }

    #[test]
    fn read_past_end_is_out_of_bounds() {
        let bytes = [0x01, 0x02, 0x03];
        let mut reader = ByteReader::new(&bytes);
        reader.read_u16(ByteOrder::Little).unwrap();

        let err = reader.read_u16(ByteOrder::Little).unwrap_err();
        assert_eq!(
            err,
            WireError::OutOfBounds {
                offset: 2,
                needed: 2,
                len: 3
            }
        );
        // A failed read leaves the cursor where it was.
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read_u8().unwrap(), 0x03);
    }

    #[test]
    fn huge_read_length_does_not_overflow() {
        let bytes = [0u8; 4];
        let mut reader = ByteReader::new(&bytes);
        reader.read_u8().unwrap();
        assert!(matches!(
            reader.read_bytes(usize::MAX),
            Err(WireError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn seek_and_remaining() {
        let bytes = [0u8; 10];
        let mut reader = ByteReader::new(&bytes);
        reader.seek(6).unwrap();
        assert_eq!(reader.remaining(), 4);
        reader.seek(10).unwrap();
        assert!(reader.is_empty());
        assert!(reader.seek(11).is_err());
        assert_eq!(reader.position(), 10);
    }

    #[test]
    fn read_rest_consumes_everything() {
        let bytes = [1u8, 2, 3, 4];
        let mut reader = ByteReader::new(&bytes);
        reader.read_u8().unwrap();
        assert_eq!(reader.read_rest(), &[2, 3, 4]);
        assert!(reader.is_empty());
        assert!(reader.read_rest().is_empty());
    }

    #[test]
    fn writer_mirrors_reader() {
        let mut writer = ByteWriter::new();
        writer.write_u32(0xAFFE_C0C2, ByteOrder::Big).unwrap();
        writer.write_u64(0x0102_0304_0506_0708, ByteOrder::Little).unwrap();
        writer.write_i16(-300, ByteOrder::Little).unwrap();
        writer.write_i32(-7, ByteOrder::Big).unwrap();
        let bytes = writer.freeze();

        assert_eq!(&bytes[..4], &[0xAF, 0xFE, 0xC0, 0xC2]);
        assert_eq!(bytes[4], 0x08);

        let mut reader = ByteReader::new(&bytes);
        reader.seek(4).unwrap();
        assert_eq!(
            reader.read_u64(ByteOrder::Little).unwrap(),
            0x0102_0304_0506_0708
        );
        assert_eq!(reader.read_i16(ByteOrder::Little).unwrap(), -300);
        assert_eq!(reader.read_i32(ByteOrder::Big).unwrap(), -7);
    }

    #[test]
    fn signed_extremes_in_both_orders() {
        let mut writer = ByteWriter::new();
        writer.write_i8(-128).unwrap();
        writer.write_i64(i64::MIN + 1, ByteOrder::Big).unwrap();
        writer.write_i64(-2, ByteOrder::Little).unwrap();
        let bytes = writer.freeze();

        assert_eq!(bytes.len(), 17);
        assert_eq!(bytes[0], 0x80);
        assert_eq!(&bytes[1..9], &[0x80, 0, 0, 0, 0, 0, 0, 0x01]);
        assert_eq!(&bytes[9..11], &[0xFE, 0xFF]);

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_i8().unwrap(), -128);
        assert_eq!(reader.read_i64(ByteOrder::Big).unwrap(), i64::MIN + 1);
        assert_eq!(reader.read_i64(ByteOrder::Little).unwrap(), -2);
        assert!(reader.read_i8().is_err());
    }

    #[test]
    fn writer_respects_limit() {
        let mut writer = ByteWriter::with_limit(5);
        writer.write_u32(1, ByteOrder::Little).unwrap();
        let err = writer.write_u16(2, ByteOrder::Little).unwrap_err();
        assert!(matches!(err, WireError::OutOfBounds { offset: 4, .. }));
        writer.write_u8(3).unwrap();
        assert_eq!(writer.remaining(), 0);
        assert_eq!(writer.len(), 5);
    }
}

//! Header and payload codec for the ibeo LIDAR sensor wire protocol.
//!
//! Every frame on the wire is:
//! - a 24-byte big-endian header starting with the magic word `0xAFFEC0C2`
//! - a little-endian body whose layout depends on the header's data type
//!
//! All records are packed and encoded field by field through [`ByteReader`]
//! and [`ByteWriter`]; nothing relies on in-memory struct layout.
//! Locating frames in a byte stream is handled by `ibeo-frame`.

pub mod command;
pub mod cursor;
pub mod error;
pub mod header;
pub mod message;
pub mod object;
pub mod scan;
pub mod status;
pub mod time;
pub mod types;

pub use command::{CommandBody, Parameter, PARAMETER_SIZE};
pub use cursor::{ByteOrder, ByteReader, ByteWriter};
pub use error::{Result, WireError};
pub use header::{decode_header, encode_header, MessageHeader, HEADER_SIZE, MAGIC_BYTES, MAGIC_WORD};
pub use message::{decode_frame, encode_message, Frame, Message, MessageEncoder, Payload};
pub use object::{Point2D, ScanDataObjects, Size2D, TrackedObject};
pub use scan::{ScanDataHeader, ScanDataPoints, ScanPoint};
pub use status::{ErrorWarning, StatusMessage};
pub use time::NtpTime;
pub use types::{Command, DataType, ParameterIndex};

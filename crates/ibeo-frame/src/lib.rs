//! Stream framing for the ibeo LIDAR wire protocol.
//!
//! Sensors send an endless byte stream of frames, each a 24-byte header plus
//! a body. A connection may be picked up mid-frame and bytes may be corrupted
//! in transit, so this crate locates frames by:
//! - scanning for the magic word `0xAFFEC0C2`
//! - bounding the declared body size
//! - checking each header's `PreviousMessagesSize` against the frame before it
//!
//! Corrupted input is skipped and reported, never fatal.

#[cfg(feature = "async")]
pub mod codec;
pub mod error;
pub mod reader;
pub mod scanner;
pub mod writer;

#[cfg(feature = "async")]
pub use codec::IbeoCodec;
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use scanner::{
    Desync, DesyncReason, FrameConfig, FrameScanner, ScanEvent, ScannerStats,
    DEFAULT_MAX_MESSAGE_SIZE,
};
pub use writer::FrameWriter;

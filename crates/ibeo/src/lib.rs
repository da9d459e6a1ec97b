//! Wire protocol for ibeo automotive LIDAR sensors.
//!
//! The sensor streams laser scan points, tracked objects and status over
//! TCP/IP and accepts commands on the same connection. This crate decodes and
//! encodes that traffic; opening sockets is left to the caller.
//!
//! # Crate Structure
//!
//! - [`wire`]: header and payload codecs, messages
//! - [`frame`]: locating frames in a byte stream, blocking reader/writer and
//!   an async codec (behind `async` feature)
//!
//! ```
//! use ibeo::frame::{FrameScanner, ScanEvent};
//! use ibeo::wire::{encode_message, CommandBody, Message};
//!
//! let bytes = encode_message(&Message::command(1, CommandBody::StartMeasure), 0).unwrap();
//! let mut scanner = FrameScanner::new();
//! for event in scanner.feed(&bytes) {
//!     if let ScanEvent::Frame(frame) = event {
//!         let message = frame.decode().unwrap();
//!         assert_eq!(message.device_id, 1);
//!     }
//! }
//! ```

/// Re-export wire types.
pub mod wire {
    pub use ibeo_wire::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ibeo_frame::*;
}

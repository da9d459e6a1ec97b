use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use ibeo_wire::{CommandBody, Frame, Message};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::scanner::FrameConfig;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
///
/// Each header's `PreviousMessagesSize` is filled in from the frame written
/// before it on this writer.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    previous_size: u32,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            previous_size: 0,
        }
    }

    /// Encode and send a message (blocking).
    pub fn send(&mut self, message: &Message) -> Result<()> {
        let frame = message.to_frame(self.previous_size)?;
        self.write_frame(&frame)
    }

    /// Send a command to `device_id` with a zero timestamp.
    pub fn send_command(&mut self, device_id: u8, body: CommandBody) -> Result<()> {
        self.send(&Message::command(device_id, body))
    }

    /// Write an already-encoded frame as-is (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.body.len() > self.config.max_message_size {
            return Err(FrameError::MessageTooLarge {
                size: frame.body.len(),
                max: self.config.max_message_size,
            });
        }

        self.buf.clear();
        frame.write_to(&mut self.buf);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        trace!(
            data_type = frame.header.data_type,
            size = frame.wire_size(),
            "frame written"
        );
        self.previous_size = u32::try_from(frame.wire_size()).unwrap_or(u32::MAX);
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Size of the last frame written, 0 before the first.
    pub fn previous_size(&self) -> u32 {
        self.previous_size
    }

    /// Start a new session: the next frame records a previous size of 0.
    pub fn reset(&mut self) {
        self.previous_size = 0;
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum body size for subsequent frame encoding.
    pub fn set_max_message_size(&mut self, max_message_size: usize) {
        self.config.max_message_size = max_message_size;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

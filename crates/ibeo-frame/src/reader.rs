use std::io::{ErrorKind, Read};

use ibeo_wire::{Frame, Message};
use tracing::debug;

use crate::error::{FrameError, Result};
use crate::scanner::{FrameConfig, FrameScanner, ScanEvent, ScannerStats};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads and resynchronization internally. Desync events are
/// logged and counted in [`FrameReader::stats`]; use
/// [`FrameReader::read_event`] to observe them directly.
pub struct FrameReader<T> {
    inner: T,
    scanner: FrameScanner,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            scanner: FrameScanner::with_config(config),
        }
    }

    /// Read until the next frame or desync event (blocking).
    ///
    /// Never returns [`ScanEvent::NeedMoreBytes`]. Returns
    /// `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_event(&mut self) -> Result<ScanEvent> {
        loop {
            match self.scanner.next_event() {
                ScanEvent::NeedMoreBytes => {}
                event => return Ok(event),
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.scanner.buffered() > 0 {
                    debug!(
                        buffered = self.scanner.buffered(),
                        "stream ended inside a frame"
                    );
                }
                return Err(FrameError::ConnectionClosed);
            }

            self.scanner.push(&chunk[..read]);
        }
    }

    /// Read the next complete frame (blocking), skipping corrupted bytes.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let ScanEvent::Frame(frame) = self.read_event()? {
                return Ok(frame);
            }
        }
    }

    /// Read and decode the next message (blocking).
    ///
    /// A decode error affects only the frame it came from; the next call
    /// continues with the following frame.
    pub fn read_message(&mut self) -> Result<Message> {
        Ok(self.read_frame()?.decode()?)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum body size for subsequent frame decoding.
    pub fn set_max_message_size(&mut self, max_message_size: usize) {
        self.scanner.set_max_message_size(max_message_size);
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        self.scanner.config()
    }

    /// Counters for frames read and bytes skipped so far.
    pub fn stats(&self) -> ScannerStats {
        self.scanner.stats()
    }
}

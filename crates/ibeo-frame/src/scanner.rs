//! Frame boundary detection on a continuous byte stream.
//!
//! The stream may start mid-frame or carry corrupted bytes. The scanner looks
//! for the magic word, checks the candidate header against the configured size
//! limit and against the previous frame's size, and skips one byte past any
//! candidate that fails. Skipped bytes are reported once per loss of sync as a
//! [`ScanEvent::Desync`]; the stream itself is never abandoned.

use bytes::{Buf, BytesMut};
use ibeo_wire::{decode_header, Frame, MessageHeader, HEADER_SIZE, MAGIC_BYTES};
use tracing::{trace, warn};

/// Default upper bound for a frame body: 1 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;

/// Configuration shared by the scanner and the stream adapters.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest body accepted from a header. Default: 1 MiB.
    pub max_message_size: usize,
    /// Check each header's `PreviousMessagesSize` against the frame before it.
    pub verify_previous_size: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            verify_previous_size: true,
        }
    }
}

/// Why bytes were skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesyncReason {
    /// Bytes before the next magic word.
    Garbage,
    /// A candidate header declared an oversized body.
    MessageTooLarge { size: usize, max: usize },
    /// A candidate header did not chain to the previous frame.
    PreviousSizeMismatch { expected: u32, found: u32 },
}

/// Loss of synchronization. Recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Desync {
    /// Bytes dropped by the step that lost sync.
    pub skipped: usize,
    pub reason: DesyncReason,
}

/// Result of one scanning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A complete, validated frame.
    Frame(Frame),
    /// The scanner lost sync and is skipping bytes.
    Desync(Desync),
    /// Nothing more can be produced until more bytes are pushed.
    NeedMoreBytes,
}

/// Running counters for one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScannerStats {
    pub frames: u64,
    pub desyncs: u64,
    pub bytes_skipped: u64,
}

/// Sync state machine, independent of who owns the buffer.
#[derive(Debug, Clone)]
pub(crate) struct FrameSync {
    config: FrameConfig,
    previous_size: Option<u32>,
    in_sync: bool,
    stats: ScannerStats,
}

impl FrameSync {
    pub(crate) fn new(config: FrameConfig) -> Self {
        Self {
            config,
            previous_size: None,
            in_sync: true,
            stats: ScannerStats::default(),
        }
    }

    pub(crate) fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut FrameConfig {
        &mut self.config
    }

    pub(crate) fn stats(&self) -> ScannerStats {
        self.stats
    }

    pub(crate) fn reset(&mut self) {
        self.previous_size = None;
        self.in_sync = true;
        self.stats = ScannerStats::default();
    }

    /// Take the next event out of `buf`, dropping consumed and skipped bytes.
    pub(crate) fn scan(&mut self, buf: &mut BytesMut) -> ScanEvent {
        loop {
            let Some(start) = find_magic(buf) else {
                let skip = buf.len() - partial_magic_suffix(buf);
                return match self.skip(buf, skip, DesyncReason::Garbage) {
                    Some(desync) => ScanEvent::Desync(desync),
                    None => ScanEvent::NeedMoreBytes,
                };
            };
            if let Some(desync) = self.skip(buf, start, DesyncReason::Garbage) {
                return ScanEvent::Desync(desync);
            }

            if buf.len() < HEADER_SIZE {
                return ScanEvent::NeedMoreBytes;
            }
            let header = match decode_header(&buf[..HEADER_SIZE]) {
                Ok(header) => header,
                Err(_) => {
                    if let Some(desync) = self.skip(buf, 1, DesyncReason::Garbage) {
                        return ScanEvent::Desync(desync);
                    }
                    continue;
                }
            };

            if let Some(reason) = self.reject(&header) {
                if let Some(desync) = self.skip(buf, 1, reason) {
                    return ScanEvent::Desync(desync);
                }
                continue;
            }

            let total = header.frame_size();
            if buf.len() < total {
                return ScanEvent::NeedMoreBytes;
            }

            let mut frame_bytes = buf.split_to(total);
            let body = frame_bytes.split_off(HEADER_SIZE).freeze();
            self.accept(total);
            trace!(
                data_type = header.data_type,
                size = total,
                "frame complete"
            );
            return ScanEvent::Frame(Frame::new(header, body));
        }
    }

    fn reject(&self, header: &MessageHeader) -> Option<DesyncReason> {
        let size = header.message_size as usize;
        if size > self.config.max_message_size {
            return Some(DesyncReason::MessageTooLarge {
                size,
                max: self.config.max_message_size,
            });
        }
        if self.config.verify_previous_size {
            if let Some(expected) = self.previous_size {
                if header.previous_message_size != expected {
                    return Some(DesyncReason::PreviousSizeMismatch {
                        expected,
                        found: header.previous_message_size,
                    });
                }
            }
        }
        None
    }

    fn accept(&mut self, total: usize) {
        // total is bounded by HEADER_SIZE + max_message_size
        self.previous_size = Some(u32::try_from(total).unwrap_or(u32::MAX));
        self.in_sync = true;
        self.stats.frames += 1;
    }

    /// Drop `n` bytes. Returns an event only when this loses sync.
    fn skip(&mut self, buf: &mut BytesMut, n: usize, reason: DesyncReason) -> Option<Desync> {
        if n == 0 {
            return None;
        }
        buf.advance(n);
        self.stats.bytes_skipped += n as u64;

        if !self.in_sync {
            trace!(skipped = n, ?reason, "still resynchronizing");
            return None;
        }
        self.in_sync = false;
        self.previous_size = None;
        self.stats.desyncs += 1;
        warn!(skipped = n, ?reason, "frame stream desynchronized");
        Some(Desync { skipped: n, reason })
    }
}

fn find_magic(buf: &[u8]) -> Option<usize> {
    buf.windows(MAGIC_BYTES.len())
        .position(|window| window == MAGIC_BYTES)
}

/// Length of the longest tail of `buf` that could be the start of a magic word.
fn partial_magic_suffix(buf: &[u8]) -> usize {
    (1..MAGIC_BYTES.len())
        .rev()
        .find(|&k| buf.len() >= k && buf[buf.len() - k..] == MAGIC_BYTES[..k])
        .unwrap_or(0)
}

/// Accumulates stream bytes and splits them into validated frames.
///
/// One scanner per byte stream: it remembers the size of the last frame to
/// check the next header's `PreviousMessagesSize`.
#[derive(Debug, Clone)]
pub struct FrameScanner {
    buf: BytesMut,
    sync: FrameSync,
}

impl FrameScanner {
    /// Create a scanner with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a scanner with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            sync: FrameSync::new(config),
        }
    }

    /// Append bytes received from the transport.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Produce the next frame or desync event from buffered bytes.
    pub fn next_event(&mut self) -> ScanEvent {
        self.sync.scan(&mut self.buf)
    }

    /// Push `chunk` and collect every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ScanEvent> {
        self.push(chunk);
        let mut events = Vec::new();
        loop {
            match self.next_event() {
                ScanEvent::NeedMoreBytes => return events,
                event => events.push(event),
            }
        }
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn stats(&self) -> ScannerStats {
        self.sync.stats()
    }

    pub fn config(&self) -> &FrameConfig {
        self.sync.config()
    }

    /// Update maximum body size for subsequent headers.
    pub fn set_max_message_size(&mut self, max_message_size: usize) {
        self.sync.config_mut().max_message_size = max_message_size;
    }

    /// Forget buffered bytes and the previous frame, e.g. after reconnecting.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.sync.reset();
    }
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

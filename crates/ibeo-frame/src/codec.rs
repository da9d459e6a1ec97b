//! `tokio_util` codec for async streams.
//!
//! The decoder yields raw [`Frame`]s rather than decoded messages: a
//! `FramedRead` stream ends at the first decoder error, and a bad payload must
//! not end the stream. Call [`Frame::decode`] on each item.

use bytes::BytesMut;
use ibeo_wire::{Frame, Message};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::error::{FrameError, Result};
use crate::scanner::{FrameConfig, FrameSync, ScanEvent, ScannerStats};

/// Frame codec for `FramedRead`/`FramedWrite`/`Framed`.
///
/// Decoding resynchronizes on corrupted input the same way
/// [`FrameScanner`](crate::FrameScanner) does; desyncs are logged and counted
/// but never surface as stream errors. Encoding chains `PreviousMessagesSize`
/// across the messages sent through this codec.
#[derive(Debug, Clone)]
pub struct IbeoCodec {
    sync: FrameSync,
    previous_size: u32,
}

impl IbeoCodec {
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            sync: FrameSync::new(config),
            previous_size: 0,
        }
    }

    pub fn config(&self) -> &FrameConfig {
        self.sync.config()
    }

    /// Decoder counters since creation.
    pub fn stats(&self) -> ScannerStats {
        self.sync.stats()
    }
}

impl Default for IbeoCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for IbeoCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        loop {
            match self.sync.scan(src) {
                ScanEvent::Frame(frame) => return Ok(Some(frame)),
                ScanEvent::Desync(_) => continue,
                ScanEvent::NeedMoreBytes => return Ok(None),
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if !src.is_empty() {
            debug!(buffered = src.len(), "dropping incomplete frame at end of stream");
            src.clear();
        }
        Ok(None)
    }
}

impl Encoder<Message> for IbeoCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        let frame = item.to_frame(self.previous_size)?;
        let max = self.sync.config().max_message_size;
        if frame.body.len() > max {
            return Err(FrameError::MessageTooLarge {
                size: frame.body.len(),
                max,
            });
        }
        frame.write_to(dst);
        self.previous_size = u32::try_from(frame.wire_size()).unwrap_or(u32::MAX);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use ibeo_wire::{CommandBody, MessageEncoder, NtpTime, Payload};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    fn sample() -> Vec<Message> {
        vec![
            Message::command(1, CommandBody::StartMeasure),
            Message::new(
                2,
                NtpTime(42),
                Payload::VehicleData(bytes::Bytes::from_static(&[1, 2, 3])),
            ),
            Message::command(1, CommandBody::StopMeasure),
        ]
    }

    fn encode_all(messages: &[Message]) -> Vec<u8> {
        let mut encoder = MessageEncoder::new();
        messages
            .iter()
            .flat_map(|message| encoder.encode(message).unwrap().to_vec())
            .collect()
    }

    #[tokio::test]
    async fn framed_read_yields_frames() {
        let messages = sample();
        let wire = encode_all(&messages);
        let mut framed = FramedRead::new(wire.as_slice(), IbeoCodec::new());

        for expected in &messages {
            let frame = framed.next().await.unwrap().unwrap();
            assert_eq!(&frame.decode().unwrap(), expected);
        }
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_read_skips_garbage() {
        let messages = sample();
        let mut wire = vec![0xEE; 13];
        wire.extend(encode_all(&messages));
        let mut framed = FramedRead::new(wire.as_slice(), IbeoCodec::new());

        let frame = framed.next().await.unwrap().unwrap();
        assert_eq!(frame.decode().unwrap(), messages[0]);
        assert_eq!(framed.decoder().stats().desyncs, 1);
        assert_eq!(framed.decoder().stats().bytes_skipped, 13);
    }

    #[tokio::test]
    async fn truncated_tail_ends_stream_cleanly() {
        let messages = sample();
        let mut wire = encode_all(&messages);
        wire.truncate(wire.len() - 1);
        let mut framed = FramedRead::new(wire.as_slice(), IbeoCodec::new());

        assert!(framed.next().await.unwrap().is_ok());
        assert!(framed.next().await.unwrap().is_ok());
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_write_matches_message_encoder() {
        let messages = sample();
        let mut framed = FramedWrite::new(Vec::<u8>::new(), IbeoCodec::new());
        for message in messages.clone() {
            framed.send(message).await.unwrap();
        }

        assert_eq!(framed.into_inner(), encode_all(&messages));
    }

    #[test]
    fn encode_rejects_oversized_message() {
        let mut codec = IbeoCodec::with_config(FrameConfig {
            max_message_size: 2,
            ..FrameConfig::default()
        });
        let message = Message::new(0, NtpTime(0), Payload::VehicleData(vec![0u8; 3].into()));
        let mut dst = BytesMut::new();

        let err = codec.encode(message, &mut dst).unwrap_err();
        assert!(matches!(err, FrameError::MessageTooLarge { size: 3, max: 2 }));
        assert!(dst.is_empty());
    }
}

//! Newline framing for envelopes (protocol revision 2).
//!
//! Lines are split as raw bytes with [`AnyDelimiterCodec`]; text decoding
//! is left to the envelope codec so that invalid UTF-8 is an ordinary parse
//! failure rather than a transport error. An over-long line surfaces as
//! [`Frame::Oversized`] instead of a decoder error, because `FramedRead`
//! ends the stream after any decoder error.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, Encoder};

use crate::error::HubError;

/// One framing unit read from a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete line, without its `\n` (or `\r\n`) terminator.
    Line(Bytes),
    /// A line longer than the maximum was discarded.
    Oversized,
}

/// `\n`-delimited envelope codec with a maximum line length.
#[derive(Debug, Clone)]
pub struct EnvelopeCodec {
    inner: AnyDelimiterCodec,
}

impl EnvelopeCodec {
    /// Creates a codec that discards lines longer than `max_length` bytes.
    #[must_use]
    pub fn new(max_length: usize) -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(
                b"\n".to_vec(),
                b"\n".to_vec(),
                max_length,
            ),
        }
    }
}

fn to_frame(
    result: Result<Option<Bytes>, AnyDelimiterCodecError>,
) -> Result<Option<Frame>, HubError> {
    match result {
        Ok(Some(mut line)) => {
            if line.last() == Some(&b'\r') {
                line.truncate(line.len().saturating_sub(1));
            }
            Ok(Some(Frame::Line(line)))
        }
        Ok(None) => Ok(None),
        Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => Ok(Some(Frame::Oversized)),
        Err(err) => Err(err.into()),
    }
}

impl Decoder for EnvelopeCodec {
    type Item = Frame;
    type Error = HubError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, HubError> {
        to_frame(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, HubError> {
        to_frame(self.inner.decode_eof(buf))
    }
}

impl Encoder<String> for EnvelopeCodec {
    type Error = HubError;

    fn encode(&mut self, line: String, buf: &mut BytesMut) -> Result<(), HubError> {
        self.inner.encode(line, buf)?;
        Ok(())
    }
}

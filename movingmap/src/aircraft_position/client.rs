//! TCP telemetry client.
//!
//! Connects to the simulator's main server, decodes the line stream with
//! [`PositionCodec`] and publishes each pose into a [`SharedPose`].

use std::sync::Arc;

use bytes::BytesMut;
use futures::StreamExt;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use super::protocol::parse_position_line;
use super::{CurrentPose, SharedPose};

/// Address of the simulator's main server on the local machine.
pub const DEFAULT_TELEMETRY_ADDRESS: &str = "127.0.0.1:10747";

/// Longest line accepted before it is discarded, in bytes.
pub const MAX_LINE_LENGTH: usize = 65536;

/// Errors raised by the telemetry client.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Could not connect to the telemetry server.
    #[error("Failed to connect to telemetry server at {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    /// The connection failed while reading.
    #[error("Telemetry read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Decodes a newline-delimited telemetry stream into poses.
///
/// Lines that are not position lines are skipped. Lines longer than
/// [`MAX_LINE_LENGTH`] are dropped with a warning and decoding resumes at the
/// next newline.
#[derive(Debug)]
pub struct PositionCodec {
    lines: LinesCodec,
    discarded: u64,
}

impl PositionCodec {
    /// Creates a codec with the standard line limit.
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    /// Creates a codec with a custom line limit.
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
            discarded: 0,
        }
    }

    /// Number of over-long lines dropped so far.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    fn next_pose(
        &mut self,
        buf: &mut BytesMut,
        eof: bool,
    ) -> Result<Option<CurrentPose>, TelemetryError> {
        loop {
            let decoded = if eof {
                self.lines.decode_eof(buf)
            } else {
                self.lines.decode(buf)
            };

            match decoded {
                Ok(Some(line)) => {
                    if let Some(pose) = parse_position_line(&line) {
                        return Ok(Some(pose));
                    }
                }
                Ok(None) => return Ok(None),
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    self.discarded += 1;
                    warn!(
                        max_length = self.lines.max_length(),
                        "Telemetry line exceeded buffer length, discarding input"
                    );
                }
                Err(LinesCodecError::Io(e)) => return Err(e.into()),
            }
        }
    }
}

impl Default for PositionCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for PositionCodec {
    type Item = CurrentPose;
    type Error = TelemetryError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<CurrentPose>, TelemetryError> {
        self.next_pose(buf, false)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<CurrentPose>, TelemetryError> {
        self.next_pose(buf, true)
    }
}

/// Streams poses from a telemetry source into a [`SharedPose`].
pub struct TelemetryClient<R = TcpStream> {
    frames: FramedRead<R, PositionCodec>,
}

impl TelemetryClient<TcpStream> {
    /// Connects to a telemetry server.
    pub async fn connect(address: &str) -> Result<Self, TelemetryError> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|source| TelemetryError::Connect {
                address: address.to_string(),
                source,
            })?;
        info!(address, "Connected to telemetry server");
        Ok(Self::from_reader(stream))
    }
}

impl<R: AsyncRead + Unpin> TelemetryClient<R> {
    /// Wraps any byte stream carrying telemetry lines.
    pub fn from_reader(reader: R) -> Self {
        Self {
            frames: FramedRead::new(reader, PositionCodec::new()),
        }
    }

    /// Publishes poses until the stream ends.
    ///
    /// Returns the number of poses published.
    pub async fn run(mut self, pose: Arc<SharedPose>) -> Result<u64, TelemetryError> {
        let mut published = 0u64;
        while let Some(next) = self.frames.next().await {
            let next = next?;
            pose.store(next);
            published += 1;
        }
        debug!(
            published,
            discarded = self.frames.decoder().discarded(),
            "Telemetry stream ended"
        );
        Ok(published)
    }
}

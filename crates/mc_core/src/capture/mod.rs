//! Rolling capture buffer.
//!
//! Ingests ordered, timestamped media chunks from a single live source
//! and retains either a trailing window of fixed target duration or an
//! unbounded full capture between explicit start and stop. Replay reads
//! are non-destructive.

use std::collections::VecDeque;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_REPLAY_WINDOW: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaEncoding {
    H264,
    Vp9,
    Av1,
}

impl std::fmt::Display for MediaEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MediaEncoding::H264 => "h264",
            MediaEncoding::Vp9 => "vp9",
            MediaEncoding::Av1 => "av1",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CaptureError {
    /// The source cannot produce this encoding; callers retry with a
    /// fallback rather than treating it as fatal.
    #[error("unsupported media encoding: {0}")]
    UnsupportedEncoding(MediaEncoding),

    #[error("a full capture is already active")]
    FullCaptureActive,

    #[error("no capture session is active")]
    NotCapturing,

    #[error("live media source unavailable")]
    SourceUnavailable,
}

/// One encoded media chunk. `offset` is relative to capture start using
/// the chunk-arrival clock, so a paused source does not stretch the
/// window.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaChunk {
    pub offset: Duration,
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Idle,
    Buffering,
    FullCapture,
}

/// A materialized read of buffer contents: the concatenated payload plus
/// the span it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedMedia {
    pub encoding: MediaEncoding,
    pub data: Bytes,
    pub duration: Duration,
    pub chunk_count: usize,
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Trailing window retained in buffering mode, and the sub-window
    /// served by replay reads during a full capture.
    pub target_window: Duration,
    /// Encodings the attached source can produce.
    pub supported_encodings: Vec<MediaEncoding>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_window: DEFAULT_REPLAY_WINDOW,
            supported_encodings: vec![MediaEncoding::H264, MediaEncoding::Vp9],
        }
    }
}

/// Single-producer chunk buffer. Appends go to the tail, trimming only
/// removes from the head, so readers always see a consistent ordered
/// slice.
#[derive(Debug)]
pub struct ReplayBuffer {
    config: CaptureConfig,
    state: BufferState,
    encoding: Option<MediaEncoding>,
    chunks: VecDeque<MediaChunk>,
}

impl ReplayBuffer {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config, state: BufferState::Idle, encoding: None, chunks: VecDeque::new() }
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Begin trailing-window retention, replacing any prior session.
    pub fn start_buffering(&mut self, encoding: MediaEncoding) -> Result<(), CaptureError> {
        self.check_encoding(encoding)?;
        if self.state != BufferState::Idle {
            debug!(state = ?self.state, "replacing active capture session");
        }
        self.reset_to(BufferState::Buffering, encoding);
        Ok(())
    }

    /// Begin unbounded retention until [`stop`](Self::stop).
    pub fn start_full_capture(&mut self, encoding: MediaEncoding) -> Result<(), CaptureError> {
        if self.state == BufferState::FullCapture {
            return Err(CaptureError::FullCaptureActive);
        }
        self.check_encoding(encoding)?;
        self.reset_to(BufferState::FullCapture, encoding);
        Ok(())
    }

    /// Append a chunk. Out-of-order or idle-state chunks are dropped;
    /// in buffering mode the head is trimmed to the target window.
    pub fn push_chunk(&mut self, chunk: MediaChunk) {
        if self.state == BufferState::Idle {
            debug!("dropping chunk: buffer idle");
            return;
        }
        if let Some(last) = self.chunks.back() {
            if chunk.offset < last.offset {
                warn!(offset = ?chunk.offset, newest = ?last.offset, "dropping out-of-order chunk");
                return;
            }
        }
        self.chunks.push_back(chunk);
        if self.state == BufferState::Buffering {
            self.trim_head();
        }
    }

    /// Non-destructive read of the replay window. During a full capture
    /// this is the trailing sub-window, not the whole recording.
    pub fn replay_snapshot(&self) -> Option<CapturedMedia> {
        let encoding = self.encoding?;
        let newest = self.chunks.back()?.offset;
        let cutoff = newest.saturating_sub(self.config.target_window);
        let window: Vec<&MediaChunk> = match self.state {
            BufferState::Buffering => self.chunks.iter().collect(),
            BufferState::FullCapture => {
                self.chunks.iter().filter(|c| c.offset >= cutoff).collect()
            }
            BufferState::Idle => return None,
        };
        Some(Self::materialize(encoding, window))
    }

    /// Return everything retained and reset to idle.
    pub fn stop(&mut self) -> Result<CapturedMedia, CaptureError> {
        let encoding = self.encoding.ok_or(CaptureError::NotCapturing)?;
        let chunks: Vec<MediaChunk> = self.chunks.drain(..).collect();
        self.state = BufferState::Idle;
        self.encoding = None;
        Ok(Self::materialize(encoding, chunks.iter().collect()))
    }

    /// Span between oldest and newest retained chunk.
    pub fn retained_span(&self) -> Duration {
        match (self.chunks.front(), self.chunks.back()) {
            (Some(first), Some(last)) => last.offset - first.offset,
            _ => Duration::ZERO,
        }
    }

    fn check_encoding(&self, encoding: MediaEncoding) -> Result<(), CaptureError> {
        if self.config.supported_encodings.contains(&encoding) {
            Ok(())
        } else {
            Err(CaptureError::UnsupportedEncoding(encoding))
        }
    }

    fn reset_to(&mut self, state: BufferState, encoding: MediaEncoding) {
        self.state = state;
        self.encoding = Some(encoding);
        self.chunks.clear();
    }

    fn trim_head(&mut self) {
        let Some(newest) = self.chunks.back().map(|c| c.offset) else { return };
        while let Some(oldest) = self.chunks.front() {
            if newest - oldest.offset > self.config.target_window {
                self.chunks.pop_front();
            } else {
                break;
            }
        }
    }

    fn materialize(encoding: MediaEncoding, chunks: Vec<&MediaChunk>) -> CapturedMedia {
        let mut data = BytesMut::with_capacity(chunks.iter().map(|c| c.data.len()).sum());
        for chunk in &chunks {
            data.extend_from_slice(&chunk.data);
        }
        let duration = match (chunks.first(), chunks.last()) {
            (Some(first), Some(last)) => last.offset - first.offset,
            _ => Duration::ZERO,
        };
        CapturedMedia { encoding, data: data.freeze(), duration, chunk_count: chunks.len() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(secs: u64) -> MediaChunk {
        MediaChunk { offset: Duration::from_secs(secs), data: Bytes::from(vec![secs as u8; 8]) }
    }

    fn buffer() -> ReplayBuffer {
        ReplayBuffer::new(CaptureConfig::default())
    }

    #[test]
    fn trailing_window_stays_bounded() {
        let mut buf = buffer();
        buf.start_buffering(MediaEncoding::H264).unwrap();
        for s in 0..60 {
            buf.push_chunk(chunk(s));
            assert!(buf.retained_span() <= DEFAULT_REPLAY_WINDOW);
        }
        let snap = buf.replay_snapshot().unwrap();
        assert_eq!(snap.duration, DEFAULT_REPLAY_WINDOW);
        assert_eq!(snap.chunk_count, 16);
        // Still buffering after the read.
        assert_eq!(buf.state(), BufferState::Buffering);
        assert_eq!(buf.replay_snapshot().unwrap().chunk_count, 16);
    }

    #[test]
    fn full_capture_grows_unbounded() {
        let mut buf = buffer();
        buf.start_full_capture(MediaEncoding::H264).unwrap();
        for s in 0..120 {
            buf.push_chunk(chunk(s));
        }
        assert_eq!(buf.retained_span(), Duration::from_secs(119));

        // Replay reads only expose the trailing window.
        let replay = buf.replay_snapshot().unwrap();
        assert_eq!(replay.duration, DEFAULT_REPLAY_WINDOW);

        let full = buf.stop().unwrap();
        assert_eq!(full.chunk_count, 120);
        assert_eq!(full.duration, Duration::from_secs(119));
        assert_eq!(buf.state(), BufferState::Idle);
    }

    #[test]
    fn second_full_capture_is_rejected() {
        let mut buf = buffer();
        buf.start_full_capture(MediaEncoding::H264).unwrap();
        assert_eq!(
            buf.start_full_capture(MediaEncoding::H264),
            Err(CaptureError::FullCaptureActive)
        );
        // Trailing-window mode may be replaced freely.
        buf.stop().unwrap();
        buf.start_buffering(MediaEncoding::H264).unwrap();
        buf.push_chunk(chunk(0));
        buf.start_buffering(MediaEncoding::Vp9).unwrap();
        assert!(buf.replay_snapshot().is_none());
    }

    #[test]
    fn unsupported_encoding_is_a_distinct_error() {
        let mut buf = ReplayBuffer::new(CaptureConfig {
            target_window: DEFAULT_REPLAY_WINDOW,
            supported_encodings: vec![MediaEncoding::H264],
        });
        assert_eq!(
            buf.start_buffering(MediaEncoding::Av1),
            Err(CaptureError::UnsupportedEncoding(MediaEncoding::Av1))
        );
        // Caller retries with a fallback.
        assert!(buf.start_buffering(MediaEncoding::H264).is_ok());
    }

    #[test]
    fn chunks_outside_a_session_are_dropped() {
        let mut buf = buffer();
        buf.push_chunk(chunk(0));
        assert!(buf.replay_snapshot().is_none());
        assert_eq!(buf.stop(), Err(CaptureError::NotCapturing));

        buf.start_buffering(MediaEncoding::H264).unwrap();
        buf.push_chunk(chunk(5));
        buf.push_chunk(chunk(2)); // out of order
        assert_eq!(buf.replay_snapshot().unwrap().chunk_count, 1);
    }

    #[test]
    fn stop_concatenates_payload_in_order() {
        let mut buf = buffer();
        buf.start_buffering(MediaEncoding::H264).unwrap();
        buf.push_chunk(MediaChunk { offset: Duration::from_secs(0), data: Bytes::from_static(b"aa") });
        buf.push_chunk(MediaChunk { offset: Duration::from_secs(1), data: Bytes::from_static(b"bb") });
        let media = buf.stop().unwrap();
        assert_eq!(&media.data[..], b"aabb");
        assert_eq!(media.encoding, MediaEncoding::H264);
    }
}

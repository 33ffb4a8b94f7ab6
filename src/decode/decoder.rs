use crate::errors::CaptureResult;
use crate::mp4::{DecoderConfig, EncodedSample};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    Key,
    Delta,
}

/// One decode request
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedChunk {
    pub chunk_type: ChunkType,
    pub timestamp_us: i64,
    pub duration_us: u64,
    pub data: Vec<u8>,
}

impl From<EncodedSample> for EncodedChunk {
    fn from(sample: EncodedSample) -> Self {
        EncodedChunk {
            chunk_type: if sample.is_sync {
                ChunkType::Key
            } else {
                ChunkType::Delta
            },
            timestamp_us: sample.timestamp_us,
            duration_us: sample.duration_us,
            data: sample.data,
        }
    }
}

/// Decoder output in packed RGB8. Dropping it releases the picture.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub timestamp_us: i64,
    pub duration_us: Option<u64>,
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Video decoder backend.
///
/// Frames come back from `decode` and `flush` in the order the backend outputs them.
#[cfg_attr(test, mockall::automock)]
#[async_trait(?Send)]
pub trait FrameDecoder {
    async fn configure(&mut self, config: DecoderConfig) -> CaptureResult<()>;
    async fn decode(&mut self, chunk: EncodedChunk) -> CaptureResult<Vec<DecodedFrame>>;
    /// Emit every frame still held by the backend
    async fn flush(&mut self) -> CaptureResult<Vec<DecodedFrame>>;
}

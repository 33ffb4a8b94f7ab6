use super::decoder::{DecodedFrame, EncodedChunk, FrameDecoder};
use crate::errors::{CaptureResult, DecodeError};
use crate::mp4::{DecoderConfig, EncodedSample};
use log::{debug, info};

/// A decoded frame with its position in decoder output order
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedFrame {
    pub index: u64,
    pub frame: DecodedFrame,
}

/// Rewrite codec strings some decoders only accept in short form
pub fn normalize_codec(codec: &str) -> &str {
    if codec.starts_with("vp08") {
        "vp8"
    } else {
        codec
    }
}

/// Owns one decoder for the session and numbers its output frames
pub struct DecodeOrchestrator<D: FrameDecoder> {
    decoder: D,
    configured: bool,
    next_index: u64,
    samples_submitted: u64,
}

impl<D: FrameDecoder> DecodeOrchestrator<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            configured: false,
            next_index: 0,
            samples_submitted: 0,
        }
    }

    /// Configure the decoder once. Returns the configuration it was given, codec normalized.
    pub async fn configure(&mut self, config: &DecoderConfig) -> CaptureResult<DecoderConfig> {
        if self.configured {
            return Err(DecodeError::new("Decoder already configured").into());
        }
        let mut config = config.clone();
        let codec = normalize_codec(&config.codec);
        if codec != config.codec {
            debug!("Configuring decoder with {} instead of {}", codec, config.codec);
            config.codec = codec.to_string();
        }
        self.decoder.configure(config.clone()).await?;
        self.configured = true;
        Ok(config)
    }

    pub async fn decode(&mut self, sample: EncodedSample) -> CaptureResult<Vec<SequencedFrame>> {
        if !self.configured {
            return Err(DecodeError::new("Sample received before decoder configuration").into());
        }
        self.samples_submitted += 1;
        let frames = self.decoder.decode(EncodedChunk::from(sample)).await?;
        Ok(self.sequence(frames))
    }

    /// Flush the decoder after the last sample
    pub async fn finish(&mut self) -> CaptureResult<Vec<SequencedFrame>> {
        if !self.configured {
            return Err(DecodeError::new("Stream ended before decoder configuration").into());
        }
        let frames = self
            .decoder
            .flush()
            .await
            .map_err(|e| DecodeError::new(format!("Decoder flush failed: {}", e)))?;
        let frames = self.sequence(frames);
        info!(
            "Decoded {} frames from {} samples",
            self.next_index, self.samples_submitted
        );
        Ok(frames)
    }

    /// Frames output by the decoder so far
    pub fn frames_decoded(&self) -> u64 {
        self.next_index
    }

    fn sequence(&mut self, frames: Vec<DecodedFrame>) -> Vec<SequencedFrame> {
        frames
            .into_iter()
            .map(|frame| {
                let index = self.next_index;
                self.next_index += 1;
                SequencedFrame { index, frame }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decoder::{ChunkType, MockFrameDecoder};
    use crate::errors::{CaptureError, ErrorCategory};
    use mockall::predicate::*;
    use mockall::Sequence;

    fn config(codec: &str) -> DecoderConfig {
        DecoderConfig {
            codec: codec.to_string(),
            coded_width: 640,
            coded_height: 360,
            description: vec![1, 2, 3],
            total_frames: 3,
            duration_seconds: 0.1,
        }
    }

    fn sample(timestamp_us: i64, is_sync: bool) -> EncodedSample {
        EncodedSample {
            timestamp_us,
            duration_us: 33_333,
            is_sync,
            data: vec![0, 0, 0, 1, 0x65],
        }
    }

    fn picture(chunk: &EncodedChunk) -> DecodedFrame {
        DecodedFrame {
            timestamp_us: chunk.timestamp_us,
            duration_us: Some(chunk.duration_us),
            width: 1,
            height: 1,
            rgb: vec![0, 0, 0],
        }
    }

    #[tokio::test]
    async fn test_vp8_codec_string_is_shortened() {
        let mut decoder = MockFrameDecoder::new();
        decoder
            .expect_configure()
            .withf(|c| c.codec == "vp8" && c.coded_width == 640)
            .times(1)
            .returning(|_| Ok(()));
        let mut orchestrator = DecodeOrchestrator::new(decoder);
        let applied = orchestrator.configure(&config("vp08.00.41.08")).await.unwrap();
        assert_eq!(applied.codec, "vp8");
        assert!(orchestrator.configure(&config("vp08.00.41.08")).await.is_err());
    }

    #[tokio::test]
    async fn test_samples_are_fed_in_order_and_frames_numbered() {
        let mut decoder = MockFrameDecoder::new();
        let mut seq = Sequence::new();
        decoder
            .expect_configure()
            .with(eq(config("avc1.64001f")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        decoder
            .expect_decode()
            .withf(|c| c.timestamp_us == 0 && c.chunk_type == ChunkType::Key)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Vec::new()));
        decoder
            .expect_decode()
            .withf(|c| c.timestamp_us == 33_333 && c.chunk_type == ChunkType::Delta)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|c| {
                let previous = EncodedChunk {
                    timestamp_us: 0,
                    ..c.clone()
                };
                Ok(vec![picture(&previous), picture(&c)])
            });
        decoder
            .expect_flush()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| {
                Ok(vec![DecodedFrame {
                    timestamp_us: 66_666,
                    duration_us: None,
                    width: 1,
                    height: 1,
                    rgb: vec![0, 0, 0],
                }])
            });

        let mut orchestrator = DecodeOrchestrator::new(decoder);
        orchestrator.configure(&config("avc1.64001f")).await.unwrap();
        assert!(orchestrator.decode(sample(0, true)).await.unwrap().is_empty());
        let frames = orchestrator.decode(sample(33_333, false)).await.unwrap();
        assert_eq!(frames.iter().map(|f| f.index).collect::<Vec<_>>(), vec![0, 1]);
        let flushed = orchestrator.finish().await.unwrap();
        assert_eq!(flushed[0].index, 2);
        assert_eq!(orchestrator.frames_decoded(), 3);
    }

    #[tokio::test]
    async fn test_flush_failure_is_decoder_error() {
        let mut decoder = MockFrameDecoder::new();
        decoder.expect_configure().returning(|_| Ok(()));
        decoder
            .expect_flush()
            .returning(|| Err(DecodeError::new("device lost").into()));
        let mut orchestrator = DecodeOrchestrator::new(decoder);
        orchestrator.configure(&config("avc1.64001f")).await.unwrap();
        let err = orchestrator.finish().await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Decoder);
        assert!(matches!(err, CaptureError::Decode(_)));
        assert!(err.to_string().contains("device lost"));
    }

    #[tokio::test]
    async fn test_sample_before_configure_is_rejected() {
        let decoder = MockFrameDecoder::new();
        let mut orchestrator = DecodeOrchestrator::new(decoder);
        let err = orchestrator.decode(sample(0, true)).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Decoder);
    }
}

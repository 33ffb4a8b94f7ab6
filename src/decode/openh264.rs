use super::decoder::{DecodedFrame, EncodedChunk, FrameDecoder};
use crate::avc::{annex_b_unit, convert_sample_to_bytestream};
use crate::errors::{CaptureResult, DecodeError};
use crate::mp4::{AvccConfig, DecoderConfig};
use async_trait::async_trait;
use log::{debug, info, warn};
use openh264::decoder::{DecodedYUV, Decoder};
use openh264::formats::YUVSource;
use std::collections::VecDeque;

/// H.264 software decoder
#[derive(Default)]
pub struct OpenH264Decoder {
    decoder: Option<Decoder>,
    length_size: usize,
    /// Timing of submitted chunks not yet matched to an output picture
    pending: VecDeque<(i64, u64)>,
}

impl OpenH264Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn supports(codec: &str) -> bool {
        codec.starts_with("avc1") || codec.starts_with("avc3")
    }
}

#[async_trait(?Send)]
impl FrameDecoder for OpenH264Decoder {
    async fn configure(&mut self, config: DecoderConfig) -> CaptureResult<()> {
        if !Self::supports(&config.codec) {
            return Err(DecodeError::new(format!("Unsupported codec {}", config.codec)).into());
        }
        let avcc = AvccConfig::parse(&config.description)
            .map_err(|e| DecodeError::new(format!("Invalid avcC description: {}", e)))?;

        let mut decoder = Decoder::new()
            .map_err(|e| DecodeError::new(format!("Failed to create decoder: {}", e)))?;

        // Send SPS first
        for sps in avcc.sps.iter().take(1) {
            decoder.decode(&annex_b_unit(sps)).map_err(|e| {
                DecodeError::new(format!("Failed to initialize decoder with SPS: {}", e))
            })?;
        }
        for pps in avcc.pps.iter().take(1) {
            decoder.decode(&annex_b_unit(pps)).map_err(|e| {
                DecodeError::new(format!("Failed to initialize decoder with PPS: {}", e))
            })?;
        }

        info!(
            "Decoder configured for {} @ {}x{}",
            config.codec, config.coded_width, config.coded_height
        );
        self.length_size = avcc.nalu_length_size();
        self.decoder = Some(decoder);
        self.pending.clear();
        Ok(())
    }

    async fn decode(&mut self, chunk: EncodedChunk) -> CaptureResult<Vec<DecodedFrame>> {
        let decoder = self
            .decoder
            .as_mut()
            .ok_or_else(|| DecodeError::new("Decoder used before configure"))?;

        let bytestream = convert_sample_to_bytestream(&chunk.data, self.length_size)?;
        if bytestream.is_empty() {
            debug!("Sample at {}us has no slice data", chunk.timestamp_us);
            return Ok(Vec::new());
        }
        self.pending.push_back((chunk.timestamp_us, chunk.duration_us));

        match decoder.decode(&bytestream) {
            Ok(Some(yuv)) => {
                let timing = self
                    .pending
                    .pop_front()
                    .unwrap_or((chunk.timestamp_us, chunk.duration_us));
                Ok(vec![picture(&yuv, timing)])
            }
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(DecodeError::new(format!("H.264 decoding failed: {}", e)).into()),
        }
    }

    async fn flush(&mut self) -> CaptureResult<Vec<DecodedFrame>> {
        let decoder = self
            .decoder
            .as_mut()
            .ok_or_else(|| DecodeError::new("Decoder flushed before configure"))?;

        let remaining = decoder
            .flush_remaining()
            .map_err(|e| DecodeError::new(format!("Failed to flush decoder: {}", e)))?;

        let mut frames = Vec::with_capacity(remaining.len());
        for yuv in &remaining {
            let Some(timing) = self.pending.pop_front() else {
                warn!("Decoder returned more pictures than submitted chunks");
                break;
            };
            frames.push(picture(yuv, timing));
        }
        debug!("Flush returned {} buffered pictures", frames.len());

        if !self.pending.is_empty() {
            debug!("{} submitted chunks produced no picture", self.pending.len());
            self.pending.clear();
        }
        Ok(frames)
    }
}

/// Convert a decoded picture to RGB with the timing of the chunk it belongs to
fn picture(yuv: &DecodedYUV<'_>, (timestamp_us, duration_us): (i64, u64)) -> DecodedFrame {
    let (width, height) = yuv.dimensions();
    let mut rgb = vec![0u8; yuv.rgb8_len()];
    yuv.write_rgb8(&mut rgb);
    DecodedFrame {
        timestamp_us,
        duration_us: Some(duration_us),
        width: width as u32,
        height: height as u32,
        rgb,
    }
}

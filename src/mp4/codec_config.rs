//! Codec configuration boxes found inside a visual sample entry, and the decoder
//! configuration built from them.

use super::avcc::AvccConfig;
use super::r#box::write_box;
use super::trak::TrackInfo;
use crate::bits::reader::BitReader;
use crate::errors::CodecConfigError;
use serde::Serialize;
use std::io::Cursor;

/// HEVCDecoderConfigurationRecord fields needed for the codec string
#[derive(Debug, Clone, PartialEq)]
pub struct HvccConfig {
    pub profile_space: u8,
    pub tier_flag: bool,
    pub profile_idc: u8,
    pub compatibility_flags: u32,
    pub constraint_flags: [u8; 6],
    pub level_idc: u8,
    pub payload: Vec<u8>,
}

/// VPCodecConfigurationRecord fields (vpcC is a full box)
#[derive(Debug, Clone, PartialEq)]
pub struct VpccConfig {
    pub profile: u8,
    pub level: u8,
    pub bit_depth: u8,
    pub payload: Vec<u8>,
}

/// AV1CodecConfigurationRecord fields
#[derive(Debug, Clone, PartialEq)]
pub struct Av1cConfig {
    pub seq_profile: u8,
    pub seq_level_idx: u8,
    pub seq_tier: bool,
    pub bit_depth: u8,
    pub payload: Vec<u8>,
}

/// One recognized codec configuration box
#[derive(Debug, Clone, PartialEq)]
pub enum CodecConfigBox {
    Avc(AvccConfig),
    Hevc(HvccConfig),
    Vp(VpccConfig),
    Av1(Av1cConfig),
}

fn malformed(box_name: &str, reason: &str) -> CodecConfigError {
    CodecConfigError::Malformed {
        box_name: box_name.to_string(),
        reason: reason.to_string(),
    }
}

impl HvccConfig {
    pub fn parse(data: &[u8]) -> Result<Self, CodecConfigError> {
        if data.len() < 23 {
            return Err(malformed("hvcC", "record shorter than 23 bytes"));
        }
        let mut constraint_flags = [0u8; 6];
        constraint_flags.copy_from_slice(&data[6..12]);
        Ok(HvccConfig {
            profile_space: data[1] >> 6,
            tier_flag: data[1] & 0x20 != 0,
            profile_idc: data[1] & 0x1f,
            compatibility_flags: u32::from_be_bytes([data[2], data[3], data[4], data[5]]),
            constraint_flags,
            level_idc: data[12],
            payload: data.to_vec(),
        })
    }

    /// ISO/IEC 14496-15 Annex E codec string, e.g. `hvc1.1.6.L93.B0`
    pub fn codec_string(&self, fourcc: &str) -> String {
        let space = match self.profile_space {
            1 => "A",
            2 => "B",
            3 => "C",
            _ => "",
        };
        let mut codec = format!(
            "{}.{}{}.{:x}.{}{}",
            fourcc,
            space,
            self.profile_idc,
            self.compatibility_flags.reverse_bits(),
            if self.tier_flag { 'H' } else { 'L' },
            self.level_idc
        );
        let used = self
            .constraint_flags
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        for byte in &self.constraint_flags[..used] {
            codec.push_str(&format!(".{:02X}", byte));
        }
        codec
    }
}

impl VpccConfig {
    pub fn parse(data: &[u8]) -> Result<Self, CodecConfigError> {
        if data.len() < 7 {
            return Err(malformed("vpcC", "record shorter than 7 bytes"));
        }
        Ok(VpccConfig {
            profile: data[4],
            level: data[5],
            bit_depth: data[6] >> 4,
            payload: data.to_vec(),
        })
    }

    pub fn codec_string(&self, fourcc: &str) -> String {
        format!(
            "{}.{:02}.{:02}.{:02}",
            fourcc, self.profile, self.level, self.bit_depth
        )
    }
}

impl Av1cConfig {
    pub fn parse(data: &[u8]) -> Result<Self, CodecConfigError> {
        let mut reader = BitReader::new(Cursor::new(data));
        let marker = reader.read_flag();
        let version = reader.read(7);
        let seq_profile = reader.read(3) as u8;
        let seq_level_idx = reader.read(5) as u8;
        let seq_tier = reader.read_flag();
        let high_bitdepth = reader.read_flag();
        let twelve_bit = reader.read_flag();
        if reader.acc_error().is_some() {
            return Err(malformed("av1C", "record shorter than 3 bytes"));
        }
        if !marker || version != 1 {
            return Err(malformed("av1C", "bad marker or version"));
        }
        let bit_depth = match (high_bitdepth, twelve_bit) {
            (true, true) => 12,
            (true, false) => 10,
            _ => 8,
        };
        Ok(Av1cConfig {
            seq_profile,
            seq_level_idx,
            seq_tier,
            bit_depth,
            payload: data.to_vec(),
        })
    }

    pub fn codec_string(&self, fourcc: &str) -> String {
        format!(
            "{}.{}.{:02}{}.{:02}",
            fourcc,
            self.seq_profile,
            self.seq_level_idx,
            if self.seq_tier { 'H' } else { 'M' },
            self.bit_depth
        )
    }
}

impl CodecConfigBox {
    /// Parse `payload` when `name` is one of the recognized configuration boxes.
    pub fn parse(name: &str, payload: &[u8]) -> Option<Result<Self, CodecConfigError>> {
        let parsed = match name {
            "avcC" => AvccConfig::parse(payload).map(CodecConfigBox::Avc),
            "hvcC" => HvccConfig::parse(payload).map(CodecConfigBox::Hevc),
            "vpcC" => VpccConfig::parse(payload).map(CodecConfigBox::Vp),
            "av1C" => Av1cConfig::parse(payload).map(CodecConfigBox::Av1),
            _ => return None,
        };
        Some(parsed)
    }

    pub fn box_name(&self) -> &'static str {
        match self {
            CodecConfigBox::Avc(_) => "avcC",
            CodecConfigBox::Hevc(_) => "hvcC",
            CodecConfigBox::Vp(_) => "vpcC",
            CodecConfigBox::Av1(_) => "av1C",
        }
    }

    pub fn codec_string(&self, fourcc: &str) -> String {
        match self {
            CodecConfigBox::Avc(c) => c.codec_string(fourcc),
            CodecConfigBox::Hevc(c) => c.codec_string(fourcc),
            CodecConfigBox::Vp(c) => c.codec_string(fourcc),
            CodecConfigBox::Av1(c) => c.codec_string(fourcc),
        }
    }

    /// Bytes handed to the decoder as its configuration description.
    ///
    /// AVC gets a rebuilt record. Other families get the box serialized back to its
    /// on-disk form with the 8-byte header removed.
    pub fn descriptor(&self) -> Result<Vec<u8>, CodecConfigError> {
        let payload = match self {
            CodecConfigBox::Avc(c) => return c.to_decoder_record(),
            CodecConfigBox::Hevc(c) => &c.payload,
            CodecConfigBox::Vp(c) => &c.payload,
            CodecConfigBox::Av1(c) => &c.payload,
        };
        strip_box_header(self.box_name(), &write_box(self.box_name(), payload))
    }
}

/// Drop the 8-byte size and type header from a serialized box.
pub fn strip_box_header(box_name: &str, serialized: &[u8]) -> Result<Vec<u8>, CodecConfigError> {
    if serialized.len() < 8 {
        return Err(CodecConfigError::Undersized {
            box_name: box_name.to_string(),
            len: serialized.len(),
        });
    }
    Ok(serialized[8..].to_vec())
}

/// Everything needed to configure a decoder, built once per session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoderConfig {
    pub codec: String,
    pub coded_width: u32,
    pub coded_height: u32,
    #[serde(skip)]
    pub description: Vec<u8>,
    pub total_frames: u32,
    pub duration_seconds: f64,
}

impl DecoderConfig {
    pub fn from_track(track: &TrackInfo) -> Result<Self, CodecConfigError> {
        let config = track
            .entry
            .config
            .as_ref()
            .ok_or_else(|| CodecConfigError::Absent {
                entry: track.entry.fourcc.clone(),
            })?;
        Ok(DecoderConfig {
            codec: config.codec_string(&track.entry.fourcc),
            coded_width: track.entry.width as u32,
            coded_height: track.entry.height as u32,
            description: config.descriptor()?,
            total_frames: track.sample_count,
            duration_seconds: track.duration_seconds(),
        })
    }
}

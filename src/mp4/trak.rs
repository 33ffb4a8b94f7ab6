use super::mdhd::{parse_hdlr, parse_mdhd};
use super::r#box::{find_box, require_box};
use super::sample_table::{build_sample_table, SampleRef};
use super::stsd::{parse_stsd, SampleEntry};
use super::tkhd::parse_tkhd_track_id;
use crate::errors::CaptureResult;

/// The selected video track, built once per session
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub track_id: u32,
    pub timescale: u32,
    /// Samples listed in the sample table (zero for fragmented files)
    pub sample_count: u32,
    /// Duration in timescale units
    pub duration: u64,
    pub entry: SampleEntry,
}

impl TrackInfo {
    /// Sample entry fourCC, e.g. `avc1`
    pub fn codec(&self) -> &str {
        &self.entry.fourcc
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.timescale == 0 {
            return 0.0;
        }
        self.duration as f64 / self.timescale as f64
    }
}

/// A video trak with its progressive sample table
#[derive(Debug, Clone)]
pub struct VideoTrak {
    pub info: TrackInfo,
    pub samples: Vec<SampleRef>,
}

/// Parse a trak box, returning `None` when its handler is not `vide`
pub fn parse_video_trak(trak: &[u8]) -> CaptureResult<Option<VideoTrak>> {
    let mdia = require_box(trak, "mdia", "trak")?;
    let is_video = find_box(mdia, "hdlr").and_then(parse_hdlr) == Some("vide");
    if !is_video {
        return Ok(None);
    }

    let track_id = parse_tkhd_track_id(require_box(trak, "tkhd", "trak")?)?;
    let (timescale, duration) = parse_mdhd(require_box(mdia, "mdhd", "mdia")?)?;
    let minf = require_box(mdia, "minf", "mdia")?;
    let stbl = require_box(minf, "stbl", "minf")?;
    let entry = parse_stsd(require_box(stbl, "stsd", "stbl")?)?;
    let samples = build_sample_table(stbl)?;

    Ok(Some(VideoTrak {
        info: TrackInfo {
            track_id,
            timescale,
            sample_count: samples.len() as u32,
            duration,
            entry,
        },
        samples,
    }))
}

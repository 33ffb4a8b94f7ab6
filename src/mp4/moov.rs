use super::mvhd::{parse_mehd, parse_mvhd};
use super::r#box::{find_box, require_box, BoxIter};
use super::sample_table::SampleRef;
use super::trak::{parse_video_trak, TrackInfo};
use crate::errors::{CaptureResult, Mp4Error};
use log::info;

/// Per-track fragment defaults from mvex/trex
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrexDefaults {
    pub track_id: u32,
    pub sample_description_index: u32,
    pub sample_duration: u32,
    pub sample_size: u32,
    pub sample_flags: u32,
}

impl TrexDefaults {
    pub fn parse(trex: &[u8]) -> Option<Self> {
        let field = |i: usize| {
            let b = trex.get(4 + i * 4..8 + i * 4)?;
            Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        };
        Some(TrexDefaults {
            track_id: field(0)?,
            sample_description_index: field(1)?,
            sample_duration: field(2)?,
            sample_size: field(3)?,
            sample_flags: field(4)?,
        })
    }
}

/// What the movie box tells us about the first video track
#[derive(Debug, Clone)]
pub struct Movie {
    pub track: TrackInfo,
    /// Progressive samples, in decode order
    pub samples: Vec<SampleRef>,
    pub trex: Option<TrexDefaults>,
    /// True when an mvex box announces movie fragments
    pub fragmented: bool,
}

/// Parse a complete moov payload and select its first video track
pub fn parse_moov(moov: &[u8]) -> CaptureResult<Movie> {
    let (movie_timescale, _) = parse_mvhd(require_box(moov, "mvhd", "moov")?)?;

    let mut video = None;
    for (name, trak) in BoxIter::new(moov) {
        if name != "trak" {
            continue;
        }
        if let Some(found) = parse_video_trak(trak)? {
            video = Some(found);
            break;
        }
    }
    let mut video =
        video.ok_or_else(|| Mp4Error::malformed("moov box does not contain a video track"))?;

    let mvex = find_box(moov, "mvex");
    let trex = mvex.and_then(|mvex| {
        BoxIter::new(mvex)
            .filter(|(name, _)| name == "trex")
            .filter_map(|(_, payload)| TrexDefaults::parse(payload))
            .find(|t| t.track_id == video.info.track_id)
    });

    // Fragmented files often leave mdhd duration at zero
    if video.info.duration == 0 {
        if let Some(fragment_duration) = mvex.and_then(|m| find_box(m, "mehd")).and_then(parse_mehd)
        {
            if movie_timescale > 0 {
                video.info.duration = fragment_duration * video.info.timescale as u64
                    / movie_timescale as u64;
            }
        }
    }

    info!(
        "Selected video track {} ({} @ {}x{}, {} samples, {:.2}s)",
        video.info.track_id,
        video.info.codec(),
        video.info.entry.width,
        video.info.entry.height,
        video.info.sample_count,
        video.info.duration_seconds()
    );

    Ok(Movie {
        track: video.info,
        samples: video.samples,
        trex,
        fragmented: mvex.is_some(),
    })
}

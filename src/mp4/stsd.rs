use super::codec_config::CodecConfigBox;
use super::r#box::BoxIter;
use crate::bits::reader::read_u16;
use crate::errors::{CaptureResult, Mp4Error};
use log::debug;

/// Bytes of a visual sample entry before its child boxes
const VISUAL_SAMPLE_ENTRY_SIZE: usize = 78;

/// First entry of a video track's sample description
#[derive(Debug, Clone, PartialEq)]
pub struct SampleEntry {
    /// Sample entry fourCC, e.g. `avc1`
    pub fourcc: String,
    pub width: u16,
    pub height: u16,
    /// First recognized codec configuration box, if any
    pub config: Option<CodecConfigBox>,
}

/// Parse the first visual sample entry of an stsd box
pub fn parse_stsd(stsd: &[u8]) -> CaptureResult<SampleEntry> {
    if stsd.len() < 8 {
        return Err(Mp4Error::malformed("stsd box too small: expected at least 8 bytes").into());
    }

    // Skip version and flags (4 bytes) and entry count (4 bytes)
    let entry_count = u32::from_be_bytes([stsd[4], stsd[5], stsd[6], stsd[7]]);
    let first = if entry_count == 0 {
        None
    } else {
        BoxIter::new(&stsd[8..]).next()
    };
    let (fourcc, entry) =
        first.ok_or_else(|| Mp4Error::malformed("stsd box has no sample entries"))?;

    if entry.len() < VISUAL_SAMPLE_ENTRY_SIZE {
        return Err(Mp4Error::malformed(format!(
            "{} sample entry too small: expected at least {} bytes, got {}",
            fourcc,
            VISUAL_SAMPLE_ENTRY_SIZE,
            entry.len()
        ))
        .into());
    }

    // Reserved (6) + data reference index (2) + pre-defined/reserved (16)
    let mut pos = 24;
    let width = read_u16(entry, &mut pos).unwrap_or(0);
    let height = read_u16(entry, &mut pos).unwrap_or(0);

    let mut config = None;
    for (name, payload) in BoxIter::new(&entry[VISUAL_SAMPLE_ENTRY_SIZE..]) {
        match CodecConfigBox::parse(&name, payload) {
            Some(parsed) => {
                config = Some(parsed?);
                break;
            }
            None => debug!("Skipping {} box in {} sample entry", name, fourcc),
        }
    }

    Ok(SampleEntry {
        fourcc,
        width,
        height,
        config,
    })
}

use crate::errors::{CaptureResult, Mp4Error};

/// Read the track ID from a tkhd box
pub fn parse_tkhd_track_id(tkhd: &[u8]) -> CaptureResult<u32> {
    let offset = if tkhd.first() == Some(&1) { 20 } else { 12 };
    tkhd.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| Mp4Error::malformed("tkhd box too small").into())
}

use super::r#box::require_box;
use crate::errors::{CaptureResult, Mp4Error};

#[derive(Debug, Clone, PartialEq)]
pub struct SttsEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

/// Parse stts (decoding time to sample) box
pub fn parse_stts(stbl: &[u8]) -> CaptureResult<Vec<SttsEntry>> {
    let stts = require_box(stbl, "stts", "stbl")?;

    if stts.len() < 8 {
        return Err(Mp4Error::malformed("stts box too small: expected at least 8 bytes").into());
    }

    let entry_count = u32::from_be_bytes([stts[4], stts[5], stts[6], stts[7]]);

    // Verify that the box has enough space for all entries
    let required_size = 8 + (entry_count as usize * 8);
    if required_size > stts.len() {
        return Err(Mp4Error::malformed(format!(
            "stts box too small for {} entries: expected {} bytes, got {}",
            entry_count,
            required_size,
            stts.len()
        ))
        .into());
    }

    let entries = stts[8..required_size]
        .chunks_exact(8)
        .map(|e| SttsEntry {
            sample_count: u32::from_be_bytes([e[0], e[1], e[2], e[3]]),
            sample_delta: u32::from_be_bytes([e[4], e[5], e[6], e[7]]),
        })
        .collect();

    Ok(entries)
}

/// Expand stts entries into per-sample (decode time, duration) pairs in timescale units
pub fn build_decode_times(entries: &[SttsEntry], sample_count: usize) -> Vec<(u64, u32)> {
    let mut times = Vec::with_capacity(sample_count);
    let mut dts = 0u64;

    'outer: for entry in entries {
        for _ in 0..entry.sample_count {
            if times.len() == sample_count {
                break 'outer;
            }
            times.push((dts, entry.sample_delta));
            dts += entry.sample_delta as u64;
        }
    }

    // Tables shorter than the sample count repeat the last delta
    let last_delta = entries.last().map(|e| e.sample_delta).unwrap_or(0);
    while times.len() < sample_count {
        times.push((dts, last_delta));
        dts += last_delta as u64;
    }

    times
}

use super::r#box::require_box;
use crate::errors::{CaptureResult, Mp4Error};

#[derive(Debug, Clone, PartialEq)]
pub struct SampleToChunkEntry {
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub sample_description_index: u32,
}

/// Parse stsc (sample to chunk) box
pub fn parse_stsc(stbl: &[u8]) -> CaptureResult<Vec<SampleToChunkEntry>> {
    let stsc = require_box(stbl, "stsc", "stbl")?;

    if stsc.len() < 8 {
        return Err(Mp4Error::malformed("stsc box too small: expected at least 8 bytes").into());
    }

    let entry_count = u32::from_be_bytes([stsc[4], stsc[5], stsc[6], stsc[7]]);

    // Verify that the box has enough space for all entries
    let required_size = 8 + (entry_count as usize * 12);
    if required_size > stsc.len() {
        return Err(Mp4Error::malformed(format!(
            "stsc box too small for {} entries: expected {} bytes, got {}",
            entry_count,
            required_size,
            stsc.len()
        ))
        .into());
    }

    let entries = stsc[8..required_size]
        .chunks_exact(12)
        .map(|e| SampleToChunkEntry {
            first_chunk: u32::from_be_bytes([e[0], e[1], e[2], e[3]]),
            samples_per_chunk: u32::from_be_bytes([e[4], e[5], e[6], e[7]]),
            sample_description_index: u32::from_be_bytes([e[8], e[9], e[10], e[11]]),
        })
        .collect();

    Ok(entries)
}

/// Number of samples in each chunk, for `chunk_count` chunks
pub fn samples_per_chunk(entries: &[SampleToChunkEntry], chunk_count: usize) -> Vec<u32> {
    let mut counts = Vec::with_capacity(chunk_count);
    for (i, entry) in entries.iter().enumerate() {
        let first = entry.first_chunk.max(1) as usize;
        let next_first = entries
            .get(i + 1)
            .map(|next| next.first_chunk as usize)
            .unwrap_or(chunk_count + 1);
        for _ in first..next_first.min(chunk_count + 1) {
            counts.push(entry.samples_per_chunk);
        }
    }
    counts.resize(chunk_count, 0);
    counts
}

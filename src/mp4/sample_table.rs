use super::ctts::parse_ctts;
use super::stco::parse_stco_or_co64;
use super::stsc::{parse_stsc, samples_per_chunk};
use super::stss::parse_stss;
use super::stsz::parse_stsz;
use super::stts::{build_decode_times, parse_stts};
use crate::errors::{CaptureResult, Mp4Error};
use std::collections::HashSet;

/// Most samples a single sample table or track run may declare
pub const MAX_SAMPLE_COUNT: usize = 1 << 22;

/// Reject a declared sample count above [`MAX_SAMPLE_COUNT`] before anything is allocated for it
pub fn check_sample_count(box_name: &str, count: u64) -> CaptureResult<usize> {
    if count > MAX_SAMPLE_COUNT as u64 {
        return Err(Mp4Error::malformed(format!(
            "{} box declares {} samples, limit is {}",
            box_name, count, MAX_SAMPLE_COUNT
        ))
        .into());
    }
    Ok(count as usize)
}

/// Location and timing of one sample, in file offsets and timescale units
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRef {
    pub offset: u64,
    pub size: u32,
    pub decode_time: u64,
    pub duration: u32,
    pub composition_offset: i32,
    pub is_sync: bool,
}

impl SampleRef {
    pub fn end(&self) -> u64 {
        self.offset + self.size as u64
    }

    /// Materialize the sample with its payload, converting times to microseconds.
    pub fn to_encoded(&self, timescale: u32, data: Vec<u8>) -> EncodedSample {
        let timescale = timescale.max(1) as i128;
        let cts = self.decode_time as i128 + self.composition_offset as i128;
        EncodedSample {
            timestamp_us: (cts * 1_000_000 / timescale) as i64,
            duration_us: (self.duration as i128 * 1_000_000 / timescale) as u64,
            is_sync: self.is_sync,
            data,
        }
    }
}

/// One encoded access unit handed to the decoder
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSample {
    /// Presentation timestamp in microseconds
    pub timestamp_us: i64,
    pub duration_us: u64,
    pub is_sync: bool,
    pub data: Vec<u8>,
}

/// Build the sample list of a progressive track from its stbl box, in decode order
pub fn build_sample_table(stbl: &[u8]) -> CaptureResult<Vec<SampleRef>> {
    let sizes = parse_stsz(stbl)?;
    if sizes.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_offsets = parse_stco_or_co64(stbl)?;
    let per_chunk = samples_per_chunk(&parse_stsc(stbl)?, chunk_offsets.len());
    let placeable: u64 = per_chunk.iter().map(|&c| c as u64).sum();
    if placeable < sizes.len() as u64 {
        return Err(Mp4Error::malformed(format!(
            "stsc/stco describe {} samples but stsz lists {}",
            placeable,
            sizes.len()
        ))
        .into());
    }
    let times = build_decode_times(&parse_stts(stbl)?, sizes.len());
    let composition = parse_ctts(stbl, sizes.len())?;
    // Every sample is a sync sample when stss is absent
    let sync: Option<HashSet<u32>> = parse_stss(stbl).map(|s| s.into_iter().collect());

    let mut samples = Vec::with_capacity(sizes.len());
    for (&chunk_offset, &count) in chunk_offsets.iter().zip(per_chunk.iter()) {
        let mut offset = chunk_offset;
        for _ in 0..count {
            let index = samples.len();
            let Some(&size) = sizes.get(index) else {
                break;
            };
            let (decode_time, duration) = times[index];
            samples.push(SampleRef {
                offset,
                size,
                decode_time,
                duration,
                composition_offset: composition.as_ref().map_or(0, |c| c[index]),
                is_sync: sync
                    .as_ref()
                    .map_or(true, |s| s.contains(&(index as u32 + 1))),
            });
            offset += size as u64;
        }
    }

    Ok(samples)
}

use super::r#box::find_box;
use crate::errors::{CaptureResult, Mp4Error};

/// Parse stco (chunk offset) or co64 box
pub fn parse_stco_or_co64(stbl: &[u8]) -> CaptureResult<Vec<u64>> {
    // Try stco first (32-bit offsets)
    if let Some(stco) = find_box(stbl, "stco") {
        let body = entry_table(stco, "stco", 4)?;
        return Ok(body
            .chunks_exact(4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64)
            .collect());
    }

    // Try co64 (64-bit offsets)
    if let Some(co64) = find_box(stbl, "co64") {
        let body = entry_table(co64, "co64", 8)?;
        return Ok(body
            .chunks_exact(8)
            .map(|b| u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect());
    }

    Err(Mp4Error::malformed("No chunk offset box found: missing both stco and co64").into())
}

fn entry_table<'a>(data: &'a [u8], name: &str, entry_size: usize) -> CaptureResult<&'a [u8]> {
    if data.len() < 8 {
        return Err(Mp4Error::malformed(format!(
            "{} box too small: expected at least 8 bytes",
            name
        ))
        .into());
    }
    let entry_count = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let required_size = 8 + entry_count * entry_size;
    data.get(8..required_size).ok_or_else(|| {
        Mp4Error::malformed(format!(
            "{} box too small for {} entries: expected {} bytes, got {}",
            name,
            entry_count,
            required_size,
            data.len()
        ))
        .into()
    })
}

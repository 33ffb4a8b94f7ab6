use super::r#box::find_box;
use crate::errors::{CaptureResult, Mp4Error};

/// Parse ctts (composition time to sample) box (optional), expanded to one offset per sample.
///
/// Version 0 offsets are unsigned on paper but read as signed, as encoders write them that way.
pub fn parse_ctts(stbl: &[u8], sample_count: usize) -> CaptureResult<Option<Vec<i32>>> {
    let Some(ctts) = find_box(stbl, "ctts") else {
        return Ok(None);
    };

    if ctts.len() < 8 {
        return Err(Mp4Error::malformed("ctts box too small: expected at least 8 bytes").into());
    }

    let entry_count = u32::from_be_bytes([ctts[4], ctts[5], ctts[6], ctts[7]]) as usize;
    let required_size = 8 + entry_count * 8;
    if required_size > ctts.len() {
        return Err(Mp4Error::malformed(format!(
            "ctts box too small for {} entries",
            entry_count
        ))
        .into());
    }

    let mut offsets = Vec::with_capacity(sample_count);
    for e in ctts[8..required_size].chunks_exact(8) {
        let count = u32::from_be_bytes([e[0], e[1], e[2], e[3]]) as usize;
        let offset = i32::from_be_bytes([e[4], e[5], e[6], e[7]]);
        let take = count.min(sample_count - offsets.len());
        offsets.extend(std::iter::repeat(offset).take(take));
    }
    offsets.resize(sample_count, 0);

    Ok(Some(offsets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::r#box::write_box;

    #[test]
    fn test_parse_ctts_expands_runs() {
        let mut payload = vec![0, 0, 0, 0, 0, 0, 0, 2];
        payload.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0x01, 0xf4]);
        payload.extend_from_slice(&[0, 0, 0, 2, 0xff, 0xff, 0xff, 0x9c]);
        let stbl = write_box("ctts", &payload);

        let offsets = parse_ctts(&stbl, 4).unwrap().unwrap();
        assert_eq!(offsets, vec![500, -100, -100, 0]);
        assert!(parse_ctts(&[], 4).unwrap().is_none());
    }
}

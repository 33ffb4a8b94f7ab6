use super::r#box::require_box;
use super::sample_table::check_sample_count;
use crate::errors::{CaptureResult, Mp4Error};

/// Parse stsz (sample size) box into one size per sample
pub fn parse_stsz(stbl: &[u8]) -> CaptureResult<Vec<u32>> {
    let stsz = require_box(stbl, "stsz", "stbl")?;

    if stsz.len() < 12 {
        return Err(Mp4Error::malformed("stsz box too small: expected at least 12 bytes").into());
    }

    let sample_size = u32::from_be_bytes([stsz[4], stsz[5], stsz[6], stsz[7]]);
    let sample_count = u32::from_be_bytes([stsz[8], stsz[9], stsz[10], stsz[11]]);

    if sample_size != 0 {
        let sample_count = check_sample_count("stsz", sample_count as u64)?;
        let mut sizes = Vec::new();
        sizes.try_reserve_exact(sample_count).map_err(|_| {
            Mp4Error::malformed(format!("stsz sample count {} is too large", sample_count))
        })?;
        sizes.resize(sample_count, sample_size);
        return Ok(sizes);
    }

    let sample_count = sample_count as usize;

    let required_size = 12 + sample_count * 4;
    if required_size > stsz.len() {
        return Err(Mp4Error::malformed(format!(
            "stsz box too small for {} samples: expected {} bytes, got {}",
            sample_count,
            required_size,
            stsz.len()
        ))
        .into());
    }

    Ok(stsz[12..required_size]
        .chunks_exact(4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::r#box::write_box;

    #[test]
    fn test_parse_stsz_constant_and_table() {
        let stbl = write_box("stsz", &[0, 0, 0, 0, 0, 0, 0, 9, 0, 0, 0, 3]);
        assert_eq!(parse_stsz(&stbl).unwrap(), vec![9, 9, 9]);

        let mut payload = vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2];
        payload.extend_from_slice(&[0, 0, 0, 10, 0, 0, 1, 0]);
        let stbl = write_box("stsz", &payload);
        assert_eq!(parse_stsz(&stbl).unwrap(), vec![10, 256]);
    }

    #[test]
    fn test_constant_size_count_is_bounded() {
        let stbl = write_box("stsz", &[0, 0, 0, 0, 0, 0, 0, 5, 0x40, 0, 0, 0]);
        let err = parse_stsz(&stbl).unwrap_err();
        assert!(err.to_string().contains("declares 1073741824 samples"));
    }

    #[test]
    fn test_missing_stsz_names_parent() {
        let err = parse_stsz(&[]).unwrap_err();
        assert_eq!(err.to_string(), "MP4 error: stsz box not found in stbl box");
    }
}

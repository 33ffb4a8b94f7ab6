use crate::errors::{CaptureResult, Mp4Error};

/// Parse mdhd box to get timescale and duration
pub fn parse_mdhd(mdhd: &[u8]) -> CaptureResult<(u32, u64)> {
    if mdhd.len() < 20 {
        return Err(Mp4Error::malformed("mdhd box too small").into());
    }

    let version = mdhd[0];
    if version == 1 {
        // Version 1: 64-bit values
        if mdhd.len() < 32 {
            return Err(Mp4Error::malformed("mdhd v1 box too small").into());
        }
        let timescale = u32::from_be_bytes([mdhd[20], mdhd[21], mdhd[22], mdhd[23]]);
        let duration = u64::from_be_bytes([
            mdhd[24], mdhd[25], mdhd[26], mdhd[27], mdhd[28], mdhd[29], mdhd[30], mdhd[31],
        ]);
        Ok((timescale, duration))
    } else {
        // Version 0: 32-bit values
        let timescale = u32::from_be_bytes([mdhd[12], mdhd[13], mdhd[14], mdhd[15]]);
        let duration = u32::from_be_bytes([mdhd[16], mdhd[17], mdhd[18], mdhd[19]]) as u64;
        Ok((timescale, duration))
    }
}

/// Read the handler type of an hdlr box ("vide", "soun", ...)
pub fn parse_hdlr(hdlr: &[u8]) -> Option<&str> {
    if hdlr.len() < 12 {
        return None;
    }
    std::str::from_utf8(&hdlr[8..12]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mdhd_versions() {
        let mut v0 = vec![0u8; 24];
        v0[12..16].copy_from_slice(&90_000u32.to_be_bytes());
        v0[16..20].copy_from_slice(&900_000u32.to_be_bytes());
        assert_eq!(parse_mdhd(&v0).unwrap(), (90_000, 900_000));

        let mut v1 = vec![0u8; 36];
        v1[0] = 1;
        v1[20..24].copy_from_slice(&1_000u32.to_be_bytes());
        v1[24..32].copy_from_slice(&(u32::MAX as u64 + 5).to_be_bytes());
        assert_eq!(parse_mdhd(&v1).unwrap(), (1_000, u32::MAX as u64 + 5));

        v1.truncate(28);
        assert!(parse_mdhd(&v1).is_err());
    }
}

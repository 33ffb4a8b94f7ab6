use crate::errors::{CaptureResult, Mp4Error};

/// Extract timescale and duration from an mvhd box
pub fn parse_mvhd(mvhd: &[u8]) -> CaptureResult<(u32, u64)> {
    if mvhd.len() < 20 {
        return Err(Mp4Error::malformed("mvhd box too small").into());
    }

    match mvhd[0] {
        0 => {
            let timescale = u32::from_be_bytes([mvhd[12], mvhd[13], mvhd[14], mvhd[15]]);
            let duration = u32::from_be_bytes([mvhd[16], mvhd[17], mvhd[18], mvhd[19]]);
            Ok((timescale, duration as u64))
        }
        1 => {
            if mvhd.len() < 32 {
                return Err(Mp4Error::malformed("mvhd v1 box too small").into());
            }
            let timescale = u32::from_be_bytes([mvhd[20], mvhd[21], mvhd[22], mvhd[23]]);
            let duration = u64::from_be_bytes([
                mvhd[24], mvhd[25], mvhd[26], mvhd[27], mvhd[28], mvhd[29], mvhd[30], mvhd[31],
            ]);
            Ok((timescale, duration))
        }
        version => Err(Mp4Error::malformed(format!("unsupported mvhd version {}", version)).into()),
    }
}

/// Fragment duration from an mehd box, in movie timescale units
pub fn parse_mehd(mehd: &[u8]) -> Option<u64> {
    match *mehd.first()? {
        1 => {
            let bytes = mehd.get(4..12)?;
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            Some(u64::from_be_bytes(buf))
        }
        _ => {
            let bytes = mehd.get(4..8)?;
            Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64)
        }
    }
}

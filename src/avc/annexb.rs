use crate::avc::nalus::{extract_nalus_from_bytestream, extract_nalus_from_sample};
use crate::errors::{CaptureResult, DecodeError};

const START_CODE: [u8; 4] = [0, 0, 0, 1];

/// Prefix a single NAL unit with a start code.
pub fn annex_b_unit(nalu: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(nalu.len() + 4);
    out.extend_from_slice(&START_CODE);
    out.extend_from_slice(nalu);
    out
}

/// Replace length prefixes in a sample with start codes (Annex B).
///
/// Parameter sets inside the sample are dropped since the decoder is primed with them.
pub fn convert_sample_to_bytestream(sample: &[u8], length_size: usize) -> CaptureResult<Vec<u8>> {
    let nalus = extract_nalus_from_sample(sample, length_size).ok_or_else(|| {
        DecodeError::new(format!(
            "sample of {} bytes is not a valid {}-byte length-prefixed NAL sequence",
            sample.len(),
            length_size
        ))
    })?;

    let mut out = Vec::with_capacity(sample.len() + nalus.len() * 4);
    for nalu in nalus.iter().filter(|n| !n.is_parameter_set()) {
        out.extend_from_slice(&START_CODE);
        out.extend_from_slice(&nalu.data);
    }
    Ok(out)
}

/// Convert a bytestream with Annex B start codes to a sample using 4-byte lengths.
pub fn convert_bytestream_to_sample(stream: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for nalu in extract_nalus_from_bytestream(stream) {
        out.extend_from_slice(&(nalu.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&nalu.data);
    }
    out
}

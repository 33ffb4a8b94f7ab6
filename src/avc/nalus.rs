use crate::avc::avc_type::NaluType;

/// Represents a NAL unit with its type and data
#[derive(Debug, Clone, PartialEq)]
pub struct Nalu {
    pub nalu_type: NaluType,
    pub data: Vec<u8>,
}

impl Nalu {
    /// Create a NALU from raw data
    pub fn new(data: Vec<u8>) -> Option<Self> {
        let nalu_type = NaluType::from_header_byte(*data.first()?);
        Some(Nalu { nalu_type, data })
    }

    /// Check if this NALU is a parameter set (SPS/PPS)
    pub fn is_parameter_set(&self) -> bool {
        matches!(self.nalu_type, NaluType::SPS | NaluType::PPS)
    }
}

/// Extract NAL units from a sample whose units carry `length_size`-byte big endian lengths.
/// If the sample is malformed, `None` is returned.
pub fn extract_nalus_from_sample(sample: &[u8], length_size: usize) -> Option<Vec<Nalu>> {
    if !(1..=4).contains(&length_size) {
        return None;
    }
    let mut pos = 0usize;
    let mut nalus = Vec::new();
    while pos < sample.len() {
        let prefix = sample.get(pos..pos + length_size)?;
        let len = prefix.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
        pos += length_size;
        let body = sample.get(pos..pos + len)?;
        if let Some(nalu) = Nalu::new(body.to_vec()) {
            nalus.push(nalu);
        }
        pos += len;
    }
    Some(nalus)
}

/// Extract NAL units from a bytestream with Annex B start codes.
pub fn extract_nalus_from_bytestream(stream: &[u8]) -> Vec<Nalu> {
    let mut nalus = Vec::new();
    let mut pos = 0usize;
    let mut curr_start: Option<usize> = None;

    let push = |start: usize, end: usize, nalus: &mut Vec<Nalu>| {
        let mut end = end;
        while end > start && stream[end - 1] == 0 {
            end -= 1;
        }
        if let Some(nalu) = Nalu::new(stream[start..end].to_vec()) {
            nalus.push(nalu);
        }
    };

    while pos + 3 <= stream.len() {
        let code_len = if stream[pos..].starts_with(&[0, 0, 0, 1]) {
            4
        } else if stream[pos..].starts_with(&[0, 0, 1]) {
            3
        } else {
            pos += 1;
            continue;
        };
        if let Some(s) = curr_start {
            push(s, pos, &mut nalus);
        }
        curr_start = Some(pos + code_len);
        pos += code_len;
    }

    if let Some(s) = curr_start {
        push(s, stream.len(), &mut nalus);
    }
    nalus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_two_byte_length_prefixes() {
        let sample = [0, 2, 0x65, 0xaa, 0, 1, 0x06];
        let nalus = extract_nalus_from_sample(&sample, 2).unwrap();
        assert_eq!(nalus.len(), 2);
        assert_eq!(nalus[0].nalu_type, NaluType::IDR);
        assert_eq!(nalus[1].nalu_type, NaluType::SEI);
    }

    #[test]
    fn test_truncated_sample_is_rejected() {
        assert!(extract_nalus_from_sample(&[0, 0, 0, 9, 0x65], 4).is_none());
    }

    #[test]
    fn test_bytestream_split_on_both_start_codes() {
        let stream = [0, 0, 0, 1, 0x67, 1, 0, 0, 1, 0x68, 2, 0, 0, 0, 1, 0x65, 3];
        let types: Vec<_> = extract_nalus_from_bytestream(&stream)
            .into_iter()
            .map(|n| n.nalu_type)
            .collect();
        assert_eq!(types, vec![NaluType::SPS, NaluType::PPS, NaluType::IDR]);
    }
}

//! A module for parsing and rebuilding AVCConfigurationBox (avcC) data.
//! Parses SPS and PPS NAL units for H.264 streams in AVCC format and rebuilds the
//! decoder configuration record handed to decoders.

use crate::errors::CodecConfigError;
use log::warn;

/// Represents the parsed AVCDecoderConfigurationRecord (avcC) configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AvccConfig {
    /// configurationVersion
    pub configuration_version: u8,
    /// AVCProfileIndication
    pub profile: u8,
    /// profileCompatibility
    pub compatibility: u8,
    /// AVCLevelIndication
    pub level: u8,
    /// lengthSizeMinusOne
    pub length_size_minus_one: u8,
    /// Sequence Parameter Sets
    pub sps: Vec<Vec<u8>>,
    /// Picture Parameter Sets
    pub pps: Vec<Vec<u8>>,
}

fn malformed(reason: &str) -> CodecConfigError {
    CodecConfigError::Malformed {
        box_name: "avcC".to_string(),
        reason: reason.to_string(),
    }
}

/// Read `count` parameter sets, each prefixed by a 16-bit length.
fn read_parameter_sets(
    data: &[u8],
    pos: &mut usize,
    count: usize,
    kind: &str,
) -> Result<Vec<Vec<u8>>, CodecConfigError> {
    let mut sets = Vec::with_capacity(count);
    for _ in 0..count {
        if *pos + 2 > data.len() {
            return Err(malformed(&format!(
                "Unexpected EOF while reading {} length",
                kind
            )));
        }
        let len = u16::from_be_bytes([data[*pos], data[*pos + 1]]) as usize;
        *pos += 2;
        if *pos + len > data.len() {
            return Err(malformed(&format!("Unexpected EOF while reading {} data", kind)));
        }
        sets.push(data[*pos..*pos + len].to_vec());
        *pos += len;
    }
    Ok(sets)
}

impl AvccConfig {
    /// Parse AVCDecoderConfigurationRecord as defined in ISO/IEC 14496-15.
    ///
    /// data: full contents of the avcC box (excluding header).
    pub fn parse(data: &[u8]) -> Result<Self, CodecConfigError> {
        if data.len() < 7 {
            return Err(malformed("avcC data too short"));
        }
        let configuration_version = data[0];
        let profile = data[1];
        let compatibility = data[2];
        let level = data[3];
        // lengthSizeMinusOne: 6 bits reserved + 2 bits
        let length_size_minus_one = data[4] & 0x03;
        // numOfSequenceParameterSets: 3 bits reserved + 5 bits count
        let num_sps = (data[5] & 0x1F) as usize;
        let mut pos = 6;
        let sps = read_parameter_sets(data, &mut pos, num_sps, "SPS")?;

        if pos >= data.len() {
            return Err(malformed("Unexpected EOF while reading PPS count"));
        }
        let num_pps = data[pos] as usize;
        pos += 1;
        let pps = read_parameter_sets(data, &mut pos, num_pps, "PPS")?;

        Ok(AvccConfig {
            configuration_version,
            profile,
            compatibility,
            level,
            length_size_minus_one,
            sps,
            pps,
        })
    }

    /// Size in bytes of the NAL unit length prefix used by samples.
    pub fn nalu_length_size(&self) -> usize {
        self.length_size_minus_one as usize + 1
    }

    /// Rebuild a decoder configuration record field by field.
    ///
    /// Only the first SPS and the first PPS are embedded, and the counts written
    /// describe what was embedded.
    pub fn to_decoder_record(&self) -> Result<Vec<u8>, CodecConfigError> {
        let sps = self.sps.first().ok_or_else(|| malformed("no SPS present"))?;
        let pps = self.pps.first().ok_or_else(|| malformed("no PPS present"))?;
        if sps.len() > u16::MAX as usize || pps.len() > u16::MAX as usize {
            return Err(malformed("parameter set longer than 65535 bytes"));
        }
        if self.sps.len() > 1 || self.pps.len() > 1 {
            warn!(
                "avcC declares {} SPS and {} PPS; only the first of each is embedded",
                self.sps.len(),
                self.pps.len()
            );
        }

        let mut record = Vec::with_capacity(11 + sps.len() + pps.len());
        record.push(self.configuration_version);
        record.push(self.profile);
        record.push(self.compatibility);
        record.push(self.level);
        record.push(0xFC | self.length_size_minus_one);
        record.push(0xE0 | 1);
        record.extend_from_slice(&(sps.len() as u16).to_be_bytes());
        record.extend_from_slice(sps);
        record.push(1);
        record.extend_from_slice(&(pps.len() as u16).to_be_bytes());
        record.extend_from_slice(pps);
        Ok(record)
    }

    /// RFC 6381 codec parameter, e.g. `avc1.64001f`
    pub fn codec_string(&self, fourcc: &str) -> String {
        format!(
            "{}.{:02x}{:02x}{:02x}",
            fourcc, self.profile, self.compatibility, self.level
        )
    }
}

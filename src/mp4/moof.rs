//! Movie fragment (moof/traf/tfhd/tfdt/trun) parsing.

use super::moov::TrexDefaults;
use super::r#box::{find_box, require_box, BoxIter};
use super::sample_table::{check_sample_count, SampleRef};
use crate::bits::reader::{read_i32, read_u24, read_u32, read_u64, read_u8};
use crate::errors::{CaptureResult, Mp4Error};

const TFHD_BASE_DATA_OFFSET: u32 = 0x01;
const TFHD_SAMPLE_DESCRIPTION_INDEX: u32 = 0x02;
const TFHD_DEFAULT_DURATION: u32 = 0x08;
const TFHD_DEFAULT_SIZE: u32 = 0x10;
const TFHD_DEFAULT_FLAGS: u32 = 0x20;
const TFHD_DEFAULT_BASE_IS_MOOF: u32 = 0x020000;

const TRUN_DATA_OFFSET: u32 = 0x01;
const TRUN_FIRST_SAMPLE_FLAGS: u32 = 0x04;
const TRUN_DURATION: u32 = 0x100;
const TRUN_SIZE: u32 = 0x200;
const TRUN_FLAGS: u32 = 0x400;
const TRUN_CTS_OFFSET: u32 = 0x800;

/// `sample_is_non_sync_sample` bit of the sample flags
const NON_SYNC_SAMPLE: u32 = 0x0001_0000;

#[derive(Debug, Default, PartialEq)]
struct TrackFragmentHeader {
    track_id: u32,
    base_data_offset: Option<u64>,
    default_duration: Option<u32>,
    default_size: Option<u32>,
    default_flags: Option<u32>,
    default_base_is_moof: bool,
}

fn truncated(name: &str) -> Mp4Error {
    Mp4Error::malformed(format!("{} box truncated", name))
}

fn parse_tfhd(tfhd: &[u8]) -> CaptureResult<TrackFragmentHeader> {
    let mut pos = 1;
    let flags = read_u24(tfhd, &mut pos).ok_or_else(|| truncated("tfhd"))?;
    let mut header = TrackFragmentHeader {
        track_id: read_u32(tfhd, &mut pos).ok_or_else(|| truncated("tfhd"))?,
        default_base_is_moof: flags & TFHD_DEFAULT_BASE_IS_MOOF != 0,
        ..Default::default()
    };
    if flags & TFHD_BASE_DATA_OFFSET != 0 {
        header.base_data_offset = Some(read_u64(tfhd, &mut pos).ok_or_else(|| truncated("tfhd"))?);
    }
    if flags & TFHD_SAMPLE_DESCRIPTION_INDEX != 0 {
        read_u32(tfhd, &mut pos).ok_or_else(|| truncated("tfhd"))?;
    }
    if flags & TFHD_DEFAULT_DURATION != 0 {
        header.default_duration = Some(read_u32(tfhd, &mut pos).ok_or_else(|| truncated("tfhd"))?);
    }
    if flags & TFHD_DEFAULT_SIZE != 0 {
        header.default_size = Some(read_u32(tfhd, &mut pos).ok_or_else(|| truncated("tfhd"))?);
    }
    if flags & TFHD_DEFAULT_FLAGS != 0 {
        header.default_flags = Some(read_u32(tfhd, &mut pos).ok_or_else(|| truncated("tfhd"))?);
    }
    Ok(header)
}

fn parse_tfdt(tfdt: &[u8]) -> Option<u64> {
    let mut pos = 0;
    let version = read_u8(tfdt, &mut pos)?;
    pos = 4;
    if version == 1 {
        read_u64(tfdt, &mut pos)
    } else {
        read_u32(tfdt, &mut pos).map(u64::from)
    }
}

/// Per-sample values used when a trun omits the field
#[derive(Debug, Clone, Copy)]
struct SampleDefaults {
    duration: u32,
    size: u32,
    flags: u32,
}

/// Collect the samples of `track_id` described by one moof box.
///
/// `moof_start` is the file offset of the moof header. `next_decode_time` carries the
/// decode time across fragments that omit tfdt.
pub fn parse_moof(
    moof: &[u8],
    moof_start: u64,
    track_id: u32,
    trex: Option<&TrexDefaults>,
    next_decode_time: &mut u64,
) -> CaptureResult<Vec<SampleRef>> {
    let mut samples = Vec::new();
    // Implicit base of a traf without base_data_offset or default-base-is-moof
    let mut previous_end = moof_start;

    for (name, traf) in BoxIter::new(moof) {
        if name != "traf" {
            continue;
        }
        let tfhd = parse_tfhd(require_box(traf, "tfhd", "traf")?)?;
        let base = match tfhd.base_data_offset {
            Some(offset) => offset,
            None if tfhd.default_base_is_moof => moof_start,
            None => previous_end,
        };

        if tfhd.track_id != track_id {
            // Other tracks still move the implicit base of the next traf
            let defaults = SampleDefaults {
                duration: tfhd.default_duration.unwrap_or(0),
                size: tfhd.default_size.unwrap_or(0),
                flags: tfhd.default_flags.unwrap_or(0),
            };
            let mut other = Vec::new();
            previous_end = parse_runs(traf, base, defaults, &mut 0, &mut other)?;
            continue;
        }

        if let Some(base_time) = find_box(traf, "tfdt").and_then(parse_tfdt) {
            *next_decode_time = base_time;
        }
        let defaults = SampleDefaults {
            duration: tfhd
                .default_duration
                .or(trex.map(|t| t.sample_duration))
                .unwrap_or(0),
            size: tfhd.default_size.or(trex.map(|t| t.sample_size)).unwrap_or(0),
            flags: tfhd
                .default_flags
                .or(trex.map(|t| t.sample_flags))
                .unwrap_or(0),
        };
        previous_end = parse_runs(traf, base, defaults, next_decode_time, &mut samples)?;
    }

    Ok(samples)
}

/// Append the samples of every trun in `traf` and return the end of their data
fn parse_runs(
    traf: &[u8],
    base: u64,
    defaults: SampleDefaults,
    decode_time: &mut u64,
    samples: &mut Vec<SampleRef>,
) -> CaptureResult<u64> {
    let mut data_end = base;

    for (name, trun) in BoxIter::new(traf) {
        if name != "trun" {
            continue;
        }
        let mut pos = 1;
        let flags = read_u24(trun, &mut pos).ok_or_else(|| truncated("trun"))?;
        let sample_count = read_u32(trun, &mut pos).ok_or_else(|| truncated("trun"))?;
        if flags & TRUN_DATA_OFFSET != 0 {
            let data_offset = read_i32(trun, &mut pos).ok_or_else(|| truncated("trun"))?;
            data_end = base.checked_add_signed(data_offset as i64).ok_or_else(|| {
                Mp4Error::malformed(format!("trun data offset {} before file start", data_offset))
            })?;
        }
        let first_sample_flags = if flags & TRUN_FIRST_SAMPLE_FLAGS != 0 {
            Some(read_u32(trun, &mut pos).ok_or_else(|| truncated("trun"))?)
        } else {
            None
        };

        let sample_count =
            check_sample_count("trun", samples.len() as u64 + sample_count as u64)? - samples.len();
        let field_bytes = 4 * [TRUN_DURATION, TRUN_SIZE, TRUN_FLAGS, TRUN_CTS_OFFSET]
            .iter()
            .filter(|&&field| flags & field != 0)
            .count();
        if trun.len().saturating_sub(pos) < sample_count * field_bytes {
            return Err(Mp4Error::malformed(format!(
                "trun box too small for {} samples of {} bytes",
                sample_count, field_bytes
            ))
            .into());
        }
        samples.try_reserve(sample_count).map_err(|_| {
            Mp4Error::malformed(format!("trun sample count {} is too large", sample_count))
        })?;

        for i in 0..sample_count {
            let mut field = |flag: u32| -> CaptureResult<Option<u32>> {
                if flags & flag == 0 {
                    return Ok(None);
                }
                read_u32(trun, &mut pos)
                    .map(Some)
                    .ok_or_else(|| truncated("trun").into())
            };
            let duration = field(TRUN_DURATION)?.unwrap_or(defaults.duration);
            let size = field(TRUN_SIZE)?.unwrap_or(defaults.size);
            let sample_flags = field(TRUN_FLAGS)?;
            let composition_offset = field(TRUN_CTS_OFFSET)?.map_or(0, |v| v as i32);

            let sample_flags = match (i, first_sample_flags) {
                (0, Some(first)) => first,
                _ => sample_flags.unwrap_or(defaults.flags),
            };

            samples.push(SampleRef {
                offset: data_end,
                size,
                decode_time: *decode_time,
                duration,
                composition_offset,
                is_sync: sample_flags & NON_SYNC_SAMPLE == 0,
            });
            data_end = data_end.saturating_add(size as u64);
            *decode_time = decode_time.saturating_add(duration as u64);
        }
    }

    Ok(data_end)
}

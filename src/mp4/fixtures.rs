//! Synthetic MP4 files for unit tests.

use super::r#box::write_box;

/// SPS/PPS of a 320x180 Main profile stream (first frames of `testdata/video.h264`)
pub const SPS: [u8; 28] = [
    0x67, 0x4d, 0x40, 0x1e, 0xec, 0xc0, 0x50, 0x17, 0xfc, 0xb8, 0x0b, 0x50, 0x10, 0x10, 0x14,
    0x00, 0x00, 0x03, 0x01, 0xf4, 0x00, 0x00, 0x5d, 0xa8, 0x3c, 0x58, 0xb6, 0x68,
];
pub const PPS: [u8; 5] = [0x68, 0xe9, 0x79, 0xcb, 0x20];

pub const TIMESCALE: u32 = 30_000;
/// One frame at 30 fps
pub const FRAME_TICKS: u32 = 1_000;

#[derive(Debug, Clone)]
pub struct FixtureSample {
    pub data: Vec<u8>,
    pub duration: u32,
    pub sync: bool,
}

/// `count` length-prefixed samples with a key frame every `gop` samples
pub fn samples(count: usize, gop: usize) -> Vec<FixtureSample> {
    (0..count)
        .map(|i| {
            let sync = i % gop == 0;
            let nal_header = if sync { 0x65 } else { 0x41 };
            let mut data = 5u32.to_be_bytes().to_vec();
            data.push(nal_header);
            data.extend_from_slice(&(i as u32).to_be_bytes());
            FixtureSample {
                data,
                duration: FRAME_TICKS,
                sync,
            }
        })
        .collect()
}

pub fn full_box(name: &str, version: u8, flags: u32, body: &[u8]) -> Vec<u8> {
    let mut payload = ((version as u32) << 24 | flags).to_be_bytes().to_vec();
    payload.extend_from_slice(body);
    write_box(name, &payload)
}

fn u32s(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

pub fn avcc_record() -> Vec<u8> {
    let mut record = vec![1, SPS[1], SPS[2], SPS[3], 0xff, 0xe1];
    record.extend_from_slice(&(SPS.len() as u16).to_be_bytes());
    record.extend_from_slice(&SPS);
    record.push(1);
    record.extend_from_slice(&(PPS.len() as u16).to_be_bytes());
    record.extend_from_slice(&PPS);
    record
}

/// Visual sample entry box with the given child boxes
pub fn visual_sample_entry(fourcc: &str, width: u16, height: u16, children: &[u8]) -> Vec<u8> {
    let mut payload = vec![0u8; 78];
    payload[7] = 1; // data reference index
    payload[24..26].copy_from_slice(&width.to_be_bytes());
    payload[26..28].copy_from_slice(&height.to_be_bytes());
    payload[28..32].copy_from_slice(&0x0048_0000u32.to_be_bytes());
    payload[32..36].copy_from_slice(&0x0048_0000u32.to_be_bytes());
    payload[40..42].copy_from_slice(&1u16.to_be_bytes()); // frame count
    payload[74..76].copy_from_slice(&0x0018u16.to_be_bytes()); // depth
    payload[76..78].copy_from_slice(&0xffffu16.to_be_bytes());
    payload.extend_from_slice(children);
    write_box(fourcc, &payload)
}

pub fn avc1_entry() -> Vec<u8> {
    let children = [write_box("avcC", &avcc_record()), write_box("pasp", &u32s(&[1, 1]))].concat();
    visual_sample_entry("avc1", 320, 180, &children)
}

pub fn stsd(entry: &[u8]) -> Vec<u8> {
    full_box("stsd", 0, 0, &[&u32s(&[1])[..], entry].concat())
}

pub fn hdlr(handler: &str) -> Vec<u8> {
    let mut body = vec![0u8; 4];
    body.extend_from_slice(handler.as_bytes());
    body.extend_from_slice(&[0u8; 13]);
    full_box("hdlr", 0, 0, &body)
}

pub fn trak(track_id: u32, handler: &str, duration: u32, stbl_children: &[u8]) -> Vec<u8> {
    let mut tkhd = vec![0u8; 80];
    tkhd[8..12].copy_from_slice(&track_id.to_be_bytes());
    let tkhd = full_box("tkhd", 0, 3, &tkhd);

    let mdhd = full_box("mdhd", 0, 0, &u32s(&[0, 0, TIMESCALE, duration, 0x55c4_0000]));
    let minf = write_box("minf", &write_box("stbl", stbl_children));
    let mdia = write_box("mdia", &[mdhd, hdlr(handler), minf].concat());
    write_box("trak", &[tkhd, mdia].concat())
}

fn mvhd(timescale: u32, duration: u32) -> Vec<u8> {
    let mut body = u32s(&[0, 0, timescale, duration]);
    body.resize(96, 0);
    full_box("mvhd", 0, 0, &body)
}

fn ftyp() -> Vec<u8> {
    write_box("ftyp", b"isom\0\0\x02\0isomiso2avc1mp41")
}

fn progressive_tables(samples: &[FixtureSample], chunk_offset: u32) -> Vec<u8> {
    let mut stts = u32s(&[samples.len() as u32]);
    for s in samples {
        stts.extend(u32s(&[1, s.duration]));
    }
    let mut stsz = u32s(&[0, samples.len() as u32]);
    for s in samples {
        stsz.extend(u32s(&[s.data.len() as u32]));
    }
    let mut tables = [
        stsd(&avc1_entry()),
        full_box("stts", 0, 0, &stts),
        full_box("stsz", 0, 0, &stsz),
        full_box("stsc", 0, 0, &u32s(&[1, 1, samples.len() as u32, 1])),
        full_box("stco", 0, 0, &u32s(&[1, chunk_offset])),
    ]
    .concat();
    if samples.iter().any(|s| !s.sync) {
        let sync: Vec<u32> = samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.sync)
            .map(|(i, _)| i as u32 + 1)
            .collect();
        tables.extend(full_box("stss", 0, 0, &[u32s(&[sync.len() as u32]), u32s(&sync)].concat()));
    }
    tables
}

fn progressive_moov(samples: &[FixtureSample], chunk_offset: u32) -> Vec<u8> {
    let ticks: u32 = samples.iter().map(|s| s.duration).sum();
    let audio = trak(2, "soun", ticks, &stsd(&write_box("mp4a", &[0u8; 28])));
    let video = trak(1, "vide", ticks, &progressive_tables(samples, chunk_offset));
    write_box("moov", &[mvhd(1000, ticks / 30), audio, video].concat())
}

/// Single-chunk progressive file, with the movie box before or after the media data
pub fn progressive_mp4(samples: &[FixtureSample], moov_first: bool) -> Vec<u8> {
    let ftyp = ftyp();
    let mdat = write_box("mdat", &samples.iter().flat_map(|s| s.data.clone()).collect::<Vec<_>>());
    if moov_first {
        let moov_len = progressive_moov(samples, 0).len();
        let offset = (ftyp.len() + moov_len + 8) as u32;
        [ftyp, progressive_moov(samples, offset), mdat].concat()
    } else {
        let offset = (ftyp.len() + 8) as u32;
        [ftyp, mdat, progressive_moov(samples, offset)].concat()
    }
}

fn fragment(sequence: u32, base_time: u64, samples: &[FixtureSample]) -> Vec<u8> {
    let build = |data_offset: u32| {
        let tfhd = full_box("tfhd", 0, 0x020000, &u32s(&[1]));
        let tfdt = full_box("tfdt", 1, 0, &base_time.to_be_bytes());
        let mut trun = u32s(&[samples.len() as u32, data_offset]);
        for s in samples {
            let flags = if s.sync { 0x0200_0000 } else { 0x0101_0000 };
            trun.extend(u32s(&[s.duration, s.data.len() as u32, flags]));
        }
        let trun = full_box("trun", 0, 0x000701, &trun);
        let traf = write_box("traf", &[tfhd, tfdt, trun].concat());
        write_box("moof", &[full_box("mfhd", 0, 0, &u32s(&[sequence])), traf].concat())
    };
    let moof_len = build(0).len();
    let mdat = write_box("mdat", &samples.iter().flat_map(|s| s.data.clone()).collect::<Vec<_>>());
    [build(moof_len as u32 + 8), mdat].concat()
}

/// Fragmented file: an empty-table moov with mvex, then one moof+mdat pair per fragment
pub fn fragmented_mp4(fragments: &[Vec<FixtureSample>]) -> Vec<u8> {
    let ticks: u64 = fragments.iter().flatten().map(|s| s.duration as u64).sum();
    let empty_tables = [
        stsd(&avc1_entry()),
        full_box("stts", 0, 0, &u32s(&[0])),
        full_box("stsz", 0, 0, &u32s(&[0, 0])),
        full_box("stsc", 0, 0, &u32s(&[0])),
        full_box("stco", 0, 0, &u32s(&[0])),
    ]
    .concat();
    let mvex = write_box(
        "mvex",
        &[
            full_box("mehd", 0, 0, &u32s(&[(ticks * 1000 / TIMESCALE as u64) as u32])),
            full_box("trex", 0, 0, &u32s(&[1, 1, 0, 0, 0x0101_0000])),
        ]
        .concat(),
    );
    let moov = write_box(
        "moov",
        &[mvhd(1000, 0), trak(1, "vide", 0, &empty_tables), mvex].concat(),
    );

    let mut file = [ftyp(), moov].concat();
    let mut base_time = 0u64;
    for (i, samples) in fragments.iter().enumerate() {
        file.extend(fragment(i as u32 + 1, base_time, samples));
        base_time += samples.iter().map(|s| s.duration as u64).sum::<u64>();
    }
    file
}

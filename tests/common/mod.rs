#![allow(dead_code)]

use async_trait::async_trait;
use framecapture::mp4::write_box;
use framecapture::{
    CaptureResult, DecodeError, DecodedFrame, DecoderConfig, EncodedChunk, FrameDecoder,
    WorkerMessage,
};
use tokio::sync::mpsc::UnboundedReceiver;

pub const SPS: [u8; 28] = [
    0x67, 0x4d, 0x40, 0x1e, 0xec, 0xc0, 0x50, 0x17, 0xfc, 0xb8, 0x0b, 0x50, 0x10, 0x10, 0x14,
    0x00, 0x00, 0x03, 0x01, 0xf4, 0x00, 0x00, 0x5d, 0xa8, 0x3c, 0x58, 0xb6, 0x68,
];
pub const PPS: [u8; 5] = [0x68, 0xe9, 0x79, 0xcb, 0x20];

pub const TIMESCALE: u32 = 30_000;
pub const FRAME_TICKS: u32 = 1_000;

fn u32s(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

fn full_box(name: &str, flags: u32, body: &[u8]) -> Vec<u8> {
    write_box(name, &[&flags.to_be_bytes()[..], body].concat())
}

fn avc1_entry() -> Vec<u8> {
    let mut avcc = vec![1, SPS[1], SPS[2], SPS[3], 0xff, 0xe1];
    avcc.extend_from_slice(&(SPS.len() as u16).to_be_bytes());
    avcc.extend_from_slice(&SPS);
    avcc.push(1);
    avcc.extend_from_slice(&(PPS.len() as u16).to_be_bytes());
    avcc.extend_from_slice(&PPS);

    visual_entry("avc1", &write_box("avcC", &avcc))
}

fn vp08_entry() -> Vec<u8> {
    // vpcC v1: profile 0, level 31, 8-bit 4:2:0, no initialization data
    let vpcc = full_box("vpcC", 0x0100_0000, &[0, 31, 0x80, 1, 1, 1, 0, 0]);
    visual_entry("vp08", &vpcc)
}

fn visual_entry(fourcc: &str, config: &[u8]) -> Vec<u8> {
    let mut entry = vec![0u8; 78];
    entry[7] = 1;
    entry[24..26].copy_from_slice(&320u16.to_be_bytes());
    entry[26..28].copy_from_slice(&180u16.to_be_bytes());
    entry.extend_from_slice(config);
    write_box(fourcc, &entry)
}

/// `count` length-prefixed samples, one key frame every `gop`
pub fn samples(count: usize, gop: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            let mut data = 5u32.to_be_bytes().to_vec();
            data.push(if i % gop == 0 { 0x65 } else { 0x41 });
            data.extend_from_slice(&(i as u32).to_be_bytes());
            data
        })
        .collect()
}

fn moov(entry: &[u8], samples: &[Vec<u8>], key_every: usize, chunk_offset: u32) -> Vec<u8> {
    let count = samples.len() as u32;
    let ticks = count * FRAME_TICKS;

    let mut stsz = u32s(&[0, count]);
    for s in samples {
        stsz.extend(u32s(&[s.len() as u32]));
    }
    let sync: Vec<u32> = (0..count).step_by(key_every).map(|i| i + 1).collect();
    let stbl = [
        full_box("stsd", 0, &[&u32s(&[1])[..], entry].concat()),
        full_box("stts", 0, &u32s(&[1, count, FRAME_TICKS])),
        full_box("stsz", 0, &stsz),
        full_box("stsc", 0, &u32s(&[1, 1, count, 1])),
        full_box("stco", 0, &u32s(&[1, chunk_offset])),
        full_box("stss", 0, &[u32s(&[sync.len() as u32]), u32s(&sync)].concat()),
    ]
    .concat();

    let mut tkhd = vec![0u8; 80];
    tkhd[8..12].copy_from_slice(&1u32.to_be_bytes());
    let hdlr = [&[0u8; 4][..], b"vide", &[0u8; 13]].concat();
    let mdia = [
        full_box("mdhd", 0, &u32s(&[0, 0, TIMESCALE, ticks, 0x55c4_0000])),
        full_box("hdlr", 0, &hdlr),
        write_box("minf", &write_box("stbl", &stbl)),
    ]
    .concat();
    let trak = write_box("trak", &[full_box("tkhd", 3, &tkhd), write_box("mdia", &mdia)].concat());

    let mut mvhd = u32s(&[0, 0, 1000, ticks / 30]);
    mvhd.resize(96, 0);
    write_box("moov", &[full_box("mvhd", 0, &mvhd), trak].concat())
}

/// Progressive H.264 MP4 with the movie box before a single mdat chunk
pub fn progressive_mp4(samples: &[Vec<u8>], key_every: usize) -> Vec<u8> {
    progressive_with_entry(&avc1_entry(), samples, key_every)
}

/// Same layout as [`progressive_mp4`] with a VP8 sample entry
pub fn progressive_vp8(samples: &[Vec<u8>], key_every: usize) -> Vec<u8> {
    progressive_with_entry(&vp08_entry(), samples, key_every)
}

fn progressive_with_entry(entry: &[u8], samples: &[Vec<u8>], key_every: usize) -> Vec<u8> {
    let ftyp = write_box("ftyp", b"isom\0\0\x02\0isomiso2avc1mp41");
    let mdat = write_box("mdat", &samples.concat());
    let moov_len = moov(entry, samples, key_every, 0).len();
    let offset = (ftyp.len() + moov_len + 8) as u32;
    [ftyp, moov(entry, samples, key_every, offset), mdat].concat()
}

/// Outputs one small frame per chunk, timed like the chunk
#[derive(Default)]
pub struct FakeDecoder {
    pub configured: Option<DecoderConfig>,
}

#[async_trait(?Send)]
impl FrameDecoder for FakeDecoder {
    async fn configure(&mut self, config: DecoderConfig) -> CaptureResult<()> {
        self.configured = Some(config);
        Ok(())
    }

    async fn decode(&mut self, chunk: EncodedChunk) -> CaptureResult<Vec<DecodedFrame>> {
        Ok(vec![DecodedFrame {
            timestamp_us: chunk.timestamp_us,
            duration_us: Some(chunk.duration_us),
            width: 4,
            height: 4,
            rgb: vec![chunk.data.len() as u8; 4 * 4 * 3],
        }])
    }

    async fn flush(&mut self) -> CaptureResult<Vec<DecodedFrame>> {
        Ok(Vec::new())
    }
}

/// Stage at which [`FailingDecoder`] reports an error
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailAt {
    Configure,
    /// Fail on the chunk with this zero-based index
    Decode(usize),
    Flush,
}

/// Behaves like [`FakeDecoder`] until the configured stage, which fails
pub struct FailingDecoder {
    fail_at: FailAt,
    inner: FakeDecoder,
    decoded: usize,
}

impl FailingDecoder {
    pub fn new(fail_at: FailAt) -> Self {
        Self {
            fail_at,
            inner: FakeDecoder::default(),
            decoded: 0,
        }
    }
}

#[async_trait(?Send)]
impl FrameDecoder for FailingDecoder {
    async fn configure(&mut self, config: DecoderConfig) -> CaptureResult<()> {
        if self.fail_at == FailAt::Configure {
            return Err(DecodeError::new("unsupported profile").into());
        }
        self.inner.configure(config).await
    }

    async fn decode(&mut self, chunk: EncodedChunk) -> CaptureResult<Vec<DecodedFrame>> {
        if self.fail_at == FailAt::Decode(self.decoded) {
            return Err(DecodeError::new("corrupt slice").into());
        }
        self.decoded += 1;
        self.inner.decode(chunk).await
    }

    async fn flush(&mut self) -> CaptureResult<Vec<DecodedFrame>> {
        if self.fail_at == FailAt::Flush {
            return Err(DecodeError::new("device lost").into());
        }
        self.inner.flush().await
    }
}

pub fn drain(rx: &mut UnboundedReceiver<WorkerMessage>) -> Vec<WorkerMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

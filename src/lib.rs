pub mod bits;
pub use bits::reader::BitReader;

pub mod mp4;
pub use mp4::{
    AvccConfig, CodecConfigBox, DecoderConfig, EncodedSample, Mp4Parser, ParseEvent, TrackInfo,
};

pub mod avc;
pub use avc::NaluType;

pub mod streams;
pub use streams::{open_source, ByteSource, IngestSink};

pub mod demux;
pub use demux::{DemuxEvent, DemuxState, Demuxer};

pub mod decode;
pub use decode::{
    DecodeOrchestrator, DecodedFrame, EncodedChunk, FrameDecimator, FrameDecoder, OpenH264Decoder,
};

pub mod frames;
pub use frames::{Bitmap, CapturedFrame, FrameBuffer, SubscriptionId};

pub mod status;
pub use status::{StatusBatch, StatusKind, StatusReporter, StatusValue};

pub mod messages;
pub use messages::{StartMessage, WorkerMessage};

pub mod options;
pub use options::CaptureOptions;

pub mod worker;
pub use worker::{run_session, spawn_worker, WorkerHandle};

pub mod errors;
pub use errors::{
    CaptureError, CaptureResult, CodecConfigError, DecodeError, ErrorCategory, Mp4Error,
    StreamError,
};

/// Start a capture session on a dedicated worker thread with the openh264 backend
pub fn spawn_capture(start: StartMessage, options: CaptureOptions) -> std::io::Result<WorkerHandle> {
    let handle = spawn_worker(options, OpenH264Decoder::new)?;
    handle.start(start);
    Ok(handle)
}

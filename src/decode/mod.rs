pub mod decimator;
pub use decimator::FrameDecimator;
pub mod decoder;
pub use decoder::{ChunkType, DecodedFrame, EncodedChunk, FrameDecoder};
pub mod openh264;
pub use self::openh264::OpenH264Decoder;
pub mod orchestrator;
pub use orchestrator::{normalize_codec, DecodeOrchestrator, SequencedFrame};

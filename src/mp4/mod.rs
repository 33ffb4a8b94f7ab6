pub mod r#box;
pub use r#box::{find_box, parse_box_header, write_box, BoxHeader, BoxIter};
pub mod avcc;
pub use avcc::AvccConfig;
pub mod codec_config;
pub use codec_config::{CodecConfigBox, DecoderConfig};
pub mod ctts;
pub mod mdhd;
pub mod moof;
pub mod moov;
pub mod mvhd;
pub mod parser;
pub use parser::{Mp4Parser, ParseEvent};
pub mod sample_table;
pub use sample_table::{EncodedSample, SampleRef};
pub mod stco;
pub mod stsc;
pub mod stsd;
pub use stsd::SampleEntry;
pub mod stss;
pub mod stsz;
pub mod stts;
pub mod tkhd;
pub mod trak;
pub use trak::TrackInfo;

#[cfg(test)]
pub(crate) mod fixtures;

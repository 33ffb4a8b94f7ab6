pub mod annexb;
pub mod avc_type;
pub mod nalus;

pub use annexb::{annex_b_unit, convert_bytestream_to_sample, convert_sample_to_bytestream};
pub use avc_type::NaluType;
pub use nalus::Nalu;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaluType {
    NonIDR,
    IDR,
    SEI,
    SPS,
    PPS,
    AUD,
    Other(u8),
}

impl NaluType {
    pub fn from_header_byte(b: u8) -> Self {
        match b & 0x1f {
            1 => NaluType::NonIDR,
            5 => NaluType::IDR,
            6 => NaluType::SEI,
            7 => NaluType::SPS,
            8 => NaluType::PPS,
            9 => NaluType::AUD,
            v => NaluType::Other(v),
        }
    }
}

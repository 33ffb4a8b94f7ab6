pub mod bitmap;
pub use bitmap::Bitmap;
pub mod frame_buffer;
pub use frame_buffer::{FrameBuffer, SubscriptionId};

/// A decimated frame, immutable once published
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    /// Decoder output sequence number, counted before decimation
    pub index: u64,
    pub bitmap: Bitmap,
    pub timestamp_us: i64,
    pub duration_us: u64,
}

use log::warn;
use std::time::Duration;

/// One kept frame per second of source time
pub const DEFAULT_CAPTURE_RATE: f64 = 1.0;
/// Chunks buffered between the fetch and the box parser
pub const DEFAULT_CHUNK_WINDOW: usize = 2;
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// One display frame
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_millis(16);

/// Tunables of one capture session
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    /// Time buckets per second of source time; at most one frame is kept per bucket
    pub capture_rate: f64,
    pub chunk_window: usize,
    /// Chunk size for local files and `data:` URIs
    pub read_chunk_size: usize,
    pub connect_timeout: Duration,
    /// Minimum time a status update waits for others to coalesce with
    pub status_interval: Duration,
    /// Bounding box kept bitmaps are scaled down into, preserving aspect ratio
    pub max_bitmap_size: Option<(u32, u32)>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            capture_rate: DEFAULT_CAPTURE_RATE,
            chunk_window: DEFAULT_CHUNK_WINDOW,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            status_interval: DEFAULT_STATUS_INTERVAL,
            max_bitmap_size: None,
        }
    }
}

impl CaptureOptions {
    /// Apply a capture rate requested by the host, keeping the current one when invalid.
    pub fn with_capture_rate(mut self, rate: Option<f64>) -> Self {
        match rate {
            Some(rate) if rate.is_finite() && rate > 0.0 => self.capture_rate = rate,
            Some(rate) => warn!(
                "Ignoring capture rate {}; using {}",
                rate, self.capture_rate
            ),
            None => {}
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_rate_override() {
        let options = CaptureOptions::default().with_capture_rate(Some(2.5));
        assert_eq!(options.capture_rate, 2.5);
        let options = CaptureOptions::default().with_capture_rate(Some(f64::NAN));
        assert_eq!(options.capture_rate, DEFAULT_CAPTURE_RATE);
        let options = CaptureOptions::default().with_capture_rate(Some(-1.0));
        assert_eq!(options.capture_rate, DEFAULT_CAPTURE_RATE);
        assert_eq!(CaptureOptions::default().with_capture_rate(None).chunk_window, 2);
    }
}

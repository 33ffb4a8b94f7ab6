//! Keeps at most one decoded frame per time bucket of the source timeline.

use super::orchestrator::SequencedFrame;
use crate::errors::CaptureResult;
use crate::frames::{Bitmap, CapturedFrame};
use log::{debug, warn};

/// Duration reported for frames the decoder did not time
pub const DEFAULT_FRAME_DURATION_US: u64 = 1_000_000;

#[derive(Debug, Clone)]
pub struct FrameDecimator {
    /// Buckets per second of source time
    capture_rate: f64,
    last_bucket: Option<i64>,
    max_size: Option<(u32, u32)>,
    kept: u64,
}

impl FrameDecimator {
    pub fn new(capture_rate: f64, max_size: Option<(u32, u32)>) -> Self {
        Self {
            capture_rate,
            last_bucket: None,
            max_size,
            kept: 0,
        }
    }

    pub fn bucket(&self, timestamp_us: i64) -> i64 {
        (timestamp_us as f64 * self.capture_rate / 1_000_000.0).floor() as i64
    }

    /// Record the frame's bucket when it is later than the last kept one
    pub fn admit(&mut self, timestamp_us: i64) -> bool {
        let bucket = self.bucket(timestamp_us);
        if self.last_bucket.is_some_and(|last| bucket <= last) {
            return false;
        }
        self.last_bucket = Some(bucket);
        true
    }

    pub fn kept(&self) -> u64 {
        self.kept
    }

    /// Convert the frame to a bitmap when its bucket is new; otherwise drop it
    pub async fn process(&mut self, frame: SequencedFrame) -> Option<CapturedFrame> {
        if !self.admit(frame.frame.timestamp_us) {
            return None;
        }

        let index = frame.index;
        let max_size = self.max_size;
        let converted = tokio::task::spawn_blocking(move || to_captured(frame, max_size)).await;
        match converted {
            Ok(Ok(captured)) => {
                self.kept += 1;
                debug!("Kept frame {} at {}us", captured.index, captured.timestamp_us);
                Some(captured)
            }
            Ok(Err(e)) => {
                warn!("Dropping frame {}: {}", index, e);
                None
            }
            Err(e) => {
                warn!("Dropping frame {}: conversion task failed: {}", index, e);
                None
            }
        }
    }
}

fn to_captured(frame: SequencedFrame, max_size: Option<(u32, u32)>) -> CaptureResult<CapturedFrame> {
    let SequencedFrame { index, frame } = frame;
    let mut bitmap = Bitmap::from_rgb(frame.width, frame.height, frame.rgb)?;
    if let Some((max_width, max_height)) = max_size {
        bitmap = bitmap.fit_within(max_width, max_height);
    }
    Ok(CapturedFrame {
        index,
        bitmap,
        timestamp_us: frame.timestamp_us,
        duration_us: frame.duration_us.unwrap_or(DEFAULT_FRAME_DURATION_US),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decoder::DecodedFrame;
    use proptest::prelude::*;

    fn frame(index: u64, timestamp_us: i64) -> SequencedFrame {
        SequencedFrame {
            index,
            frame: DecodedFrame {
                timestamp_us,
                duration_us: None,
                width: 4,
                height: 2,
                rgb: vec![10; 4 * 2 * 3],
            },
        }
    }

    fn kept_indices(rate: f64, timestamps: &[i64]) -> Vec<usize> {
        let mut decimator = FrameDecimator::new(rate, None);
        timestamps
            .iter()
            .enumerate()
            .filter(|(_, &t)| decimator.admit(t))
            .map(|(i, _)| i)
            .collect()
    }

    #[tokio::test]
    async fn test_ten_seconds_at_thirty_fps() {
        let mut decimator = FrameDecimator::new(1.0, None);
        let mut kept = Vec::new();
        for i in 0..300u64 {
            let timestamp_us = (i * 1_000_000 / 30) as i64;
            if let Some(captured) = decimator.process(frame(i, timestamp_us)).await {
                kept.push(captured);
            }
        }

        assert!(kept.len() <= 10);
        assert_eq!(kept.len(), 10);
        assert_eq!(decimator.kept(), 10);
        let buckets: Vec<i64> = kept.iter().map(|f| f.timestamp_us / 1_000_000).collect();
        assert_eq!(buckets, (0..10).collect::<Vec<_>>());
        assert!(kept.windows(2).all(|w| w[0].index < w[1].index));
        assert_eq!(kept[1].index, 30);
        assert_eq!(kept[0].duration_us, DEFAULT_FRAME_DURATION_US);
    }

    #[tokio::test]
    async fn test_resizes_kept_frames() {
        let mut decimator = FrameDecimator::new(1.0, Some((2, 2)));
        let captured = decimator.process(frame(0, 0)).await.unwrap();
        assert_eq!((captured.bitmap.width(), captured.bitmap.height()), (2, 1));
    }

    #[tokio::test]
    async fn test_unconvertible_frame_is_dropped() {
        let mut decimator = FrameDecimator::new(1.0, None);
        let mut bad = frame(0, 0);
        bad.frame.rgb.truncate(3);
        assert!(decimator.process(bad).await.is_none());
        assert_eq!(decimator.kept(), 0);
    }

    #[test]
    fn test_capture_rate_scales_buckets() {
        let timestamps: Vec<i64> = (0..20).map(|i| i * 250_000).collect();
        assert_eq!(kept_indices(2.0, &timestamps), vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);
        assert_eq!(kept_indices(0.5, &timestamps), vec![0, 8, 16]);
    }

    proptest! {
        #[test]
        fn prop_decimation_is_deterministic(
            mut timestamps in proptest::collection::vec(0i64..20_000_000, 0..200),
            rate in 0.1f64..10.0,
        ) {
            timestamps.sort();
            let first = kept_indices(rate, &timestamps);
            prop_assert_eq!(&first, &kept_indices(rate, &timestamps));

            let decimator = FrameDecimator::new(rate, None);
            let buckets: Vec<i64> = first.iter().map(|&i| decimator.bucket(timestamps[i])).collect();
            prop_assert!(buckets.windows(2).all(|w| w[0] < w[1]));
        }
    }
}

//! Status reporting: updates are merged per category and sent as one batch.

use crate::messages::WorkerMessage;
use crate::mp4::DecoderConfig;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Fetch,
    Demux,
    Decode,
    Config,
    Capture,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusValue {
    Text(String),
    Config(DecoderConfig),
}

impl From<String> for StatusValue {
    fn from(text: String) -> Self {
        StatusValue::Text(text)
    }
}

impl From<&str> for StatusValue {
    fn from(text: &str) -> Self {
        StatusValue::Text(text.to_string())
    }
}

/// Latest value per category since the previous flush
pub type StatusBatch = BTreeMap<StatusKind, StatusValue>;

pub struct StatusReporter {
    out: UnboundedSender<WorkerMessage>,
    interval: Duration,
    pending: StatusBatch,
    pending_since: Option<Instant>,
}

impl StatusReporter {
    pub fn new(out: UnboundedSender<WorkerMessage>, interval: Duration) -> Self {
        Self {
            out,
            interval,
            pending: StatusBatch::new(),
            pending_since: None,
        }
    }

    /// Record a status update. A later update of the same kind replaces it.
    pub fn set(&mut self, kind: StatusKind, value: impl Into<StatusValue>) {
        if self.pending.is_empty() {
            self.pending_since = Some(Instant::now());
        }
        self.pending.insert(kind, value.into());
    }

    /// Send the pending batch if it has waited at least one interval.
    pub fn tick(&mut self) {
        if let Some(since) = self.pending_since {
            if since.elapsed() >= self.interval {
                self.flush();
            }
        }
    }

    /// Send the pending batch now.
    pub fn flush(&mut self) {
        self.pending_since = None;
        if self.pending.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.pending);
        if self.out.send(WorkerMessage::Status(batch)).is_err() {
            debug!("Status receiver dropped");
        }
    }
}

//! Messages exchanged between the host and a capture worker.

use crate::frames::CapturedFrame;
use crate::status::StatusBatch;
use serde::{Deserialize, Serialize, Serializer};
use std::io;

/// The single inbound message that starts a session
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMessage {
    pub data_uri: String,
    #[serde(default)]
    pub capture_rate: Option<f64>,
}

impl StartMessage {
    pub fn new(data_uri: impl Into<String>) -> Self {
        Self {
            data_uri: data_uri.into(),
            capture_rate: None,
        }
    }

    pub fn from_json(json: &str) -> io::Result<Self> {
        serde_json::from_str(json).map_err(io::Error::from)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    Status(StatusBatch),
    Duration { duration_seconds: f64 },
    Frame(CapturedFrame),
    /// Terminal; at most one per session
    Error { error: String },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Tagged {
    Duration {
        #[serde(rename = "durationSeconds")]
        duration_seconds: f64,
    },
    Frame {
        data: String,
        index: u64,
        #[serde(rename = "timestampMicroSeconds")]
        timestamp_us: i64,
        #[serde(rename = "durationMicroSeconds")]
        duration_us: u64,
    },
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    status: &'static str,
    error: &'a str,
}

impl Serialize for WorkerMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WorkerMessage::Status(batch) => batch.serialize(serializer),
            WorkerMessage::Duration { duration_seconds } => Tagged::Duration {
                duration_seconds: *duration_seconds,
            }
            .serialize(serializer),
            WorkerMessage::Frame(frame) => {
                let data = frame
                    .bitmap
                    .to_jpeg_data_uri()
                    .map_err(serde::ser::Error::custom)?;
                Tagged::Frame {
                    data,
                    index: frame.index,
                    timestamp_us: frame.timestamp_us,
                    duration_us: frame.duration_us,
                }
                .serialize(serializer)
            }
            WorkerMessage::Error { error } => ErrorReport {
                status: "error",
                error,
            }
            .serialize(serializer),
        }
    }
}

impl WorkerMessage {
    pub fn to_json(&self) -> io::Result<String> {
        serde_json::to_string(self).map_err(io::Error::from)
    }
}

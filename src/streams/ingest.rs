use crate::errors::CaptureResult;
use crate::mp4::Mp4Parser;
use crate::status::{StatusKind, StatusReporter};
use log::debug;

const MIB: f64 = 1024.0 * 1024.0;

/// Stamps incoming chunks with their file offset and feeds them to the parser
#[derive(Debug, Default)]
pub struct IngestSink {
    offset: u64,
}

impl IngestSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes received so far, which is also the file offset of the next chunk
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn write(
        &mut self,
        chunk: Vec<u8>,
        parser: &mut Mp4Parser,
        status: &mut StatusReporter,
    ) -> CaptureResult<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        parser.append_buffer(self.offset, &chunk)?;
        self.offset += chunk.len() as u64;
        status.set(
            StatusKind::Fetch,
            format!("{:.1} MiB", self.offset as f64 / MIB),
        );
        Ok(())
    }

    pub fn close(&mut self, parser: &mut Mp4Parser, status: &mut StatusReporter) {
        debug!("Stream ended after {} bytes", self.offset);
        parser.flush();
        status.set(StatusKind::Fetch, "Done");
    }
}

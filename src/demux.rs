//! Container demuxer: drives the ingest sink and the incremental parser, emitting the
//! decoder configuration once and then samples in decode order.

use crate::errors::{CaptureError, CaptureResult, Mp4Error};
use crate::mp4::{DecoderConfig, EncodedSample, Mp4Parser, ParseEvent};
use crate::status::{StatusKind, StatusReporter};
use crate::streams::IngestSink;
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxState {
    Idle,
    AwaitingMetadata,
    Extracting,
    Flushing,
    Done,
    Error,
}

impl DemuxState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DemuxState::Done | DemuxState::Error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DemuxEvent {
    /// Emitted exactly once, before any sample
    Config(DecoderConfig),
    Sample(EncodedSample),
}

pub struct Demuxer {
    state: DemuxState,
    sink: IngestSink,
    parser: Mp4Parser,
    samples_emitted: u64,
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl Demuxer {
    pub fn new() -> Self {
        Self {
            state: DemuxState::Idle,
            sink: IngestSink::new(),
            parser: Mp4Parser::new(),
            samples_emitted: 0,
        }
    }

    pub fn state(&self) -> DemuxState {
        self.state
    }

    pub fn bytes_received(&self) -> u64 {
        self.sink.offset()
    }

    /// Feed one fetched chunk and return the events it completes
    pub fn push_chunk(
        &mut self,
        chunk: Vec<u8>,
        status: &mut StatusReporter,
    ) -> CaptureResult<Vec<DemuxEvent>> {
        self.ensure_running()?;
        if self.state == DemuxState::Idle {
            self.state = DemuxState::AwaitingMetadata;
            status.set(StatusKind::Demux, "Awaiting metadata");
        }
        let result = self
            .sink
            .write(chunk, &mut self.parser, status)
            .and_then(|_| self.drain(status));
        self.check(result, status)
    }

    /// End of stream: flush the parser and return the trailing samples
    pub fn finish(&mut self, status: &mut StatusReporter) -> CaptureResult<Vec<DemuxEvent>> {
        self.ensure_running()?;
        self.state = DemuxState::Flushing;
        self.sink.close(&mut self.parser, status);
        let result = self.drain(status);
        let events = self.check(result, status)?;

        self.state = DemuxState::Done;
        status.set(StatusKind::Demux, "Done");
        info!(
            "Demuxed {} samples from {} bytes",
            self.samples_emitted,
            self.sink.offset()
        );
        // Release buffered bytes
        self.parser = Mp4Parser::new();
        Ok(events)
    }

    /// Move to the error state, e.g. when the byte source fails
    pub fn fail(&mut self, err: CaptureError, status: &mut StatusReporter) -> CaptureError {
        if !self.state.is_terminal() {
            warn!("Demuxer failed in {:?} state: {}", self.state, err);
            self.state = DemuxState::Error;
            status.set(StatusKind::Demux, err.to_string());
        }
        err
    }

    fn ensure_running(&self) -> CaptureResult<()> {
        if self.state.is_terminal() {
            return Err(Mp4Error::malformed(format!(
                "demuxer already stopped in {:?} state",
                self.state
            ))
            .into());
        }
        Ok(())
    }

    fn check<T>(&mut self, result: CaptureResult<T>, status: &mut StatusReporter) -> CaptureResult<T> {
        result.map_err(|err| self.fail(err, status))
    }

    fn drain(&mut self, status: &mut StatusReporter) -> CaptureResult<Vec<DemuxEvent>> {
        let mut events = Vec::new();
        loop {
            match self.parser.next_event()? {
                ParseEvent::NeedMoreData => return Ok(events),
                ParseEvent::TrackReady(track) => {
                    let config = DecoderConfig::from_track(&track)?;
                    info!(
                        "Track {} ready: {} {}x{}",
                        track.track_id, config.codec, config.coded_width, config.coded_height
                    );
                    if self.state == DemuxState::AwaitingMetadata {
                        self.state = DemuxState::Extracting;
                    }
                    status.set(StatusKind::Demux, "Ready");
                    events.push(DemuxEvent::Config(config));
                }
                ParseEvent::SamplesReady(samples) => {
                    self.samples_emitted += samples.len() as u64;
                    events.extend(samples.into_iter().map(DemuxEvent::Sample));
                }
            }
        }
    }
}

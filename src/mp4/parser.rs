//! Incremental MP4 parser fed with contiguous byte buffers.
//!
//! Top-level boxes are walked as bytes arrive. `moov` and `moof` are parsed once fully
//! buffered, everything else is skipped without being buffered past its header. Samples
//! are released in decode order once their payload bytes are present.

use super::moof::parse_moof;
use super::moov::{parse_moov, Movie, TrexDefaults};
use super::r#box::parse_box_header;
use super::sample_table::{EncodedSample, SampleRef};
use super::trak::TrackInfo;
use crate::errors::{CaptureResult, Mp4Error};
use log::{debug, info, warn};
use std::collections::VecDeque;

/// Result of one [`Mp4Parser::next_event`] call
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    /// Nothing more can be produced until more bytes are appended (or, after
    /// [`Mp4Parser::flush`], ever)
    NeedMoreData,
    /// The movie box was parsed and a video track selected
    TrackReady(TrackInfo),
    /// Newly available samples of the selected track, in decode order
    SamplesReady(Vec<EncodedSample>),
}

#[derive(Debug)]
struct PendingSample {
    sample: SampleRef,
    /// Lowest offset this sample or any later pending sample still needs
    retain_from: u64,
}

#[derive(Debug)]
struct MovieState {
    track_id: u32,
    timescale: u32,
    trex: Option<TrexDefaults>,
    next_decode_time: u64,
}

#[derive(Debug, Default)]
pub struct Mp4Parser {
    buffer: Vec<u8>,
    /// File offset of `buffer[0]`
    buffer_start: u64,
    /// File offset of the next top-level box header
    cursor: u64,
    movie: Option<MovieState>,
    pending: VecDeque<PendingSample>,
    events: VecDeque<ParseEvent>,
    /// The final top-level box runs to end of file; no more headers follow
    open_ended: bool,
    flushed: bool,
    /// End-of-stream bookkeeping already done
    drained: bool,
}

impl Mp4Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// File offset one past the last buffered byte
    fn buffer_end(&self) -> u64 {
        self.buffer_start + self.buffer.len() as u64
    }

    /// Append bytes that start at `file_start`, which must follow the previous buffer.
    pub fn append_buffer(&mut self, file_start: u64, bytes: &[u8]) -> CaptureResult<()> {
        if self.flushed {
            return Err(Mp4Error::malformed("buffer appended after flush").into());
        }
        if file_start != self.buffer_end() {
            return Err(Mp4Error::malformed(format!(
                "non-contiguous buffer at offset {}, expected {}",
                file_start,
                self.buffer_end()
            ))
            .into());
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Signal end of input. Remaining events are still returned by `next_event`.
    pub fn flush(&mut self) {
        self.flushed = true;
    }

    pub fn next_event(&mut self) -> CaptureResult<ParseEvent> {
        loop {
            if let Some(event) = self.events.pop_front() {
                return Ok(event);
            }
            if !self.parse_next_box()? {
                break;
            }
        }

        let samples = self.take_ready_samples()?;
        if !samples.is_empty() {
            return Ok(ParseEvent::SamplesReady(samples));
        }

        if self.flushed && !self.drained {
            self.drained = true;
            if self.movie.is_none() {
                return Err(Mp4Error::missing("moov", "file").into());
            }
            if !self.open_ended && self.cursor < self.buffer_end() {
                warn!(
                    "Ignoring incomplete box at offset {} ({} trailing bytes)",
                    self.cursor,
                    self.buffer_end() - self.cursor
                );
            }
            if !self.pending.is_empty() {
                warn!(
                    "Dropping {} samples whose data was cut off by end of stream",
                    self.pending.len()
                );
                self.pending.clear();
            }
        }

        self.discard_consumed();
        Ok(ParseEvent::NeedMoreData)
    }

    /// Handle the top-level box at the cursor. Returns false when it needs more data.
    fn parse_next_box(&mut self) -> CaptureResult<bool> {
        if self.open_ended {
            return Ok(false);
        }
        let rel = (self.cursor - self.buffer_start) as usize;
        let mut pos = rel;
        let Some(header) = parse_box_header(&self.buffer, &mut pos)? else {
            return Ok(false);
        };
        let box_start = self.cursor;
        let payload_start = box_start + header.header_size;

        let box_end = match header.size {
            Some(size) => box_start.saturating_add(size),
            None if header.name == "moov" || header.name == "moof" => {
                if !self.flushed {
                    return Ok(false);
                }
                self.buffer_end()
            }
            None => {
                debug!("{} box at {} runs to end of file", header.name, box_start);
                self.open_ended = true;
                self.cursor = payload_start;
                return Ok(false);
            }
        };

        match header.name.as_str() {
            "moov" | "moof" => {
                if box_end > self.buffer_end() {
                    return Ok(false);
                }
                let payload = &self.buffer[(payload_start - self.buffer_start) as usize
                    ..(box_end - self.buffer_start) as usize];
                if header.name == "moov" {
                    let movie = parse_moov(payload)?;
                    self.on_movie(movie);
                } else {
                    let movie = self
                        .movie
                        .as_mut()
                        .ok_or_else(|| Mp4Error::malformed("moof box found before moov box"))?;
                    let samples = parse_moof(
                        payload,
                        box_start,
                        movie.track_id,
                        movie.trex.as_ref(),
                        &mut movie.next_decode_time,
                    )?;
                    self.queue_samples(samples);
                }
            }
            name => debug!("Skipping {} box at {} ({} bytes)", name, box_start, box_end - box_start),
        }

        self.cursor = box_end;
        Ok(true)
    }

    fn on_movie(&mut self, movie: Movie) {
        if self.movie.is_some() {
            warn!("Ignoring additional moov box");
            return;
        }
        info!(
            "Movie box parsed: {} progressive samples, fragmented: {}",
            movie.samples.len(),
            movie.fragmented
        );
        self.movie = Some(MovieState {
            track_id: movie.track.track_id,
            timescale: movie.track.timescale,
            trex: movie.trex,
            next_decode_time: movie
                .samples
                .last()
                .map_or(0, |s| s.decode_time + s.duration as u64),
        });
        self.events.push_back(ParseEvent::TrackReady(movie.track));
        self.queue_samples(movie.samples);
    }

    fn queue_samples(&mut self, samples: Vec<SampleRef>) {
        let Some(batch_min) = samples.iter().map(|s| s.offset).min() else {
            return;
        };
        for pending in self.pending.iter_mut() {
            pending.retain_from = pending.retain_from.min(batch_min);
        }
        let mut retain = vec![0u64; samples.len()];
        let mut running = u64::MAX;
        for (i, sample) in samples.iter().enumerate().rev() {
            running = running.min(sample.offset);
            retain[i] = running;
        }
        self.pending.extend(
            samples
                .into_iter()
                .zip(retain)
                .map(|(sample, retain_from)| PendingSample {
                    sample,
                    retain_from,
                }),
        );
    }

    /// Pop every leading pending sample whose payload is fully buffered
    fn take_ready_samples(&mut self) -> CaptureResult<Vec<EncodedSample>> {
        let Some(timescale) = self.movie.as_ref().map(|m| m.timescale) else {
            return Ok(Vec::new());
        };
        let mut ready = Vec::new();
        while let Some(front) = self.pending.front() {
            let sample = &front.sample;
            if sample.offset < self.buffer_start {
                return Err(Mp4Error::malformed(format!(
                    "sample data at offset {} was already discarded",
                    sample.offset
                ))
                .into());
            }
            if sample.end() > self.buffer_end() {
                break;
            }
            let start = (sample.offset - self.buffer_start) as usize;
            let data = self.buffer[start..start + sample.size as usize].to_vec();
            ready.push(sample.to_encoded(timescale, data));
            self.pending.pop_front();
        }
        Ok(ready)
    }

    /// Drop buffered bytes no longer reachable by the cursor or a pending sample.
    /// Until the movie box is known every byte is kept, since samples may precede it.
    fn discard_consumed(&mut self) {
        if self.movie.is_none() {
            return;
        }
        // Nothing past an open-ended box is read through the cursor
        let cursor = if self.open_ended { u64::MAX } else { self.cursor };
        let keep_from = self
            .pending
            .front()
            .map_or(cursor, |p| p.retain_from.min(cursor));
        let drop = keep_from.saturating_sub(self.buffer_start).min(self.buffer.len() as u64);
        if drop > 0 {
            self.buffer.drain(..drop as usize);
            self.buffer_start += drop;
        }
    }

    /// Bytes currently held in memory
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

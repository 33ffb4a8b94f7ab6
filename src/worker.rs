//! Capture session runner and the isolated worker thread that hosts it.

use crate::decode::{DecodeOrchestrator, FrameDecimator, FrameDecoder, SequencedFrame};
use crate::demux::{DemuxEvent, Demuxer};
use crate::errors::CaptureResult;
use crate::frames::FrameBuffer;
use crate::messages::{StartMessage, WorkerMessage};
use crate::options::CaptureOptions;
use crate::status::{StatusKind, StatusReporter, StatusValue};
use crate::streams::open_source;
use log::{debug, error, info};
use std::thread::JoinHandle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

fn emit(out: &UnboundedSender<WorkerMessage>, message: WorkerMessage) {
    if out.send(message).is_err() {
        debug!("Host stopped listening");
    }
}

struct Pipeline<'a, D: FrameDecoder> {
    orchestrator: DecodeOrchestrator<D>,
    decimator: FrameDecimator,
    out: &'a UnboundedSender<WorkerMessage>,
}

impl<D: FrameDecoder> Pipeline<'_, D> {
    async fn handle(
        &mut self,
        events: Vec<DemuxEvent>,
        status: &mut StatusReporter,
    ) -> CaptureResult<()> {
        for event in events {
            match event {
                DemuxEvent::Config(config) => {
                    let config = self.orchestrator.configure(&config).await?;
                    status.set(
                        StatusKind::Decode,
                        format!(
                            "{} @ {}x{}",
                            config.codec, config.coded_width, config.coded_height
                        ),
                    );
                    let duration_seconds = config.duration_seconds;
                    status.set(StatusKind::Config, StatusValue::Config(config));
                    status.flush();
                    emit(self.out, WorkerMessage::Duration { duration_seconds });
                }
                DemuxEvent::Sample(sample) => {
                    let frames = self.orchestrator.decode(sample).await?;
                    self.decimate(frames, status).await;
                }
            }
        }
        Ok(())
    }

    async fn decimate(&mut self, frames: Vec<SequencedFrame>, status: &mut StatusReporter) {
        for frame in frames {
            if let Some(captured) = self.decimator.process(frame).await {
                emit(self.out, WorkerMessage::Frame(captured));
                status.set(StatusKind::Capture, format!("{} frames", self.decimator.kept()));
            }
        }
    }
}

/// Run one capture session, reporting progress and frames through `out`.
///
/// Failures end the session with a single error message, after which the error is
/// also returned. Returns the number of frames kept.
pub async fn run_session<D: FrameDecoder>(
    start: &StartMessage,
    decoder: D,
    options: CaptureOptions,
    out: UnboundedSender<WorkerMessage>,
) -> CaptureResult<u64> {
    let options = options.with_capture_rate(start.capture_rate);
    let mut status = StatusReporter::new(out.clone(), options.status_interval);
    info!(
        "Starting capture of {} at {} frames/s",
        start.data_uri, options.capture_rate
    );

    let result = capture(&start.data_uri, decoder, &options, &out, &mut status).await;
    match &result {
        Ok(kept) => {
            info!("Capture finished with {} frames", kept);
            status.flush();
        }
        Err(err) => {
            error!("Capture failed ({:?}): {}", err.category(), err);
            status.set(StatusKind::Error, err.to_string());
            status.flush();
            emit(
                &out,
                WorkerMessage::Error {
                    error: err.to_string(),
                },
            );
        }
    }
    result
}

async fn capture<D: FrameDecoder>(
    uri: &str,
    decoder: D,
    options: &CaptureOptions,
    out: &UnboundedSender<WorkerMessage>,
    status: &mut StatusReporter,
) -> CaptureResult<u64> {
    // Bounded so a fast network cannot run ahead of the parser
    let (tx, rx) = mpsc::channel::<CaptureResult<Vec<u8>>>(options.chunk_window.max(1));

    let producer = async move {
        let mut source = match open_source(uri, options).await {
            Ok(source) => source,
            Err(err) => {
                let _ = tx.send(Err(err)).await;
                return;
            }
        };
        loop {
            match source.next_chunk().await {
                Ok(Some(chunk)) => {
                    if tx.send(Ok(chunk)).await.is_err() {
                        debug!("Consumer stopped; abandoning fetch");
                        return;
                    }
                }
                Ok(None) => return,
                Err(err) => {
                    let _ = tx.send(Err(err)).await;
                    return;
                }
            }
        }
    };

    let consumer = consume(rx, decoder, options, out, status);
    let ((), result) = tokio::join!(producer, consumer);
    result
}

async fn consume<D: FrameDecoder>(
    mut rx: mpsc::Receiver<CaptureResult<Vec<u8>>>,
    decoder: D,
    options: &CaptureOptions,
    out: &UnboundedSender<WorkerMessage>,
    status: &mut StatusReporter,
) -> CaptureResult<u64> {
    let mut demuxer = Demuxer::new();
    let mut pipeline = Pipeline {
        orchestrator: DecodeOrchestrator::new(decoder),
        decimator: FrameDecimator::new(options.capture_rate, options.max_bitmap_size),
        out,
    };

    while let Some(item) = rx.recv().await {
        let chunk = item.map_err(|err| demuxer.fail(err, status))?;
        let events = demuxer.push_chunk(chunk, status)?;
        pipeline.handle(events, status).await?;
        status.tick();
    }

    let events = demuxer.finish(status)?;
    pipeline.handle(events, status).await?;

    let frames = pipeline.orchestrator.finish().await?;
    pipeline.decimate(frames, status).await;
    status.set(StatusKind::Decode, "Done");
    status.set(
        StatusKind::Capture,
        format!("{} frames", pipeline.decimator.kept()),
    );
    Ok(pipeline.decimator.kept())
}

/// Host side of a worker thread
pub struct WorkerHandle {
    start: UnboundedSender<StartMessage>,
    messages: UnboundedReceiver<WorkerMessage>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Send the start message. Only the first one starts a session; returns false
    /// once the worker has stopped accepting messages.
    pub fn start(&self, message: StartMessage) -> bool {
        self.start.send(message).is_ok()
    }

    pub async fn recv(&mut self) -> Option<WorkerMessage> {
        self.messages.recv().await
    }

    /// Block until the next message; `None` once the worker has exited
    pub fn blocking_recv(&mut self) -> Option<WorkerMessage> {
        self.messages.blocking_recv()
    }

    /// Like [`Self::blocking_recv`], also appending frames to `frames`
    pub fn blocking_recv_into(&mut self, frames: &mut FrameBuffer) -> Option<WorkerMessage> {
        let message = self.blocking_recv()?;
        if let WorkerMessage::Frame(frame) = &message {
            frames.add(frame.clone());
        }
        Some(message)
    }

    /// Wait for the worker thread to exit
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Capture worker panicked");
            }
        }
    }
}

/// Start a worker thread with its own single-threaded runtime.
///
/// The decoder is built on the worker thread, so it need not be `Send`.
pub fn spawn_worker<F, D>(options: CaptureOptions, make_decoder: F) -> std::io::Result<WorkerHandle>
where
    F: FnOnce() -> D + Send + 'static,
    D: FrameDecoder + 'static,
{
    let (start_tx, mut start_rx) = mpsc::unbounded_channel::<StartMessage>();
    let (out_tx, out_rx) = mpsc::unbounded_channel();

    let thread = std::thread::Builder::new()
        .name("frame-capture".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    emit(
                        &out_tx,
                        WorkerMessage::Error {
                            error: format!("Unexpected error: {}", err),
                        },
                    );
                    return;
                }
            };
            runtime.block_on(async move {
                let Some(start) = start_rx.recv().await else {
                    debug!("Worker dropped before start");
                    return;
                };
                start_rx.close();
                // The error, if any, was already reported
                let _ = run_session(&start, make_decoder(), options, out_tx).await;
            });
        })?;

    Ok(WorkerHandle {
        start: start_tx,
        messages: out_rx,
        thread: Some(thread),
    })
}

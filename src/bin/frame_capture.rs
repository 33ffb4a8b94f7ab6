use framecapture::{spawn_capture, CaptureOptions, FrameBuffer, StartMessage, WorkerMessage};
use log::{error, info};
use serde_json::json;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: frame_capture <uri> [capture_rate] [out_dir]");
        eprintln!("Example: frame_capture https://example.com/video.mp4 1 frames");
        return ExitCode::from(2);
    }

    let mut start = StartMessage::new(args[1].clone());
    if let Some(rate) = args.get(2) {
        match rate.parse::<f64>() {
            Ok(rate) => start.capture_rate = Some(rate),
            Err(_) => {
                eprintln!("Invalid capture rate: {}", rate);
                return ExitCode::from(2);
            }
        }
    }
    let out_dir = PathBuf::from(args.get(3).map_or("frames", String::as_str));

    match run(start, out_dir) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns false when the session ended with an error message
fn run(start: StartMessage, out_dir: PathBuf) -> std::io::Result<bool> {
    fs::create_dir_all(&out_dir)?;

    let mut frames = FrameBuffer::new();
    let frame_dir = out_dir.clone();
    frames.subscribe(move |frame, _| {
        let path = frame_dir.join(format!("frame_{:06}.jpg", frame.index));
        let written = frame
            .bitmap
            .to_jpeg_bytes()
            .and_then(|jpeg| fs::write(&path, jpeg));
        match written {
            Ok(()) => info!("Wrote {}", path.display()),
            Err(e) => error!("Failed to write {}: {}", path.display(), e),
        }
    });

    let mut worker = spawn_capture(start, CaptureOptions::default())?;
    let mut succeeded = true;
    while let Some(message) = worker.blocking_recv_into(&mut frames) {
        match &message {
            // Bitmaps go to disk rather than stdout
            WorkerMessage::Frame(frame) => println!(
                "{}",
                json!({
                    "type": "frame",
                    "index": frame.index,
                    "timestampMicroSeconds": frame.timestamp_us,
                    "durationMicroSeconds": frame.duration_us,
                })
            ),
            WorkerMessage::Error { .. } => {
                succeeded = false;
                println!("{}", message.to_json()?);
            }
            _ => println!("{}", message.to_json()?),
        }
    }
    worker.join();

    info!("{} frames in {}", frames.len(), out_dir.display());
    Ok(succeeded)
}

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use faceport_core::camera::infrastructure::replay_source::ReplaySource;
use faceport_core::detection::domain::native_detector::DetectorBackend;
use faceport_core::detection::infrastructure::backend_registry::BackendRegistry;
use faceport_core::detection::infrastructure::model_resolver;
use faceport_core::detection::infrastructure::rustface_detector::RustfaceBackend;
use faceport_core::imageio::image_source::ImageSource;
use faceport_core::session::detector_session::DetectorSession;
use faceport_core::session::live_session::{DetectionEvent, LiveSession};
use faceport_core::shared::config::{DetectorConfig, RunningMode};
use faceport_core::shared::constants::{
    IMAGE_EXTENSIONS, SEETAFACE_MODEL_NAME, SEETAFACE_MODEL_URL, SUPPORTED_FEATURES,
};
use faceport_core::shared::frame::Frame;

/// Face detection over images, URIs and replayed camera streams.
#[derive(Parser)]
#[command(name = "faceport")]
struct Cli {
    /// Image path or http(s)/file URI to detect faces in.
    input: Option<String>,

    /// Detect on an inline base64 payload (data URLs accepted) instead of a file.
    #[arg(long)]
    base64: Option<String>,

    /// Replay images from this directory as a live camera stream.
    #[arg(long)]
    live: Option<PathBuf>,

    /// Replay rate in frames per second.
    #[arg(long, default_value = "10")]
    fps: u32,

    /// Cycle the replay until interrupted instead of stopping after one pass.
    #[arg(long)]
    repeat: bool,

    /// Minimum face detection confidence (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    min_confidence: f32,

    /// Minimum tracking confidence (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    min_tracking: f32,

    /// Maximum number of faces to report per frame.
    #[arg(long, default_value = "2")]
    max_faces: usize,

    /// Leave face landmarks out of the results.
    #[arg(long)]
    no_landmarks: bool,

    /// Running mode for single-shot detection: IMAGE or VIDEO.
    #[arg(long, default_value = "IMAGE")]
    mode: String,

    /// Detector backend to use.
    #[arg(long, default_value = "rustface")]
    backend: String,

    /// Use this model file instead of the cached/downloaded one.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,

    /// Print the supported detector features and exit.
    #[arg(long)]
    features: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    if cli.features {
        print_json(&SUPPORTED_FEATURES, cli.pretty)?;
        return Ok(());
    }

    let backend = build_backend(&cli)?;
    let config = build_config(&cli);

    if let Some(frames_dir) = cli.live.clone() {
        run_live(&cli, backend, config, &frames_dir)?;
    } else {
        run_detect(&cli, backend, config)?;
    }

    Ok(())
}

fn run_detect(
    cli: &Cli,
    backend: Arc<dyn DetectorBackend>,
    config: DetectorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = if let Some(payload) = &cli.base64 {
        ImageSource::Base64(payload.clone())
    } else {
        ImageSource::from_location(cli.input.as_ref().unwrap())
    };

    let mut session = DetectorSession::new(backend);
    session.initialize(config)?;
    let result = session.detect_image(&source)?;
    log::info!("Detected {} face(s)", result.faces.len());
    print_json(&result, cli.pretty)?;
    Ok(())
}

fn run_live(
    cli: &Cli,
    backend: Arc<dyn DetectorBackend>,
    config: DetectorConfig,
    frames_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let frames = load_replay_frames(frames_dir)?;
    log::info!("Replaying {} frame(s) at {} fps", frames.len(), cli.fps);

    let camera = ReplaySource::new(frames, cli.fps, cli.repeat)?;
    let (session, events) = LiveSession::start(backend, config, Box::new(camera))?;

    let idle = idle_timeout(cli.fps);
    let mut face_events = 0usize;
    let mut error_events = 0usize;
    while let Ok(event) = events.recv_timeout(idle) {
        match &event {
            DetectionEvent::FaceDetected(_) => face_events += 1,
            DetectionEvent::Error(_) => error_events += 1,
        }
        print_json(&event, cli.pretty)?;
    }

    let dropped = session.dropped_frames();
    drop(session);
    log::info!(
        "Stream ended: {face_events} result(s), {error_events} error(s), {dropped} frame(s) dropped"
    );
    Ok(())
}

/// Resolve the model, register the bundled backend and look up the
/// requested one. Unknown backend names fail here, before any detection
/// work starts.
fn build_backend(cli: &Cli) -> Result<Arc<dyn DetectorBackend>, Box<dyn std::error::Error>> {
    let model_path = match &cli.model {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {SEETAFACE_MODEL_NAME}");
            let path = model_resolver::resolve(
                SEETAFACE_MODEL_NAME,
                SEETAFACE_MODEL_URL,
                None,
                Some(Box::new(download_progress)),
            )?;
            eprintln!();
            path
        }
    };

    let mut registry = BackendRegistry::new();
    registry.register(Arc::new(RustfaceBackend::new(model_path)));
    Ok(registry.lookup(&cli.backend)?)
}

fn build_config(cli: &Cli) -> DetectorConfig {
    let running_mode = if cli.live.is_some() {
        RunningMode::LiveStream
    } else {
        RunningMode::parse_lenient(&cli.mode)
    };
    DetectorConfig {
        min_detection_confidence: cli.min_confidence,
        min_tracking_confidence: cli.min_tracking,
        max_num_faces: cli.max_faces,
        enable_face_landmarks: !cli.no_landmarks,
        enable_face_classification: false,
        running_mode,
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.features {
        return Ok(());
    }
    if cli.base64.is_some() && cli.input.is_some() {
        return Err("--base64 and an input path are mutually exclusive".into());
    }
    if let Some(dir) = &cli.live {
        if cli.base64.is_some() {
            return Err("--live and --base64 are mutually exclusive".into());
        }
        if cli.input.is_some() {
            return Err("--live replays a directory; the input argument is not used".into());
        }
        if !dir.is_dir() {
            return Err(format!("Replay directory not found: {}", dir.display()).into());
        }
        if cli.fps == 0 {
            return Err("--fps must be at least 1".into());
        }
        return Ok(());
    }
    match &cli.input {
        Some(input) => {
            if !input.contains("://") && !Path::new(input).exists() {
                return Err(format!("Input file not found: {input}").into());
            }
        }
        None => {
            if cli.base64.is_none() {
                return Err("An input image or --base64 payload is required".into());
            }
        }
    }
    Ok(())
}

fn load_replay_frames(dir: &Path) -> Result<Vec<Frame>, Box<dyn std::error::Error>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_image(path))
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(format!("No images found in {}", dir.display()).into());
    }

    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        frames.push(ImageSource::Path(path).decode()?);
    }
    Ok(frames)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading detector model... {pct}%");
    } else {
        eprint!("\rDownloading detector model... {downloaded} bytes");
    }
}

/// Waiting this long without an event means a non-repeating replay has
/// drained; with `--repeat` frames keep arriving and the stream runs until
/// interrupted.
fn idle_timeout(fps: u32) -> Duration {
    let three_frames = Duration::from_millis(3_000 / u64::from(fps.max(1)));
    three_frames.max(Duration::from_secs(1))
}

fn print_json<T: serde::Serialize>(
    value: &T,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

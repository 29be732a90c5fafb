use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use serde::Deserialize;

use rollcall_core::attendance::ledger::LogLedger;
use rollcall_core::camera::domain::camera_source::CameraSource;
use rollcall_core::camera::infrastructure::mjpeg_camera::MjpegCamera;
use rollcall_core::camera::infrastructure::mobile_camera::MobileCamera;
use rollcall_core::camera::infrastructure::synthetic_camera::SyntheticCamera;
use rollcall_core::pipeline::engine::{Engine, EngineConfig};
use rollcall_core::pipeline::pipeline_logger::RollingStatsLogger;
use rollcall_core::recognition::domain::embedding_provider::{EmbeddingProvider, FaceObservation};
use rollcall_core::recognition::domain::gallery_matcher::{GalleryMatcher, MatchOutcome};
use rollcall_core::recognition::infrastructure::box_renderer::BoxRenderer;
use rollcall_core::shared::constants::{
    DEFAULT_AWAY_THRESHOLD, DEFAULT_CAMERA_FPS, DEFAULT_CAMERA_HEIGHT, DEFAULT_CAMERA_WIDTH,
    DEFAULT_VERIFICATION_TIME, MIN_FACE_SIZE,
};
use rollcall_core::shared::frame::Frame;
use rollcall_core::shared::geometry::FaceBox;

/// Camera-based attendance tracking.
#[derive(Parser)]
#[command(name = "rollcall")]
struct Cli {
    /// JSON camera configuration file (defaults to one synthetic camera).
    #[arg(long)]
    config: Option<PathBuf>,

    /// How long to run, in seconds.
    #[arg(long, default_value = "30")]
    duration: f64,

    /// Seconds a face must dwell before counting as present.
    #[arg(long, default_value_t = DEFAULT_VERIFICATION_TIME)]
    verification_time: f64,

    /// Seconds unseen before a present person is marked away.
    #[arg(long, default_value_t = DEFAULT_AWAY_THRESHOLD)]
    away_threshold: f64,

    /// Worker threads per pool.
    #[arg(long, default_value = "2")]
    workers: usize,

    /// Name assigned to the demo-detected face.
    #[arg(long, default_value = "demo")]
    name: String,

    /// Draw facial landmarks on the display output.
    #[arg(long)]
    show_landmarks: bool,
}

#[derive(Deserialize)]
struct CameraFile {
    cameras: Vec<CameraEntry>,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum CameraEntry {
    Synthetic {
        name: String,
        #[serde(default = "default_width")]
        width: u32,
        #[serde(default = "default_height")]
        height: u32,
        #[serde(default = "default_fps")]
        fps: f64,
    },
    Mjpeg {
        name: String,
        url: String,
    },
    Mobile {
        name: String,
        base_url: String,
    },
    #[cfg(feature = "camera-ffmpeg")]
    Ffmpeg {
        name: String,
        input: String,
    },
}

fn default_width() -> u32 {
    DEFAULT_CAMERA_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_CAMERA_HEIGHT
}

fn default_fps() -> f64 {
    DEFAULT_CAMERA_FPS
}

/// Demo detector: boxes the brightest blob in the frame.
///
/// Stands in for a real inference backend so the pipeline can run
/// end-to-end without model files. The blob box is padded up to a
/// plausible face size; the embedding is the blob's normalized centroid.
struct BlobProvider {
    threshold: u8,
}

impl EmbeddingProvider for BlobProvider {
    fn detect_faces(
        &self,
        frame: &Frame,
    ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error + Send + Sync>> {
        let arr = frame.as_ndarray();
        let (h, w) = (frame.height() as usize, frame.width() as usize);

        let mut min_x = w;
        let mut min_y = h;
        let mut max_x = 0usize;
        let mut max_y = 0usize;
        let mut hits = 0u64;
        for y in 0..h {
            for x in 0..w {
                if arr[[y, x, 0]] >= self.threshold {
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                    hits += 1;
                }
            }
        }
        if hits == 0 {
            return Ok(Vec::new());
        }

        let bbox = FaceBox::new(
            min_x as f64,
            min_y as f64,
            (max_x - min_x + 1) as f64,
            (max_y - min_y + 1) as f64,
        );
        // Pad tiny blobs up to a detectable face size.
        let side = bbox.w.max(bbox.h).max(2.0 * MIN_FACE_SIZE);
        let (cx, cy) = bbox.center();
        let padded = FaceBox::new(cx - side / 2.0, cy - side / 2.0, side, side)
            .clamp_to(frame.width(), frame.height());

        Ok(vec![FaceObservation {
            bbox: padded,
            embedding: vec![(cx / w as f64) as f32, (cy / h as f64) as f32],
            score: 0.9,
            landmarks: None,
        }])
    }
}

/// Demo gallery: every face matches the single configured name.
struct SingleNameMatcher {
    name: String,
}

impl GalleryMatcher for SingleNameMatcher {
    fn match_embedding(
        &self,
        _embedding: &[f32],
    ) -> Result<MatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
        Ok(MatchOutcome {
            name: Some(self.name.clone()),
            confidence: 0.9,
        })
    }
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

    let config = EngineConfig {
        detection_workers: cli.workers,
        recognition_workers: cli.workers,
        drawing_workers: 1,
        verification_time: cli.verification_time,
        away_threshold: cli.away_threshold,
        show_landmarks: cli.show_landmarks,
        ..EngineConfig::default()
    };

    let mut engine = Engine::new(
        Arc::new(BlobProvider { threshold: 200 }),
        Arc::new(SingleNameMatcher {
            name: cli.name.clone(),
        }),
        Arc::new(BoxRenderer::default()),
        Box::new(LogLedger),
        Box::new(RollingStatsLogger::new()),
        config,
    );

    for (name, source) in build_cameras(&cli)? {
        if !engine.add_camera(&name, source) {
            log::warn!("camera {name} could not be added, continuing without it");
        }
    }

    let epoch = Instant::now();
    let mut last_status = Instant::now();
    while epoch.elapsed().as_secs_f64() < cli.duration {
        engine.tick(epoch.elapsed().as_secs_f64());

        if last_status.elapsed() >= Duration::from_secs(1) {
            let (present, away) = engine.presence_status();
            log::info!("present: {present} | away: {away}");
            last_status = Instant::now();
        }
        std::thread::sleep(Duration::from_secs_f64(1.0 / DEFAULT_CAMERA_FPS));
    }

    let (present, away) = engine.presence_status();
    println!("Present: {present}");
    println!("Away: {away}");
    engine.shutdown();
    Ok(())
}

fn build_cameras(
    cli: &Cli,
) -> Result<Vec<(String, Box<dyn CameraSource>)>, Box<dyn std::error::Error>> {
    let Some(path) = &cli.config else {
        let cam = SyntheticCamera::new(
            DEFAULT_CAMERA_WIDTH,
            DEFAULT_CAMERA_HEIGHT,
            DEFAULT_CAMERA_FPS,
        );
        return Ok(vec![("synthetic".to_string(), Box::new(cam) as _)]);
    };

    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
    let file: CameraFile = serde_json::from_str(&text)
        .map_err(|e| format!("invalid camera config {}: {e}", path.display()))?;
    if file.cameras.is_empty() {
        return Err("camera config lists no cameras".into());
    }

    Ok(file
        .cameras
        .into_iter()
        .map(|entry| match entry {
            CameraEntry::Synthetic {
                name,
                width,
                height,
                fps,
            } => {
                let cam: Box<dyn CameraSource> = Box::new(SyntheticCamera::new(width, height, fps));
                (name, cam)
            }
            CameraEntry::Mjpeg { name, url } => {
                let cam: Box<dyn CameraSource> = Box::new(MjpegCamera::new(&url));
                (name, cam)
            }
            CameraEntry::Mobile { name, base_url } => {
                let cam: Box<dyn CameraSource> = Box::new(MobileCamera::new(&base_url));
                (name, cam)
            }
            #[cfg(feature = "camera-ffmpeg")]
            CameraEntry::Ffmpeg { name, input } => {
                use rollcall_core::camera::infrastructure::ffmpeg_camera::FfmpegCamera;
                let cam: Box<dyn CameraSource> = Box::new(FfmpegCamera::new(&input));
                (name, cam)
            }
        })
        .collect())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.duration <= 0.0 {
        return Err(format!("Duration must be positive, got {}", cli.duration).into());
    }
    if cli.verification_time < 0.0 {
        return Err(format!(
            "Verification time must not be negative, got {}",
            cli.verification_time
        )
        .into());
    }
    if cli.away_threshold <= 0.0 {
        return Err(format!(
            "Away threshold must be positive, got {}",
            cli.away_threshold
        )
        .into());
    }
    if cli.workers == 0 {
        return Err("Worker count must be at least 1".into());
    }
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    Ok(())
}

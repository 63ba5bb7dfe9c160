use std::path::PathBuf;
use std::process;

use clap::Parser;

use facethumb_core::conversion::infrastructure::converter_factory::{
    create_gray_converter, GrayBackend,
};
use facethumb_core::detection::domain::face_scorer::FaceScorer;
use facethumb_core::detection::infrastructure::cascade_resolver;
use facethumb_core::detection::infrastructure::haar_cascade_detector::{
    HaarCascadeDetector, EYE_CASCADE_PARAMS, FACE_CASCADE_PARAMS,
};
use facethumb_core::pipeline::scan_logger::LogScanLogger;
use facethumb_core::pipeline::select_face_use_case::{SelectFaceUseCase, SelectorConfig};
use facethumb_core::shared::constants::{
    DEFAULT_INTERVAL, DEFAULT_START_TIME, EYE_CASCADE_NAME, EYE_CASCADE_URL, FACE_CASCADE_NAME,
    FACE_CASCADE_URL, JPEG_QUALITY, MIN_FACE_SIZE, MIN_SCORE, THUMBNAIL_WIDTH,
};
use facethumb_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use facethumb_core::video::infrastructure::jpeg_thumbnail_writer::JpegThumbnailWriter;

/// Pick a clear frontal-face frame from a video and save it as a thumbnail.
#[derive(Parser, Debug)]
#[command(name = "facethumb", version)]
struct Cli {
    /// Input video file.
    video: PathBuf,

    /// Output JPEG thumbnail.
    output: PathBuf,

    /// First sampled timestamp, in seconds.
    #[arg(long, default_value_t = DEFAULT_START_TIME, allow_negative_numbers = true)]
    start_time: f64,

    /// Seconds between sampled frames.
    #[arg(long, default_value_t = DEFAULT_INTERVAL, allow_negative_numbers = true)]
    interval: f64,

    /// Minimum face area as a fraction of the frame (0.0-1.0).
    #[arg(long, default_value_t = MIN_FACE_SIZE)]
    min_face_size: f64,

    /// Minimum total score (0-100) for a face to be selected.
    #[arg(long, default_value_t = MIN_SCORE)]
    min_score: f64,

    /// Thumbnail width in pixels.
    #[arg(long, default_value_t = THUMBNAIL_WIDTH)]
    width: u32,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = JPEG_QUALITY)]
    quality: u8,

    /// Directory containing the Haar cascade XML files.
    #[arg(long)]
    cascade_dir: Option<PathBuf>,

    /// Skip the GPU probe and convert frames on the CPU.
    #[arg(long)]
    cpu: bool,

    /// Print the selection as JSON on stdout.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version are not failures
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Returns whether a thumbnail was written.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    validate(&cli)?;

    let (face_detector, eye_detector) = build_detectors(&cli)?;
    let backend = if cli.cpu {
        GrayBackend::Cpu
    } else {
        GrayBackend::Auto
    };
    let converter = create_gray_converter(backend);

    let config = SelectorConfig {
        start_time: cli.start_time,
        interval: cli.interval,
        thumbnail_width: cli.width,
    };

    let mut use_case = SelectFaceUseCase::new(
        Box::new(FfmpegReader::new()),
        converter,
        Box::new(face_detector),
        Box::new(eye_detector),
        Box::new(JpegThumbnailWriter::new(cli.quality)),
        FaceScorer::new(cli.min_face_size, cli.min_score),
        config,
        Box::new(LogScanLogger::new(cli.min_face_size, cli.min_score)),
    );

    match use_case.execute(&cli.video, &cli.output)? {
        Some(selection) => {
            log::info!(
                "Thumbnail written to {} (frame {}, score {:.1})",
                selection.output_path.display(),
                selection.frame_index,
                selection.score.total_score
            );
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&selection)?);
            }
            Ok(true)
        }
        None => Ok(false),
    }
}

fn build_detectors(
    cli: &Cli,
) -> Result<(HaarCascadeDetector, HaarCascadeDetector), Box<dyn std::error::Error>> {
    let extra_dir = cli.cascade_dir.as_deref();

    log::info!("Resolving cascade: {FACE_CASCADE_NAME}");
    let face_path = cascade_resolver::resolve(
        FACE_CASCADE_NAME,
        FACE_CASCADE_URL,
        extra_dir,
        Some(Box::new(download_progress)),
    )?;
    log::info!("Resolving cascade: {EYE_CASCADE_NAME}");
    let eye_path = cascade_resolver::resolve(
        EYE_CASCADE_NAME,
        EYE_CASCADE_URL,
        extra_dir,
        Some(Box::new(download_progress)),
    )?;

    let face = HaarCascadeDetector::load(&face_path, FACE_CASCADE_PARAMS)?;
    let eyes = HaarCascadeDetector::load(&eye_path, EYE_CASCADE_PARAMS)?;
    Ok((face, eyes))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.video.is_file() {
        return Err(format!("Video file not found: {}", cli.video.display()).into());
    }
    if !cli.start_time.is_finite() || cli.start_time < 0.0 {
        return Err(format!("Start time must be 0 or more seconds, got {}", cli.start_time).into());
    }
    if !cli.interval.is_finite() || cli.interval <= 0.0 {
        return Err(format!("Interval must be greater than 0, got {}", cli.interval).into());
    }
    if !(0.0..=1.0).contains(&cli.min_face_size) {
        return Err(format!(
            "Minimum face size must be between 0.0 and 1.0, got {}",
            cli.min_face_size
        )
        .into());
    }
    if !(0.0..=100.0).contains(&cli.min_score) {
        return Err(format!("Minimum score must be between 0 and 100, got {}", cli.min_score).into());
    }
    if cli.width == 0 {
        return Err("Width must be at least 1 pixel".into());
    }
    if !(1..=100).contains(&cli.quality) {
        return Err(format!("Quality must be between 1 and 100, got {}", cli.quality).into());
    }
    if let Some(dir) = &cli.cascade_dir {
        if !dir.is_dir() {
            return Err(format!("Cascade directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading cascade... {pct}%");
    } else {
        eprint!("\rDownloading cascade... {downloaded} bytes");
    }
    if total > 0 && downloaded >= total {
        eprintln!();
    }
}

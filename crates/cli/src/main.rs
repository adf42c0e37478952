use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use posecheck_core::classification::domain::classification_policy::{
    ClassificationPolicy, RuleOrder,
};
use posecheck_core::classification::domain::validity_classifier::ValidityClassifier;
use posecheck_core::detection::domain::face_detector::FaceDetector;
use posecheck_core::detection::domain::raw_detection::BackendKind;
use posecheck_core::detection::infrastructure::replay_detector::ReplayDetector;
use posecheck_core::pipeline::detection_sink::{DetectionSink, FanOutSink, LoggingSink};
use posecheck_core::pipeline::infrastructure::annotating_sink::{load_font, AnnotatingSink};
use posecheck_core::pipeline::infrastructure::json_report_sink::JsonReportSink;
use posecheck_core::pipeline::infrastructure::prefetching_reader::PrefetchingReader;
use posecheck_core::pipeline::pipeline_logger::SummaryPipelineLogger;
use posecheck_core::pipeline::validate_stream_use_case::ValidateStreamUseCase;
use posecheck_core::shared::constants::{DEFAULT_PROGRESS_THROTTLE, IMAGE_EXTENSIONS};
use posecheck_core::video::domain::video_reader::VideoReader;
use posecheck_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use posecheck_core::video::infrastructure::image_file_reader::ImageFileReader;
use posecheck_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Classify detected faces in a video or image as valid or invalid.
#[derive(Parser)]
#[command(name = "posecheck")]
struct Cli {
    /// Input video or image file.
    input: PathBuf,

    /// Recorded detector output (JSON lines: {"frame": n, "detections": [...]}).
    #[arg(long)]
    detections: PathBuf,

    /// Detector that produced the recording: insightface, scrfd or yunet.
    #[arg(long, default_value = "insightface")]
    backend: BackendKind,

    /// Start from a named policy: insightface-threshold, insightface-angle or yunet-roll.
    #[arg(long, conflicts_with = "policy")]
    preset: Option<String>,

    /// Policy JSON file; explicit flags override its values.
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Minimum detector confidence (0.0-1.0) [default: 0.5].
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Minimum face width and height in pixels [default: 60].
    #[arg(long)]
    min_face_size: Option<f64>,

    /// Roll tolerance in degrees around level and upside-down (0-90) [default: 30].
    #[arg(long)]
    max_tilt: Option<f64>,

    /// Post-confidence checks: size-then-tilt, tilt-then-size, size-only, tilt-only.
    #[arg(long)]
    rule_order: Option<RuleOrder>,

    /// Write annotated frames to this directory.
    #[arg(long)]
    annotate: Option<PathBuf>,

    /// Font file used to caption annotated boxes (requires --annotate).
    #[arg(long, requires = "annotate")]
    font: Option<PathBuf>,

    /// Write one JSON line per frame to this file.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Log progress every N frames.
    #[arg(long, default_value_t = DEFAULT_PROGRESS_THROTTLE)]
    throttle: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let policy = build_policy(&cli)?;
    log::info!("Policy: {policy}");

    let detector: Box<dyn FaceDetector> =
        Box::new(ReplayDetector::from_path(&cli.detections, cli.backend)?);
    let sink = build_sink(&cli)?;

    let mut reader = open_reader(&cli.input);
    let metadata = reader.open(&cli.input)?;

    let mut use_case = ValidateStreamUseCase::new(
        reader,
        detector,
        sink,
        ValidityClassifier::new(policy),
        Box::new(SummaryPipelineLogger::new(cli.throttle)),
        None,
        cli.max_frames,
    );
    let summary = use_case.execute(&metadata)?;
    println!("{summary}");
    Ok(())
}

fn build_policy(cli: &Cli) -> Result<ClassificationPolicy, Box<dyn std::error::Error>> {
    let base = match (&cli.preset, &cli.policy) {
        (Some(name), _) => ClassificationPolicy::preset(name)
            .ok_or_else(|| format!("Unknown preset '{name}'"))?,
        (None, Some(path)) => ClassificationPolicy::from_json_file(path)?,
        (None, None) => ClassificationPolicy::default(),
    };

    Ok(base.with_overrides(
        cli.min_confidence,
        cli.min_face_size,
        cli.max_tilt,
        cli.rule_order,
    )?)
}

fn build_sink(cli: &Cli) -> Result<Box<dyn DetectionSink>, Box<dyn std::error::Error>> {
    let mut sinks: Vec<Box<dyn DetectionSink>> = vec![Box::new(LoggingSink)];
    if let Some(dir) = &cli.annotate {
        let mut annotator = AnnotatingSink::new(Box::new(ImageFileWriter::new()), dir.clone());
        if let Some(font) = &cli.font {
            annotator = annotator.with_font(load_font(font)?);
        }
        sinks.push(Box::new(annotator));
    }
    if let Some(path) = &cli.report {
        sinks.push(Box::new(JsonReportSink::create(path)?));
    }
    Ok(Box::new(FanOutSink::new(sinks)))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !cli.detections.exists() {
        return Err(format!(
            "Detections file not found: {}",
            cli.detections.display()
        )
        .into());
    }
    if let Some(name) = &cli.preset {
        if !ClassificationPolicy::PRESET_NAMES.contains(&name.as_str()) {
            return Err(format!(
                "Preset must be one of: {}, got '{name}'",
                ClassificationPolicy::PRESET_NAMES.join(", ")
            )
            .into());
        }
    }
    if cli.max_frames == Some(0) {
        return Err("--max-frames must be at least 1".into());
    }
    if cli.throttle == 0 {
        return Err("--throttle must be at least 1".into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn open_reader(input: &Path) -> Box<dyn VideoReader> {
    if is_image(input) {
        Box::new(ImageFileReader::new())
    } else {
        Box::new(PrefetchingReader::new(Box::new(FfmpegReader::new())))
    }
}

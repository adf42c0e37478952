use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::classification::domain::validity_classifier::ValidityClassifier;
use crate::classification::domain::validity_label::ValidityLabel;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

use super::detection_sink::DetectionSink;
use super::frame_classification::{classify_frame, FrameReport};
use super::pipeline_logger::PipelineLogger;

/// Totals for one validation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: usize,
    pub valid: usize,
    pub low_confidence: usize,
    pub too_small: usize,
    pub tilted: usize,
    pub dropped: usize,
    /// True when the run ended on the cancel flag or the frame limit.
    pub stopped_early: bool,
}

impl RunSummary {
    pub fn count(&self, label: ValidityLabel) -> usize {
        match label {
            ValidityLabel::Valid => self.valid,
            ValidityLabel::LowConfidence => self.low_confidence,
            ValidityLabel::TooSmall => self.too_small,
            ValidityLabel::Tilted => self.tilted,
        }
    }

    pub fn detections(&self) -> usize {
        ValidityLabel::ALL.iter().map(|&label| self.count(label)).sum()
    }

    fn add(&mut self, report: &FrameReport) {
        self.frames += 1;
        self.dropped += report.dropped;
        for labeled in &report.labeled {
            match labeled.label {
                ValidityLabel::Valid => self.valid += 1,
                ValidityLabel::LowConfidence => self.low_confidence += 1,
                ValidityLabel::TooSmall => self.too_small += 1,
                ValidityLabel::Tilted => self.tilted += 1,
            }
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} frames, {} detections:", self.frames, self.detections())?;
        for &label in ValidityLabel::ALL {
            write!(f, " {} {},", self.count(label), label)?;
        }
        write!(f, " {} dropped", self.dropped)
    }
}

/// Drives the frame loop: read → detect → normalize and classify → sink.
///
/// Single-use: `execute` takes the owned reader, detector and sink.
pub struct ValidateStreamUseCase {
    reader: Option<Box<dyn VideoReader>>,
    detector: Option<Box<dyn FaceDetector>>,
    sink: Option<Box<dyn DetectionSink>>,
    classifier: ValidityClassifier,
    logger: Box<dyn PipelineLogger>,
    cancelled: Arc<AtomicBool>,
    max_frames: Option<usize>,
}

impl ValidateStreamUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn FaceDetector>,
        sink: Box<dyn DetectionSink>,
        classifier: ValidityClassifier,
        logger: Box<dyn PipelineLogger>,
        cancelled: Option<Arc<AtomicBool>>,
        max_frames: Option<usize>,
    ) -> Self {
        Self {
            reader: Some(reader),
            detector: Some(detector),
            sink: Some(sink),
            classifier,
            logger,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
            max_frames,
        }
    }

    /// Runs until the source is exhausted, the cancel flag is raised, or
    /// `max_frames` frames were processed. A frame or detector error aborts
    /// the run; the reader is closed either way.
    pub fn execute(
        &mut self,
        metadata: &VideoMetadata,
    ) -> Result<RunSummary, Box<dyn std::error::Error>> {
        let mut reader = self.reader.take().ok_or("Pipeline already executed")?;
        let mut detector = self.detector.take().ok_or("Pipeline already executed")?;
        let mut sink = self.sink.take().ok_or("Pipeline already executed")?;

        let total = match (self.max_frames, metadata.total_frames) {
            (Some(limit), 0) => limit,
            (Some(limit), total) => limit.min(total),
            (None, total) => total,
        };
        self.logger.info(&format!(
            "Validating {}x{} {} with {} detections, rule order {}",
            metadata.width,
            metadata.height,
            if metadata.is_still_image() { "image" } else { "stream" },
            detector.backend(),
            self.classifier.policy().rule_order()
        ));

        let result = self.run_loop(&mut *reader, &mut *detector, &mut *sink, total);
        reader.close();
        let summary = result?;
        sink.finish()?;

        self.logger.summary();
        log::info!("{summary}");
        Ok(summary)
    }

    fn run_loop(
        &mut self,
        reader: &mut dyn VideoReader,
        detector: &mut dyn FaceDetector,
        sink: &mut dyn DetectionSink,
        total: usize,
    ) -> Result<RunSummary, Box<dyn std::error::Error>> {
        let mut summary = RunSummary::default();
        let backend = detector.backend();

        for frame in reader.frames() {
            if self.cancelled.load(Ordering::Relaxed) {
                log::info!("Cancelled after {} frames", summary.frames);
                summary.stopped_early = true;
                break;
            }
            if self.max_frames.is_some_and(|limit| summary.frames >= limit) {
                summary.stopped_early = true;
                break;
            }

            let frame = frame?;

            let t0 = Instant::now();
            let raw = detector.detect(&frame)?;
            self.logger
                .timing("detect", t0.elapsed().as_secs_f64() * 1000.0);

            let t0 = Instant::now();
            let report = classify_frame(frame.index(), &raw, backend, &self.classifier);
            self.logger
                .timing("classify", t0.elapsed().as_secs_f64() * 1000.0);

            let t0 = Instant::now();
            sink.consume(&frame, &report)?;
            self.logger
                .timing("sink", t0.elapsed().as_secs_f64() * 1000.0);

            self.logger.metric("detections", raw.len() as f64);
            self.logger
                .metric("valid", report.count(ValidityLabel::Valid) as f64);
            self.logger.metric("dropped", report.dropped as f64);

            summary.add(&report);
            self.logger.progress(summary.frames, total);
        }

        Ok(summary)
    }
}

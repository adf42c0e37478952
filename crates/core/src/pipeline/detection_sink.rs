use crate::shared::frame::Frame;

use super::frame_classification::FrameReport;

/// Consumer of classified frames (renderer, report writer, ...).
///
/// Called once per frame, in stream order, with the frame the detections
/// were made on.
pub trait DetectionSink: Send {
    fn consume(&mut self, frame: &Frame, report: &FrameReport)
        -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes buffered output at end of run. Default: no-op.
    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}

/// Logs one line per labeled detection at `info`.
pub struct LoggingSink;

impl DetectionSink for LoggingSink {
    fn consume(
        &mut self,
        _frame: &Frame,
        report: &FrameReport,
    ) -> Result<(), Box<dyn std::error::Error>> {
        for labeled in &report.labeled {
            let (x1, y1, x2, y2) = labeled.detection.bbox().to_pixel_rect();
            log::info!(
                "frame {}: {} at ({x1}, {y1})-({x2}, {y2})",
                report.frame_index,
                labeled.annotation_text()
            );
        }
        Ok(())
    }
}

/// Forwards every frame to each inner sink in turn.
///
/// Stops at the first failing sink.
pub struct FanOutSink {
    sinks: Vec<Box<dyn DetectionSink>>,
}

impl FanOutSink {
    pub fn new(sinks: Vec<Box<dyn DetectionSink>>) -> Self {
        Self { sinks }
    }
}

impl DetectionSink for FanOutSink {
    fn consume(
        &mut self,
        frame: &Frame,
        report: &FrameReport,
    ) -> Result<(), Box<dyn std::error::Error>> {
        for sink in &mut self.sinks {
            sink.consume(frame, report)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        for sink in &mut self.sinks {
            sink.finish()?;
        }
        Ok(())
    }
}

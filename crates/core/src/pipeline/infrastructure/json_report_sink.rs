use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::pipeline::detection_sink::DetectionSink;
use crate::pipeline::frame_classification::FrameReport;
use crate::shared::frame::Frame;

/// Writes one JSON object per frame (JSON lines) to a report file.
pub struct JsonReportSink {
    out: BufWriter<File>,
    path: PathBuf,
    lines: usize,
}

impl JsonReportSink {
    pub fn create(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)
            .map_err(|e| format!("Cannot create report {}: {e}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
            path: path.to_path_buf(),
            lines: 0,
        })
    }
}

impl DetectionSink for JsonReportSink {
    fn consume(
        &mut self,
        _frame: &Frame,
        report: &FrameReport,
    ) -> Result<(), Box<dyn std::error::Error>> {
        serde_json::to_writer(&mut self.out, report)?;
        self.out.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.out.flush()?;
        log::info!("Wrote {} report lines to {}", self.lines, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::validity_label::ValidityLabel;
    use crate::detection::domain::bounding_box::BoundingBox;
    use crate::detection::domain::detection::Detection;
    use crate::pipeline::frame_classification::LabeledDetection;

    fn frame() -> Frame {
        Frame::new(vec![0u8; 3], 1, 1, 3, 0)
    }

    fn report(index: usize, label: ValidityLabel) -> FrameReport {
        let bbox = BoundingBox::new(10.0, 10.0, 60.0, 60.0).unwrap();
        FrameReport {
            frame_index: index,
            labeled: vec![LabeledDetection {
                detection: Detection::new(bbox, 0.92, None).unwrap(),
                label,
            }],
            dropped: 1,
        }
    }

    #[test]
    fn test_one_line_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.jsonl");
        let mut sink = JsonReportSink::create(&path).unwrap();

        sink.consume(&frame(), &report(0, ValidityLabel::Valid)).unwrap();
        sink.consume(&frame(), &report(1, ValidityLabel::TooSmall))
            .unwrap();
        sink.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["frame_index"], 0);
        assert_eq!(lines[0]["dropped"], 1);
        assert_eq!(lines[0]["labeled"][0]["label"], "valid");
        assert_eq!(lines[1]["labeled"][0]["label"], "too_small");
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.jsonl");
        let mut sink = JsonReportSink::create(&path).unwrap();
        sink.finish().unwrap();
        assert!(path.exists());
    }
}

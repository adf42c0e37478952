use std::path::{Path, PathBuf};

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::pipeline::detection_sink::DetectionSink;
use crate::pipeline::frame_classification::{FrameReport, LabeledDetection};
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

const BOX_THICKNESS: i64 = 2;
const LANDMARK_RADIUS: i32 = 3;
const CAPTION_SCALE: f32 = 16.0;

/// Draws each detection's box and landmarks in its label color and writes
/// the annotated frame as `frame_NNNNNN.png` under `output_dir`.
///
/// Captions such as `"Valid (0.92)"` are drawn above the box when a font
/// is set, and only logged otherwise.
pub struct AnnotatingSink {
    writer: Box<dyn ImageWriter>,
    output_dir: PathBuf,
    font: Option<FontArc>,
    written: usize,
}

impl AnnotatingSink {
    pub fn new(writer: Box<dyn ImageWriter>, output_dir: PathBuf) -> Self {
        Self {
            writer,
            output_dir,
            font: None,
            written: 0,
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn frame_path(&self, frame_index: usize) -> PathBuf {
        self.output_dir.join(format!("frame_{frame_index:06}.png"))
    }
}

/// Loads a TrueType/OpenType font for captions.
pub fn load_font(path: &Path) -> Result<FontArc, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Cannot read font {}: {e}", path.display()))?;
    FontArc::try_from_vec(bytes)
        .map_err(|e| format!("Invalid font {}: {e}", path.display()).into())
}

impl DetectionSink for AnnotatingSink {
    fn consume(
        &mut self,
        frame: &Frame,
        report: &FrameReport,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut canvas = frame
            .to_rgb_image()
            .ok_or("annotation needs an RGB frame matching its dimensions")?;

        for labeled in &report.labeled {
            annotate(&mut canvas, labeled, self.font.as_ref());
            log::debug!(
                "frame {}: {}",
                report.frame_index,
                labeled.annotation_text()
            );
        }

        let annotated = Frame::from_rgb_image(canvas, frame.index());
        self.writer
            .write(&self.frame_path(report.frame_index), &annotated)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        log::info!(
            "Wrote {} annotated frames to {}",
            self.written,
            self.output_dir.display()
        );
        Ok(())
    }
}

fn annotate(canvas: &mut RgbImage, labeled: &LabeledDetection, font: Option<&FontArc>) {
    let color = Rgb(labeled.color());
    let (width, height) = canvas.dimensions();

    if let Some(rect) = visible_rect(labeled.detection.bbox().to_pixel_rect(), width, height) {
        for inset in 0..BOX_THICKNESS {
            if let Some(inner) = shrink(rect, inset) {
                draw_hollow_rect_mut(canvas, inner, color);
            }
        }
        if let Some(font) = font {
            let y = (rect.top() - CAPTION_SCALE as i32 - 2).max(0);
            draw_text_mut(
                canvas,
                color,
                rect.left().max(0),
                y,
                PxScale::from(CAPTION_SCALE),
                font,
                &labeled.annotation_text(),
            );
        }
    }

    let r = f64::from(LANDMARK_RADIUS);
    for &(x, y) in labeled.detection.landmark_points() {
        let on_canvas =
            (-r..=f64::from(width) + r).contains(&x) && (-r..=f64::from(height) + r).contains(&y);
        if on_canvas {
            draw_filled_circle_mut(canvas, (x as i32, y as i32), LANDMARK_RADIUS, color);
        }
    }
}

/// The box clamped to one pixel beyond each frame edge, or `None` when it
/// lies entirely off the frame. Clamped edges fall outside the canvas and
/// are clipped by the drawing routines.
fn visible_rect((x1, y1, x2, y2): (i64, i64, i64, i64), width: u32, height: u32) -> Option<Rect> {
    let (w, h) = (i64::from(width), i64::from(height));
    if x2 < 0 || y2 < 0 || x1 >= w || y1 >= h {
        return None;
    }
    let (x1, x2) = (x1.clamp(-1, w), x2.clamp(-1, w));
    let (y1, y2) = (y1.clamp(-1, h), y2.clamp(-1, h));
    Some(
        Rect::at(x1 as i32, y1 as i32)
            .of_size((x2 - x1 + 1) as u32, (y2 - y1 + 1) as u32),
    )
}

fn shrink(rect: Rect, inset: i64) -> Option<Rect> {
    let w = i64::from(rect.width()) - 2 * inset;
    let h = i64::from(rect.height()) - 2 * inset;
    if w <= 0 || h <= 0 {
        return None;
    }
    let inset = inset as i32;
    Some(Rect::at(rect.left() + inset, rect.top() + inset).of_size(w as u32, h as u32))
}

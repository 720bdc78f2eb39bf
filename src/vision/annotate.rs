//! Bounding box annotation
//!
//! Draws one rectangle outline and one text label per located text block onto
//! a copy of the upright image.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{debug, warn};

use super::{BoundingBox, RecognitionResult};

/// Colors and sizes used for annotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationStyle {
    pub stroke_color: Rgba<u8>,
    /// Outline width in pixels, centered on the rectangle edge
    pub stroke_width: u32,
    pub label_color: Rgba<u8>,
    /// Label height in pixels
    pub label_size: f32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            stroke_color: Rgba([255, 0, 0, 255]),
            stroke_width: 8,
            label_color: Rgba([0, 0, 255, 255]),
            label_size: 40.0,
        }
    }
}

/// Drawing surface for annotations
pub trait Canvas {
    /// Stroke an unfilled rectangle outline
    fn stroke_rect(&mut self, bounds: &BoundingBox, color: Rgba<u8>, width: u32);

    /// Draw `text` with its baseline starting at `(x, baseline)`.
    /// Returns false when the label could not be drawn.
    fn draw_label(&mut self, text: &str, x: i32, baseline: i32, color: Rgba<u8>, size: f32) -> bool;
}

/// Canvas that paints onto an RGBA buffer
pub struct ImageCanvas<'a> {
    image: &'a mut RgbaImage,
    font: Option<&'a FontArc>,
}

impl<'a> ImageCanvas<'a> {
    pub fn new(image: &'a mut RgbaImage, font: Option<&'a FontArc>) -> Self {
        Self { image, font }
    }
}

/// Label origins are kept within this distance of the image origin
const LABEL_REACH: i32 = 1 << 20;

impl Canvas for ImageCanvas<'_> {
    fn stroke_rect(&mut self, bounds: &BoundingBox, color: Rgba<u8>, width: u32) {
        let width = width.clamp(1, 1 << 16) as i32;
        let outer = width / 2;

        // Edges further out than one stroke width are never visible
        let reach_x = self.image.width().min(1 << 24) as i32 + width;
        let reach_y = self.image.height().min(1 << 24) as i32 + width;
        let bounds = BoundingBox::new(
            bounds.left.clamp(-width, reach_x),
            bounds.top.clamp(-width, reach_y),
            bounds.right.clamp(-width, reach_x),
            bounds.bottom.clamp(-width, reach_y),
        );

        for inset in -outer..(width - outer) {
            let w = bounds.width() - 2 * inset;
            let h = bounds.height() - 2 * inset;
            if w <= 0 || h <= 0 {
                continue;
            }
            let rect = Rect::at(bounds.left + inset, bounds.top + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(self.image, rect, color);
        }
    }

    fn draw_label(&mut self, text: &str, x: i32, baseline: i32, color: Rgba<u8>, size: f32) -> bool {
        let Some(font) = self.font else {
            return false;
        };
        let scale = PxScale::from(size);
        let ascent = font.as_scaled(scale).ascent();
        let x = x.clamp(-LABEL_REACH, LABEL_REACH);
        let top = baseline.clamp(-LABEL_REACH, LABEL_REACH) - ascent.round() as i32;
        draw_text_mut(self.image, color, x, top, scale, font, text);
        true
    }
}

/// Result of annotating an image
#[derive(Debug, Clone)]
pub struct AnnotatedImage {
    pub image: RgbaImage,
    pub rectangles: usize,
    pub labels: usize,
}

/// Draws recognition results onto images
pub struct Annotator {
    style: AnnotationStyle,
    font: Option<FontArc>,
}

impl Annotator {
    /// Create an annotator; without a font only rectangles are drawn
    pub fn new(style: AnnotationStyle, font: Option<FontArc>) -> Self {
        if font.is_none() {
            warn!("No label font available, annotations will omit text labels");
        }
        Self { style, font }
    }

    /// Load a TrueType/OpenType font for labels
    pub fn load_font(path: &Path) -> Result<FontArc> {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read font {:?}", path))?;
        FontArc::try_from_vec(bytes).with_context(|| format!("Invalid font file {:?}", path))
    }

    /// Draw every located block onto `canvas` in block order.
    /// Returns the number of rectangles and labels drawn.
    pub fn draw<C: Canvas>(&self, canvas: &mut C, result: &RecognitionResult) -> (usize, usize) {
        let mut rectangles = 0;
        let mut labels = 0;

        for block in &result.blocks {
            let Some(bounds) = block.bounds else {
                continue;
            };
            canvas.stroke_rect(&bounds, self.style.stroke_color, self.style.stroke_width);
            rectangles += 1;

            if canvas.draw_label(
                &block.text,
                bounds.left,
                bounds.bottom,
                self.style.label_color,
                self.style.label_size,
            ) {
                labels += 1;
            }
        }

        (rectangles, labels)
    }

    /// Annotate a copy of `upright`; the input buffer is left untouched
    pub fn annotate(&self, upright: &RgbaImage, result: &RecognitionResult) -> AnnotatedImage {
        let mut image = upright.clone();
        let (rectangles, labels) = {
            let mut canvas = ImageCanvas::new(&mut image, self.font.as_ref());
            self.draw(&mut canvas, result)
        };

        debug!(
            "Annotated {}x{} image: {} rectangles, {} labels",
            image.width(),
            image.height(),
            rectangles,
            labels
        );

        AnnotatedImage { image, rectangles, labels }
    }
}

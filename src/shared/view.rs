//! Zoom/pan/rotate view over an annotated image

use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};

/// Accumulated gesture state for the zoom view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    /// Clockwise, in degrees
    pub rotation_degrees: f32,
    /// Pan offset in output pixels
    pub offset: (f32, f32),
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation_degrees: 0.0,
            offset: (0.0, 0.0),
        }
    }
}

impl ViewTransform {
    /// Fold one gesture into the transform
    ///
    /// Zoom multiplies, pan and rotation add. A zoom factor that is not a
    /// positive finite number is ignored.
    pub fn apply_gesture(&mut self, zoom_change: f32, pan: (f32, f32), rotation_change: f32) {
        if zoom_change.is_finite() && zoom_change > 0.0 {
            self.scale *= zoom_change;
        }
        self.offset.0 += pan.0;
        self.offset.1 += pan.1;
        self.rotation_degrees = (self.rotation_degrees + rotation_change) % 360.0;
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Projection mapping source pixels to view pixels
    ///
    /// Scale and rotation pivot on the image center; the pan offset is
    /// applied last.
    pub fn projection(&self, width: u32, height: u32) -> Projection {
        let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
        Projection::translate(self.offset.0, self.offset.1)
            * Projection::translate(cx, cy)
            * Projection::rotate(self.rotation_degrees.to_radians())
            * Projection::scale(self.scale, self.scale)
            * Projection::translate(-cx, -cy)
    }

    /// Render `image` through the transform onto a canvas of the same size
    pub fn render(&self, image: &RgbaImage) -> RgbaImage {
        if self.is_identity() {
            return image.clone();
        }
        let projection = self.projection(image.width(), image.height());
        warp(image, &projection, Interpolation::Bilinear, Rgba([0, 0, 0, 0]))
    }
}

//! EXIF orientation normalization
//!
//! Produces an upright pixel buffer: visual top ends up in row 0.

use anyhow::{Context, Result};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::path::Path;
use tracing::{debug, warn};

/// Clockwise rotation needed to make an image upright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Map a decoded orientation. Mirrored orientations are left as-is.
    pub fn from_orientation(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Rotate90 => Rotation::Cw90,
            Orientation::Rotate180 => Rotation::Cw180,
            Orientation::Rotate270 => Rotation::Cw270,
            Orientation::NoTransforms => Rotation::None,
            other => {
                debug!("Ignoring mirrored orientation {:?}", other);
                Rotation::None
            }
        }
    }

    /// Rotation angle in degrees clockwise
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }

    /// Apply the rotation. `None` hands the buffer back untouched.
    pub fn apply(&self, image: DynamicImage) -> DynamicImage {
        match self {
            Rotation::None => image,
            Rotation::Cw90 => image.rotate90(),
            Rotation::Cw180 => image.rotate180(),
            Rotation::Cw270 => image.rotate270(),
        }
    }
}

fn try_read_orientation(path: &Path) -> Result<Orientation> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    Ok(decoder.orientation()?)
}

/// Read the embedded orientation. Failure to read means no rotation.
pub fn read_rotation(path: &Path) -> Rotation {
    match try_read_orientation(path) {
        Ok(orientation) => {
            let rotation = Rotation::from_orientation(orientation);
            debug!("Orientation of {:?}: {:?}, rotating {} degrees", path, orientation, rotation.degrees());
            rotation
        }
        Err(e) => {
            warn!("Could not read orientation of {:?}, assuming upright: {}", path, e);
            Rotation::None
        }
    }
}

/// Decode an image and rotate it upright
pub fn load_upright(path: &Path) -> Result<DynamicImage> {
    let rotation = read_rotation(path);
    let image = image::open(path).with_context(|| format!("Failed to decode image {:?}", path))?;
    Ok(rotation.apply(image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_jpeg_with_orientation;
    use image::{Rgba, RgbaImage};

    /// 3x2 image with a distinct color in each corner
    fn marker_image() -> DynamicImage {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([255, 255, 255, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255])); // top-left red
        img.put_pixel(2, 0, Rgba([0, 255, 0, 255])); // top-right green
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255])); // bottom-left blue
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_orientation_mapping() {
        assert_eq!(Rotation::from_orientation(Orientation::NoTransforms), Rotation::None);
        assert_eq!(Rotation::from_orientation(Orientation::Rotate90), Rotation::Cw90);
        assert_eq!(Rotation::from_orientation(Orientation::Rotate180), Rotation::Cw180);
        assert_eq!(Rotation::from_orientation(Orientation::Rotate270), Rotation::Cw270);
        // Mirrored
        assert_eq!(Rotation::from_orientation(Orientation::FlipHorizontal), Rotation::None);
        assert_eq!(Rotation::from_orientation(Orientation::Rotate90FlipH), Rotation::None);
        assert_eq!(Rotation::Cw270.degrees(), 270);
    }

    fn is_dark(image: &RgbaImage, x: u32, y: u32) -> bool {
        image.get_pixel(x, y).0[0] < 64
    }

    #[test]
    fn test_read_rotation_from_jpeg_exif() {
        let dir = tempfile::tempdir().unwrap();
        for (tag, expected) in [(1, Rotation::None), (6, Rotation::Cw90), (3, Rotation::Cw180), (8, Rotation::Cw270)] {
            let path = dir.path().join(format!("tag{}.jpg", tag));
            write_jpeg_with_orientation(&path, 40, 20, tag);
            assert_eq!(read_rotation(&path), expected, "orientation tag {}", tag);
        }
    }

    #[test]
    fn test_load_upright_jpeg_tagged_6_turns_left_edge_to_top() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portrait.jpg");
        write_jpeg_with_orientation(&path, 40, 20, 6);

        let upright = load_upright(&path).unwrap().to_rgba8();
        assert_eq!(upright.dimensions(), (20, 40));
        assert!(is_dark(&upright, 10, 5));
        assert!(!is_dark(&upright, 10, 35));
    }

    #[test]
    fn test_load_upright_jpeg_tagged_8_turns_left_edge_to_bottom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portrait.jpg");
        write_jpeg_with_orientation(&path, 40, 20, 8);

        let upright = load_upright(&path).unwrap().to_rgba8();
        assert_eq!(upright.dimensions(), (20, 40));
        assert!(!is_dark(&upright, 10, 5));
        assert!(is_dark(&upright, 10, 35));
    }

    #[test]
    fn test_load_upright_jpeg_tagged_3_and_1() {
        let dir = tempfile::tempdir().unwrap();
        let flipped = dir.path().join("flipped.jpg");
        write_jpeg_with_orientation(&flipped, 40, 20, 3);
        let upright = load_upright(&flipped).unwrap().to_rgba8();
        assert_eq!(upright.dimensions(), (40, 20));
        assert!(!is_dark(&upright, 5, 10));
        assert!(is_dark(&upright, 35, 10));

        let plain = dir.path().join("plain.jpg");
        write_jpeg_with_orientation(&plain, 40, 20, 1);
        let upright = load_upright(&plain).unwrap().to_rgba8();
        assert_eq!(upright.dimensions(), (40, 20));
        assert!(is_dark(&upright, 5, 10));
        assert!(!is_dark(&upright, 35, 10));
    }

    #[test]
    fn test_rotate_none_unchanged() {
        let img = marker_image();
        let out = Rotation::None.apply(img.clone());
        assert_eq!(out.to_rgba8(), img.to_rgba8());
    }

    #[test]
    fn test_rotate_90() {
        let out = Rotation::Cw90.apply(marker_image()).to_rgba8();
        assert_eq!(out.dimensions(), (2, 3));
        // Bottom-left moves to top-left, top-left to top-right
        assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
        assert_eq!(out.get_pixel(1, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(1, 2), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_rotate_180() {
        let out = Rotation::Cw180.apply(marker_image()).to_rgba8();
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(out.get_pixel(2, 1), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(0, 1), &Rgba([0, 255, 0, 255]));
        assert_eq!(out.get_pixel(2, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_rotate_270() {
        let out = Rotation::Cw270.apply(marker_image()).to_rgba8();
        assert_eq!(out.dimensions(), (2, 3));
        // Top-right moves to top-left, top-left to bottom-left
        assert_eq!(out.get_pixel(0, 0), &Rgba([0, 255, 0, 255]));
        assert_eq!(out.get_pixel(0, 2), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(1, 2), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_unreadable_metadata_means_no_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert_eq!(read_rotation(&path), Rotation::None);
        assert_eq!(read_rotation(&dir.path().join("missing.jpg")), Rotation::None);
    }

    #[test]
    fn test_load_upright_png_without_exif() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.png");
        marker_image().save(&path).unwrap();

        let upright = load_upright(&path).unwrap();
        assert_eq!(upright.to_rgba8(), marker_image().to_rgba8());
    }

    #[test]
    fn test_load_upright_decode_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"garbage").unwrap();
        assert!(load_upright(&path).is_err());
    }
}

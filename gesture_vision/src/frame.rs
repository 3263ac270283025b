//! Frame acquisition and encoding.
//!
//! The classifier only ever sees small, heavily compressed stills: frames
//! are resized to 320×240 and written as quality-50 JPEG, then base64
//! encoded for transport.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use log::debug;

use crate::error::{Result, VisionError};

// ════════════════════════════════════════════════════════════════════════════
// FrameSource
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can hand over the current camera frame.
pub trait FrameSource: Send {
    fn grab(&mut self) -> Result<DynamicImage>;
}

/// Cycles through the still images of a directory, one per grab.
///
/// Stands in for a live camera: point it at a folder of captured frames.
pub struct StillFrames {
    paths: Vec<PathBuf>,
    next:  usize,
}

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

impl StillFrames {
    /// Collect the PNG/JPEG files of `dir`, in name order.
    ///
    /// A missing or empty directory is reported as
    /// [`VisionError::Camera`].
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir)
            .map_err(|e| VisionError::Camera(format!("{}: {}", dir.display(), e)))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(VisionError::Camera(format!("no frames in {}", dir.display())));
        }
        debug!("frames: {} stills from {}", paths.len(), dir.display());
        Ok(StillFrames { paths, next: 0 })
    }

    pub fn len(&self) -> usize { self.paths.len() }

    pub fn is_empty(&self) -> bool { self.paths.is_empty() }
}

impl FrameSource for StillFrames {
    fn grab(&mut self) -> Result<DynamicImage> {
        let path = &self.paths[self.next];
        self.next = (self.next + 1) % self.paths.len();
        Ok(image::open(path)?)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Encoding
// ════════════════════════════════════════════════════════════════════════════

/// Size and JPEG quality of frames sent for classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameFormat {
    pub width:   u32,
    pub height:  u32,
    /// JPEG quality, 1–100.
    pub quality: u8,
}

impl Default for FrameFormat {
    fn default() -> Self {
        FrameFormat { width: 320, height: 240, quality: 50 }
    }
}

/// A JPEG frame ready for the classifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedFrame {
    pub width:  u32,
    pub height: u32,
    /// Standard-alphabet base64 of the JPEG bytes.
    pub data:   String,
}

impl EncodedFrame {
    pub fn mime_type(&self) -> &'static str { "image/jpeg" }
}

/// Resize `image` to `format` and encode it as base64 JPEG.
pub fn encode_frame(image: &DynamicImage, format: FrameFormat) -> Result<EncodedFrame> {
    let rgb = image
        .resize_exact(format.width, format.height, FilterType::Triangle)
        .to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, format.quality.clamp(1, 100)).encode_image(&rgb)?;

    Ok(EncodedFrame {
        width:  format.width,
        height: format.height,
        data:   STANDARD.encode(&jpeg),
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn gradient(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn encodes_reduced_jpeg() {
        let frame = encode_frame(&gradient(640, 480), FrameFormat::default()).unwrap();
        assert_eq!((frame.width, frame.height), (320, 240));
        assert_eq!(frame.mime_type(), "image/jpeg");

        let bytes = STANDARD.decode(&frame.data).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]); // JPEG SOI
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (320, 240));
    }

    #[test]
    fn still_frames_cycle_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        gradient(8, 8).save(dir.path().join("b.png")).unwrap();
        gradient(4, 4).save(dir.path().join("a.png")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut frames = StillFrames::open(dir.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames.grab().unwrap().dimensions(), (4, 4));
        assert_eq!(frames.grab().unwrap().dimensions(), (8, 8));
        assert_eq!(frames.grab().unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn empty_directory_is_camera_failure() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(StillFrames::open(dir.path()), Err(VisionError::Camera(_))));
    }

    #[test]
    fn missing_directory_is_camera_failure() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        assert!(matches!(StillFrames::open(gone), Err(VisionError::Camera(_))));
    }
}

//! Captured image frames

use std::path::Path;
use std::time::SystemTime;

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::error::WorldError;

/// A captured image with its capture time and window visibility.
///
/// `visible` is true only when the window was shown and not minimized at
/// capture time; consumers that need an unobstructed view should drop frames
/// where it is false.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub image: RgbImage,
    pub time: SystemTime,
    pub visible: bool,
}

impl Default for Frame {
    fn default() -> Self {
        Self::empty(SystemTime::UNIX_EPOCH)
    }
}

impl Frame {
    /// A 0x0 frame, as returned while grabbing is disabled
    pub fn empty(time: SystemTime) -> Self {
        Self {
            image: RgbImage::new(0, 0),
            time,
            visible: false,
        }
    }

    /// Convert a rendered RGBA image, dropping the alpha channel
    pub fn from_rgba(image: RgbaImage, time: SystemTime, visible: bool) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image).to_rgb8(),
            time,
            visible,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn to_dynamic_image(&self) -> DynamicImage {
        DynamicImage::ImageRgb8(self.image.clone())
    }

    /// Write the frame to disk; the format follows the file extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WorldError> {
        let path = path.as_ref();
        if self.is_empty() {
            return Err(WorldError::Image(format!(
                "refusing to write an empty frame to {}",
                path.display()
            )));
        }
        self.image
            .save(path)
            .map_err(|e| WorldError::Image(format!("{}: {}", path.display(), e)))
    }
}

//! # Video Frame Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use image::DynamicImage;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An individual frame from the capture source.
///
/// Frames are immutable once built and are cycle-scoped: ownership moves from
/// the capture source through the pipeline to whichever consumer last claimed
/// the frame, superseded frames are dropped rather than queued.
#[derive(Debug, Clone)]
pub struct Frame {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// Width of the frame in pixels
    pub width: u32,

    /// Height of the frame in pixels
    pub height: u32,

    /// Row-major 8-bit RGB pixel data
    data: Vec<u8>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while building a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(
        "Pixel buffer length ({len}) does not match the frame dimentions \
        ({width}x{height} RGB)"
    )]
    BufferLengthMismatch {
        len: usize,
        width: u32,
        height: u32,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Frame {
    /// Build a frame from a dynamic image and the timestamp it was acquired
    /// at.
    pub fn from_dyn_image(image: DynamicImage, timestamp: DateTime<Utc>) -> Self {
        let rgb = image.to_rgb8();

        Self {
            timestamp,
            width: rgb.width(),
            height: rgb.height(),
            data: rgb.into_raw(),
        }
    }

    /// Build a frame directly from a row-major RGB8 buffer.
    pub fn from_rgb8(
        width: u32,
        height: u32,
        data: Vec<u8>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, FrameError> {
        if data.len() != (width as usize) * (height as usize) * 3 {
            return Err(FrameError::BufferLengthMismatch {
                len: data.len(),
                width,
                height,
            });
        }

        Ok(Self {
            timestamp,
            width,
            height,
            data,
        })
    }

    /// Get the RGB value of the pixel at the given image coordinates, or
    /// `None` if the coordinates lie outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Get the raw RGB8 pixel buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_rgb8_length_check() {
        let ts = Utc::now();

        assert!(Frame::from_rgb8(2, 2, vec![0u8; 12], ts).is_ok());
        assert!(Frame::from_rgb8(2, 2, vec![0u8; 11], ts).is_err());
    }

    #[test]
    fn test_pixel_access() {
        let ts = Utc::now();
        let mut data = vec![0u8; 12];
        // Pixel (1, 1) is red
        data[9] = 255;

        let frame = Frame::from_rgb8(2, 2, data, ts).unwrap();

        assert_eq!(frame.pixel(1, 1), Some([255, 0, 0]));
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(frame.pixel(2, 0), None);
    }
}

//! Colour blob marker detector
//!
//! Detects a solid-colour marker by thresholding the frame in HSV space
//! around a reference hue and taking the bounding box of the matching
//! pixels. A minimum-area filter rejects specks of matching colour.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Point2;

// Internal
use vision_if::{
    frame::Frame,
    marker::{DetectError, MarkerDetector, MarkerFamily, MarkerObservation},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Half-width of the accepted hue band around the reference hue.
///
/// Units: degrees
const HUE_BAND_DEG: f64 = 20.0;

/// Minimum saturation for a pixel to count as marker colour.
const MIN_SATURATION: f64 = 0.39;

/// Minimum value (brightness) for a pixel to count as marker colour.
const MIN_VALUE: f64 = 0.39;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Built-in detector for solid colour blob markers.
pub struct ColourBlobDetector {
    /// Identifier reported in observations
    ident: String,

    /// Reference hue of the marker colour.
    ///
    /// Units: degrees in [0, 360)
    ref_hue_deg: f64,

    /// Minimum number of matching pixels for a valid detection
    min_area_px: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ColourBlobDetector {
    /// Create a new detector for a marker of the given reference colour.
    pub fn new(colour_rgb: [u8; 3], ident: String, min_area_px: u32) -> Self {
        let (ref_hue_deg, _, _) = rgb_to_hsv(colour_rgb);

        Self {
            ident,
            ref_hue_deg,
            min_area_px,
        }
    }

    /// Whether the given pixel counts as marker colour.
    fn is_marker_colour(&self, rgb: [u8; 3]) -> bool {
        let (h, s, v) = rgb_to_hsv(rgb);

        if s < MIN_SATURATION || v < MIN_VALUE {
            return false;
        }

        // Circular hue distance, hue wraps at 360 degrees
        let diff = (h - self.ref_hue_deg).abs();
        diff.min(360.0 - diff) <= HUE_BAND_DEG
    }
}

impl MarkerDetector for ColourBlobDetector {
    fn family(&self) -> MarkerFamily {
        MarkerFamily::Colour
    }

    fn detect(&mut self, frame: &Frame) -> Result<Option<MarkerObservation>, DetectError> {
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        let mut area_px = 0u32;

        let data = frame.data();

        for y in 0..frame.height {
            for x in 0..frame.width {
                let idx = ((y as usize) * (frame.width as usize) + (x as usize)) * 3;
                let rgb = [data[idx], data[idx + 1], data[idx + 2]];

                if self.is_marker_colour(rgb) {
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                    area_px += 1;
                }
            }
        }

        if area_px < self.min_area_px {
            return Ok(None);
        }

        // Bounding box corners, clockwise from top-left
        let (x0, y0) = (min_x as f64, min_y as f64);
        let (x1, y1) = (max_x as f64, max_y as f64);

        Ok(Some(MarkerObservation {
            ident: self.ident.clone(),
            corners: [
                Point2::new(x0, y0),
                Point2::new(x1, y0),
                Point2::new(x1, y1),
                Point2::new(x0, y1),
            ],
            family: MarkerFamily::Colour,
        }))
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert an 8-bit RGB value to HSV.
///
/// Hue is in degrees in [0, 360), saturation and value in [0, 1].
fn rgb_to_hsv(rgb: [u8; 3]) -> (f64, f64, f64) {
    let r = rgb[0] as f64 / 255.0;
    let g = rgb[1] as f64 / 255.0;
    let b = rgb[2] as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    (hue, saturation, max)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    /// Build a frame of the given background colour with a square of marker
    /// colour drawn at (x, y) with the given side length.
    fn frame_with_square(
        width: u32,
        height: u32,
        background: [u8; 3],
        colour: [u8; 3],
        x: u32,
        y: u32,
        side: u32,
    ) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);

        for py in 0..height {
            for px in 0..width {
                let inside =
                    px >= x && px < x + side && py >= y && py < y + side;
                let rgb = if inside { colour } else { background };
                data.extend_from_slice(&rgb);
            }
        }

        Frame::from_rgb8(width, height, data, Utc::now()).unwrap()
    }

    #[test]
    fn test_rgb_to_hsv() {
        assert_eq!(rgb_to_hsv([255, 0, 0]).0, 0.0);
        assert_eq!(rgb_to_hsv([0, 255, 0]).0, 120.0);
        assert_eq!(rgb_to_hsv([0, 0, 255]).0, 240.0);

        let (_, s, v) = rgb_to_hsv([255, 0, 0]);
        assert_eq!((s, v), (1.0, 1.0));

        let (_, s, v) = rgb_to_hsv([0, 0, 0]);
        assert_eq!((s, v), (0.0, 0.0));
    }

    #[test]
    fn test_detects_square_bounding_box() {
        let mut det = ColourBlobDetector::new([255, 0, 0], "red".into(), 50);

        // 20x20 red square at (40, 10) on a dark background
        let frame =
            frame_with_square(100, 60, [20, 20, 20], [255, 0, 0], 40, 10, 20);

        let obs = det.detect(&frame).unwrap().unwrap();

        assert_eq!(obs.family, MarkerFamily::Colour);
        assert_eq!(obs.ident, "red");
        assert_eq!(obs.corners[0], Point2::new(40.0, 10.0));
        assert_eq!(obs.corners[2], Point2::new(59.0, 29.0));
        assert_eq!(obs.center(), Point2::new(49.5, 19.5));
    }

    #[test]
    fn test_specks_below_min_area_ignored() {
        let mut det = ColourBlobDetector::new([255, 0, 0], "red".into(), 50);

        // A 5x5 square is only 25 matching pixels
        let frame =
            frame_with_square(100, 60, [20, 20, 20], [255, 0, 0], 40, 10, 5);

        assert!(det.detect(&frame).unwrap().is_none());
    }

    #[test]
    fn test_wrong_colour_not_detected() {
        let mut det = ColourBlobDetector::new([255, 0, 0], "red".into(), 50);

        // A blue square must not match a red detector
        let frame =
            frame_with_square(100, 60, [20, 20, 20], [0, 0, 255], 40, 10, 20);

        assert!(det.detect(&frame).unwrap().is_none());
    }

    #[test]
    fn test_nearby_hue_accepted() {
        let mut det = ColourBlobDetector::new([255, 0, 0], "red".into(), 50);

        // Orange-ish red, within the hue band
        let frame =
            frame_with_square(100, 60, [20, 20, 20], [255, 60, 0], 40, 10, 20);

        assert!(det.detect(&frame).unwrap().is_some());
    }
}

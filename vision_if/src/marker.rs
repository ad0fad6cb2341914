//! # Marker Observation Module
//!
//! Defines the observation produced by a marker detector and the detector
//! boundary itself. Detection algorithms are external collaborators, the core
//! only sees zero-or-one observation per frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frame::Frame;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// The four corners of a detected marker in image coordinates, ordered
/// clockwise starting from the top-left corner.
pub type MarkerCorners = [Point2<f64>; 4];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single per-frame marker observation.
///
/// An observation is only produced when the detector family decodes
/// successfully *and* the decoded identifier matches the configured target
/// identifier. Anything else is "no observation", which is a normal input to
/// the tracker, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerObservation {
    /// Decoded marker identifier.
    ///
    /// QR payloads are text, fiducial IDs are formatted decimal, colour
    /// markers carry their configured colour name.
    pub ident: String,

    /// Marker corners in image coordinates, clockwise
    pub corners: MarkerCorners,

    /// The family of the detector which produced this observation
    pub family: MarkerFamily,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Marker families which can be tracked.
///
/// Exactly one family is active per session, selected once at startup. There
/// is no runtime dispatch between families in the core.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MarkerFamily {
    /// A solid colour blob
    Colour,

    /// A QR code
    Qr,

    /// A square fiducial tag
    Fiducial,
}

/// A family-specific decode fault.
///
/// The caller treats this as "no observation this cycle": logged, never
/// propagated as a fatal fault.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("{family:?} decode failed: {reason}")]
    DecodeFailed {
        family: MarkerFamily,
        reason: String,
    },
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The detector boundary.
///
/// Given a frame, return zero-or-one observation for the configured marker
/// family and target identifier.
pub trait MarkerDetector {
    /// The family this detector decodes
    fn family(&self) -> MarkerFamily;

    /// Search the frame for the configured target marker.
    fn detect(&mut self, frame: &Frame) -> Result<Option<MarkerObservation>, DetectError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MarkerObservation {
    /// Get the centre of the marker as the midpoint of the diagonal between
    /// corners 0 and 2.
    ///
    /// This is a cheap approximation of the centroid which is accurate for
    /// near-fronto-parallel markers.
    pub fn center(&self) -> Point2<f64> {
        nalgebra::center(&self.corners[0], &self.corners[2])
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_center_is_diagonal_midpoint() {
        let obs = MarkerObservation {
            ident: "1".into(),
            corners: [
                Point2::new(10.0, 10.0),
                Point2::new(30.0, 10.0),
                Point2::new(30.0, 30.0),
                Point2::new(10.0, 30.0),
            ],
            family: MarkerFamily::Fiducial,
        };

        assert_eq!(obs.center(), Point2::new(20.0, 20.0));
    }
}

//! Parameters structure for TargetTrk

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for target tracking.
#[derive(Debug, Default, Deserialize)]
pub struct Params {

    // ---- STEERING ----

    /// Half-width of the dead zone around the image centre within which no
    /// turning correction is issued, as a fraction of the normalised
    /// horizontal offset.
    ///
    /// Units: fraction in [0.0, 1.0]
    pub dead_zone: f64,

    /// Minimum estimated distance to the marker at which forward motion is
    /// commanded. Closer than this the platform holds position.
    ///
    /// Units: millimeters
    pub start_distance_mm: f64,

    // ---- DISTANCE ESTIMATION ----

    /// Physical side length of the marker.
    ///
    /// Units: millimeters
    pub marker_true_size_mm: f64,

    /// Frame width at which `marker_true_size_mm` was characterised. The
    /// distance estimate is scaled by `frame_width / reference_width_px`.
    ///
    /// Units: pixels
    pub reference_width_px: f64,

    // ---- DEBOUNCE ----

    /// Number of consecutive marker-bearing frames required before the
    /// target is considered locked. Protects against spurious detections.
    pub valid_frame_count: usize,
}

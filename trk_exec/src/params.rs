//! # Tracking Executable Parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::detector::DetectorConfig;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct TrkExecParams {
    /// Linux device path for the tracking camera
    pub video_device: String,

    /// Width of the captured frames in pixels
    pub frame_width_px: u32,

    /// Height of the captured frames in pixels
    pub frame_height_px: u32,

    /// Capture rate in frames per second
    pub frame_rate_fps: u32,

    /// Linux device path for the drive platform serial link
    pub serial_device: String,

    /// Baud rate the serial device is configured for
    pub serial_baud: u32,

    /// Time allowed for the serial device to enumerate before giving up.
    ///
    /// Units: seconds
    pub serial_open_timeout_s: f64,

    /// Detector configuration for this session's marker family
    pub detector: DetectorConfig,
}

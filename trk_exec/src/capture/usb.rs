//! USB camera capture source
//!
//! Wraps an `rscam` V4L2 camera as a [`CaptureSource`]. The camera is
//! configured for MJPG capture and each raw frame is decoded to RGB before
//! being handed to the pipeline.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::Utc;
use log::warn;
use rscam::{Camera, Config};

// Internal
use crate::params::TrkExecParams;
use vision_if::{
    cap::{CaptureError, CaptureSource},
    frame::Frame,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of consecutive undecodable frames tolerated before the source is
/// declared dead.
const MAX_DECODE_FAULTS: u32 = 3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Capture source backed by a local V4L2 USB camera.
pub struct UsbCapture {
    camera: Camera,
    closed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl UsbCapture {
    /// Open and configure the camera named in the parameters.
    pub fn new(params: &TrkExecParams) -> Result<Self, CaptureError> {
        let mut camera =
            Camera::new(&params.video_device).map_err(CaptureError::DeviceOpenError)?;

        camera
            .start(&Config {
                interval: (1, params.frame_rate_fps),
                resolution: (params.frame_width_px, params.frame_height_px),
                format: b"MJPG",
                ..Default::default()
            })
            .map_err(|e| CaptureError::DeviceConfigError(format!("{:?}", e)))?;

        Ok(Self {
            camera,
            closed: false,
        })
    }
}

impl CaptureSource for UsbCapture {
    fn read(&mut self) -> Option<Frame> {
        if self.closed {
            return None;
        }

        let mut decode_faults = 0u32;

        loop {
            // Blocks until the camera produces the next frame
            let raw_frame = match self.camera.capture() {
                Ok(f) => f,
                Err(e) => {
                    warn!("Camera capture failed, closing the source: {}", e);
                    self.closed = true;
                    return None;
                }
            };
            let timestamp = Utc::now();

            match image::load_from_memory_with_format(&raw_frame, image::ImageFormat::Jpeg) {
                Ok(dyn_image) => return Some(Frame::from_dyn_image(dyn_image, timestamp)),
                Err(e) => {
                    // A single corrupt MJPG frame is recoverable, a run of
                    // them is not
                    warn!("Could not decode a captured frame: {}", e);
                    decode_faults += 1;

                    if decode_faults >= MAX_DECODE_FAULTS {
                        warn!("Too many undecodable frames, closing the source");
                        self.closed = true;
                        return None;
                    }
                }
            }
        }
    }

    fn closed(&self) -> bool {
        self.closed
    }

    fn stop_stream(&mut self) -> Result<(), CaptureError> {
        self.camera
            .stop()
            .map_err(|e| CaptureError::StreamRequestError(e.to_string()))
    }
}

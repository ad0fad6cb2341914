//! # Capture Source Boundary
//!
//! The physical video source (USB camera, network camera) sits behind this
//! boundary. The source produces frames at its own cadence on its own thread,
//! the core only requires a blocking `read` and an explicit liveness signal.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

use crate::frame::Frame;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur at the capture source boundary.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Could not open the capture device: {0}")]
    DeviceOpenError(std::io::Error),

    #[error("Could not configure the capture device: {0}")]
    DeviceConfigError(String),

    #[error("Stream lifecycle request failed: {0}")]
    StreamRequestError(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The capture source boundary.
pub trait CaptureSource {
    /// Read the next frame from the source.
    ///
    /// Blocks at the source's own cadence. Returns `None` once the source has
    /// reached end of stream or failed, after which `read` will never produce
    /// a frame again and [`CaptureSource::closed`] returns true.
    fn read(&mut self) -> Option<Frame>;

    /// Liveness signal: true once the source has terminated.
    fn closed(&self) -> bool;

    /// Start the stream on a network-backed source.
    ///
    /// Invoked once at pipeline start. Directly-polled local devices need not
    /// implement this.
    fn start_stream(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    /// Stop the stream on a network-backed source.
    ///
    /// Invoked once at pipeline stop.
    fn stop_stream(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }
}

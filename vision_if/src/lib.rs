//! # Vision interface crate.
//!
//! Provides the types and boundary traits shared between the tracking
//! executable and its external collaborators: the capture device, the marker
//! detectors and the actuator command link.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Video frame definitions
pub mod frame;

/// Marker observation definitions and the detector boundary
pub mod marker;

/// Capture source boundary
pub mod cap;

/// Steering command definitions and the command link boundary
pub mod cmd;

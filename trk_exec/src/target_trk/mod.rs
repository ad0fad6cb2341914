//! Target tracking module
//!
//! Converts the stream of raw per-frame marker observations into a validated
//! target state: a debounced lock flag, a pinhole distance estimate and the
//! steering direction for this cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TargetTrk initialisation.
#[derive(Debug, thiserror::Error)]
pub enum TargetTrkInitError {
    #[error("Failed to load the parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Failed to create the state archive: {0}")]
    ArchInitError(util::archive::ArchiveError),

    #[error("valid_frame_count must be at least 1, got {0}")]
    InvalidValidFrameCount(usize),
}

/// Possible errors that can occur during TargetTrk cyclic processing.
#[derive(Debug, thiserror::Error)]
pub enum TargetTrkError {
    #[error("Frame width must be non-zero")]
    InvalidFrameWidth,
}

//! Detector selection module
//!
//! Exactly one marker family is active per tracking session, chosen by the
//! variant-tagged detector configuration at startup. The colour-blob backend
//! is built in, QR and fiducial decoding are external collaborators.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod colour;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
pub use colour::ColourBlobDetector;
use vision_if::marker::{MarkerDetector, MarkerFamily};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Variant-tagged detector configuration.
///
/// Lives in the executable's parameter file as a `[detector]` table with a
/// `family` key selecting the variant.
#[derive(Debug, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum DetectorConfig {
    /// Solid colour blob marker
    Colour {
        /// Reference colour of the marker as 8-bit RGB
        colour_rgb: [u8; 3],

        /// Identifier reported for observations of this marker
        ident: String,

        /// Minimum number of matching pixels for a valid detection
        min_area_px: u32,
    },

    /// QR code marker, requires an external decode backend
    Qr {
        /// Payload text identifying the target
        target_text: String,
    },

    /// Square fiducial tag, requires an external decode backend
    Fiducial {
        /// Name of the tag dictionary
        dictionary: String,

        /// Tag ID identifying the target
        target_id: u32,
    },
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while selecting the detector.
///
/// Selection happens once at startup, any error here is fatal.
#[derive(Debug, thiserror::Error)]
pub enum DetectorSelError {
    #[error("No {0:?} detector backend is available in this build")]
    NoBackend(MarkerFamily),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the session's detector from its configuration.
pub fn from_config(config: &DetectorConfig) -> Result<Box<dyn MarkerDetector>, DetectorSelError> {
    match config {
        DetectorConfig::Colour {
            colour_rgb,
            ident,
            min_area_px,
        } => Ok(Box::new(ColourBlobDetector::new(
            *colour_rgb,
            ident.clone(),
            *min_area_px,
        ))),
        DetectorConfig::Qr { .. } => Err(DetectorSelError::NoBackend(MarkerFamily::Qr)),
        DetectorConfig::Fiducial { .. } => Err(DetectorSelError::NoBackend(MarkerFamily::Fiducial)),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_colour_family_selects() {
        let config = DetectorConfig::Colour {
            colour_rgb: [200, 30, 30],
            ident: "red".into(),
            min_area_px: 50,
        };

        let detector = from_config(&config).unwrap();
        assert_eq!(detector.family(), MarkerFamily::Colour);
    }

    #[test]
    fn test_external_families_are_config_faults() {
        let config = DetectorConfig::Qr {
            target_text: "dock-1".into(),
        };
        assert!(from_config(&config).is_err());

        let config = DetectorConfig::Fiducial {
            dictionary: "4x4_250".into(),
            target_id: 1,
        };
        assert!(from_config(&config).is_err());
    }
}

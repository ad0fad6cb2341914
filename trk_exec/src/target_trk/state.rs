//! Implementations for the TargetTrk state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Point2;
use serde::Serialize;
use std::collections::VecDeque;

// Internal
use super::{Params, TargetTrkError, TargetTrkInitError};
use util::{
    archive::Archiver,
    maths::norm,
    module::State,
    params,
    session::Session,
};
use vision_if::{cmd::Direction, marker::MarkerObservation};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Target tracking module state.
///
/// Created once per tracking session. The rolling presence history is the
/// only state carried between cycles and is owned exclusively by the
/// consumer context.
#[derive(Default)]
pub struct TargetTrk {
    params: Params,

    /// Presence flags for the last `valid_frame_count` cycles, oldest first
    history: VecDeque<bool>,

    /// Lock state of the previous cycle, for transition reporting
    was_locked: bool,

    arch_state: Archiver,
}

/// Input data to target tracking, provided exactly once per control cycle.
#[derive(Debug, Default, Clone)]
pub struct InputData {
    /// This cycle's marker observation, or `None` if the detector saw no
    /// valid target. Absence is a normal input, not an error.
    pub observation: Option<MarkerObservation>,

    /// Width of this cycle's frame.
    ///
    /// Units: pixels
    pub frame_width: u32,
}

/// The validated target state produced each cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TargetState {
    /// Centre of the marker in image coordinates, or `None` if no marker was
    /// observed this cycle.
    pub center: Option<Point2<f64>>,

    /// Estimated distance to the marker, 0 whenever no marker was observed.
    ///
    /// Units: millimeters
    pub distance_mm: f64,

    /// The steering decision, recomputed every cycle even when not locked.
    pub direction: Direction,

    /// True iff the last `valid_frame_count` cycles all observed the marker.
    pub locked: bool,
}

/// Status report for TargetTrk processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// Whether a marker was observed this cycle
    pub marker_visible: bool,

    /// Whether the lock state changed this cycle
    pub lock_changed: bool,
}

/// Flat per-cycle archive record for [`TargetState`].
#[derive(Serialize)]
struct StateRecord {
    time_s: f64,
    center_x_px: Option<f64>,
    center_y_px: Option<f64>,
    distance_mm: f64,
    direction: char,
    locked: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TargetTrk {
    type InitData = &'static str;
    type InitError = TargetTrkInitError;

    type InputData = InputData;
    type OutputData = TargetState;
    type StatusReport = StatusReport;
    type ProcError = TargetTrkError;

    /// Initialise the TargetTrk module.
    ///
    /// Expected init data is the name of the parameter file.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        self.params = params::load(init_data)
            .map_err(TargetTrkInitError::ParamLoadError)?;

        if self.params.valid_frame_count < 1 {
            return Err(TargetTrkInitError::InvalidValidFrameCount(
                self.params.valid_frame_count,
            ));
        }

        // Start with an all-miss history so that lock requires a full run of
        // positive detections from the first cycle
        self.history = std::iter::repeat(false)
            .take(self.params.valid_frame_count)
            .collect();

        // Initialise the archiver
        self.arch_state = Archiver::from_path(session, "target_state.csv")
            .map_err(TargetTrkInitError::ArchInitError)?;

        Ok(())
    }

    /// Perform cyclic processing of target tracking.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        if input_data.frame_width == 0 {
            return Err(TargetTrkError::InvalidFrameWidth);
        }

        // Marker centre as the diagonal midpoint of the corner quadrilateral
        let center = input_data.observation.as_ref().map(|obs| obs.center());

        // Push the presence flag into the rolling history. Lock requires a
        // consecutive run of hits, a single miss inside the window clears it.
        let marker_visible = center.is_some();

        while self.history.len() >= self.params.valid_frame_count {
            if self.history.pop_front().is_none() {
                break;
            }
        }
        self.history.push_back(marker_visible);

        let locked = self.history.len() == self.params.valid_frame_count
            && self.history.iter().all(|&hit| hit);

        // Distance is recomputed from scratch each cycle, never carried over
        // stale once the marker is gone
        let distance_mm = match input_data.observation {
            Some(ref obs) => self.estimate_distance_mm(obs, input_data.frame_width),
            None => 0.0,
        };

        let direction = self.decide_direction(center, distance_mm, input_data.frame_width);

        let report = StatusReport {
            marker_visible,
            lock_changed: locked != self.was_locked,
        };
        self.was_locked = locked;

        let state = TargetState {
            center,
            distance_mm,
            direction,
            locked,
        };

        trace!(
            "TargetTrk: visible = {}, locked = {}, distance = {:.0} mm, direction = {:?}",
            marker_visible, locked, distance_mm, direction
        );

        if let Err(e) = self.arch_state.serialise(StateRecord::from(&state)) {
            trace!("Could not archive target state: {}", e);
        }

        Ok((state, report))
    }
}

impl TargetTrk {
    /// Build a tracker with the given parameters and an empty history,
    /// without touching the filesystem.
    #[cfg(test)]
    pub(crate) fn with_params(params: Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Estimate the distance to the marker from its apparent size.
    ///
    /// Apparent size is the sum of two adjacent edge lengths of the corner
    /// quadrilateral. The estimate is the pinhole ratio
    /// `scale * 1000 * true_size / apparent_size`, with `scale` correcting
    /// for frame resolutions other than the calibration resolution.
    fn estimate_distance_mm(&self, obs: &MarkerObservation, frame_width: u32) -> f64 {
        let c = &obs.corners;

        let apparent_px = norm(&[c[0].x, c[0].y], &[c[1].x, c[1].y]).unwrap_or(0.0)
            + norm(&[c[1].x, c[1].y], &[c[2].x, c[2].y]).unwrap_or(0.0);

        // Degenerate corner geometry, report the marker as unranged
        if apparent_px <= 0.0 {
            return 0.0;
        }

        let resolution_scale = frame_width as f64 / self.params.reference_width_px;

        resolution_scale * 1000.0 * self.params.marker_true_size_mm / apparent_px
    }

    /// Decide the steering direction for this cycle.
    ///
    /// Evaluated every cycle regardless of lock. The dead-zone boundary is
    /// inclusive on both sides.
    fn decide_direction(
        &self,
        center: Option<Point2<f64>>,
        distance_mm: f64,
        frame_width: u32,
    ) -> Direction {
        let center = match center {
            Some(c) => c,
            None => return Direction::Stop,
        };

        // Normalised horizontal offset in [-1, 1], 0 = image centre
        let eps = 2.0 * center.x / frame_width as f64 - 1.0;

        if eps.abs() <= self.params.dead_zone {
            if distance_mm > self.params.start_distance_mm {
                Direction::Forward
            } else {
                Direction::Stop
            }
        } else if eps < 0.0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}

impl From<&TargetState> for StateRecord {
    fn from(state: &TargetState) -> Self {
        Self {
            time_s: util::archive::stamp_s(),
            center_x_px: state.center.map(|c| c.x),
            center_y_px: state.center.map(|c| c.y),
            distance_mm: state.distance_mm,
            direction: state.direction.wire_char(),
            locked: state.locked,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

//! Control loop module
//!
//! The consumer-side cycle: take the freshest frame, run marker detection,
//! update the tracked target state, and send the steering command over the
//! command link. One cycle per frame, always on the freshest frame the
//! pipeline holds, exiting cleanly when the pipeline closes.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};

// Internal
use crate::frame_pipeline::FrameConsumer;
use crate::target_trk::{InputData, TargetTrk};
use util::module::State;
use vision_if::{cmd::CommandLink, marker::MarkerDetector};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The tracking control loop.
///
/// Owns the consumer end of the frame pipeline, the session's detector and
/// tracker, and the optional command link.
pub struct ControlLoop {
    frames: FrameConsumer,

    detector: Box<dyn MarkerDetector>,

    tracker: TargetTrk,

    /// `None` when the executable runs command-less, for example during a
    /// bench session with no drive platform attached.
    cmd_link: Option<Box<dyn CommandLink>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControlLoop {
    pub fn new(
        frames: FrameConsumer,
        detector: Box<dyn MarkerDetector>,
        tracker: TargetTrk,
        cmd_link: Option<Box<dyn CommandLink>>,
    ) -> Self {
        Self {
            frames,
            detector,
            tracker,
            cmd_link,
        }
    }

    /// Run the control loop until the frame pipeline closes.
    ///
    /// Nothing on the per-cycle path is fatal: detector faults degrade to
    /// "no observation", tracker faults skip the cycle, command faults are
    /// reported by the link and superseded next cycle.
    pub fn run(mut self) {
        // Detector faults are logged once per fault episode, not once per
        // frame, to keep a persistent fault from flooding the log
        let mut detect_faulted = false;

        while let Some(frame) = self.frames.take_latest() {
            // A decode fault means no observation this cycle, never a fatal
            // fault
            let observation = match self.detector.detect(&frame) {
                Ok(obs) => {
                    detect_faulted = false;
                    obs
                }
                Err(e) => {
                    if !detect_faulted {
                        warn!("Marker detection failed, treating the target as absent: {}", e);
                        detect_faulted = true;
                    }
                    None
                }
            };

            let input = InputData {
                observation,
                frame_width: frame.width,
            };

            // A degenerate frame cannot produce a steering decision, skip
            // the cycle rather than abort the loop
            let (target_state, report) = match self.tracker.proc(&input) {
                Ok(out) => out,
                Err(e) => {
                    warn!("Target tracking rejected this cycle: {}", e);
                    continue;
                }
            };

            if report.lock_changed {
                if target_state.locked {
                    info!(
                        "Target locked, distance = {:.0} mm",
                        target_state.distance_mm
                    );
                } else {
                    info!("Target lock lost");
                }
            }

            // Best effort: a dropped command is superseded by next cycle's
            if let Some(ref mut link) = self.cmd_link {
                if !link.send(&target_state.direction.to_wire()) {
                    debug!(
                        "Steering command {:?} was not delivered",
                        target_state.direction
                    );
                }
            }
        }

        info!("Frame pipeline closed, control loop exiting");
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame_pipeline;
    use crate::target_trk::Params;
    use chrono::Utc;
    use nalgebra::Point2;
    use std::sync::{Arc, Mutex};
    use vision_if::frame::Frame;
    use vision_if::marker::{DetectError, MarkerFamily, MarkerObservation};

    /// A detector returning a fixed script of results, one per frame.
    struct ScriptedDetector {
        script: Vec<Result<Option<MarkerObservation>, DetectError>>,
    }

    impl MarkerDetector for ScriptedDetector {
        fn family(&self) -> MarkerFamily {
            MarkerFamily::Fiducial
        }

        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Option<MarkerObservation>, DetectError> {
            self.script.remove(0)
        }
    }

    /// A command link recording every command handed to it.
    struct RecordingLink {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl CommandLink for RecordingLink {
        fn send(&mut self, command: &str) -> bool {
            self.sent.lock().unwrap().push(command.to_string());
            true
        }
    }

    /// A command link which always fails to deliver, counting the attempts.
    struct DeadLink {
        attempts: Arc<Mutex<usize>>,
    }

    impl CommandLink for DeadLink {
        fn send(&mut self, _command: &str) -> bool {
            *self.attempts.lock().unwrap() += 1;
            false
        }
    }

    fn test_frame() -> Frame {
        Frame::from_rgb8(4, 4, vec![0; 48], Utc::now()).unwrap()
    }

    fn centred_obs() -> MarkerObservation {
        // Centred in a 4 px wide frame, small apparent size: far and centred
        MarkerObservation {
            ident: "1".into(),
            corners: [
                Point2::new(1.9, 1.9),
                Point2::new(2.1, 1.9),
                Point2::new(2.1, 2.1),
                Point2::new(1.9, 2.1),
            ],
            family: MarkerFamily::Fiducial,
        }
    }

    fn test_tracker() -> TargetTrk {
        TargetTrk::with_params(Params {
            dead_zone: 0.1,
            start_distance_mm: 1000.0,
            marker_true_size_mm: 150.0,
            reference_width_px: 720.0,
            valid_frame_count: 1,
        })
    }

    #[test]
    fn test_exits_cleanly_on_pipeline_close() {
        let (producer, consumer) = frame_pipeline::new();
        producer.close();

        let control_loop = ControlLoop::new(
            consumer,
            Box::new(ScriptedDetector { script: vec![] }),
            test_tracker(),
            None,
        );

        control_loop.run();
    }

    #[test]
    fn test_centred_detection_commands_forward() {
        let (producer, consumer) = frame_pipeline::new();
        let sent = Arc::new(Mutex::new(Vec::new()));

        let detector = ScriptedDetector {
            script: vec![Ok(Some(centred_obs()))],
        };
        let link = RecordingLink { sent: sent.clone() };

        // The slot retains the frame past the close, so a single cycle runs
        producer.submit(test_frame());
        producer.close();

        let control_loop = ControlLoop::new(
            consumer,
            Box::new(detector),
            test_tracker(),
            Some(Box::new(link)),
        );
        control_loop.run();

        // Centred far marker drives forward
        assert_eq!(*sent.lock().unwrap(), vec!["F\n".to_string()]);
    }

    #[test]
    fn test_detector_fault_treated_as_absent() {
        let (producer, consumer) = frame_pipeline::new();
        let sent = Arc::new(Mutex::new(Vec::new()));

        let detector = ScriptedDetector {
            script: vec![Err(DetectError::DecodeFailed {
                family: MarkerFamily::Fiducial,
                reason: "corrupt payload".into(),
            })],
        };
        let link = RecordingLink { sent: sent.clone() };

        producer.submit(test_frame());
        producer.close();

        let control_loop = ControlLoop::new(
            consumer,
            Box::new(detector),
            test_tracker(),
            Some(Box::new(link)),
        );
        control_loop.run();

        // The faulted cycle still completed and commanded a stop
        assert_eq!(*sent.lock().unwrap(), vec!["S\n".to_string()]);
    }

    #[test]
    fn test_undelivered_commands_do_not_abort() {
        let (producer, consumer) = frame_pipeline::new();
        let attempts = Arc::new(Mutex::new(0));

        let detector = ScriptedDetector {
            script: vec![Ok(Some(centred_obs()))],
        };
        let link = DeadLink {
            attempts: attempts.clone(),
        };

        producer.submit(test_frame());
        producer.close();

        let control_loop = ControlLoop::new(
            consumer,
            Box::new(detector),
            test_tracker(),
            Some(Box::new(link)),
        );
        control_loop.run();

        // The cycle completed and a delivery was attempted despite the
        // failing link
        assert_eq!(*attempts.lock().unwrap(), 1);
    }

    #[test]
    fn test_degenerate_frame_skips_cycle() {
        let (producer, consumer) = frame_pipeline::new();
        let sent = Arc::new(Mutex::new(Vec::new()));

        let detector = ScriptedDetector {
            script: vec![Ok(None)],
        };
        let link = RecordingLink { sent: sent.clone() };

        // A zero-width frame is rejected by the tracker, the loop must skip
        // the cycle and exit cleanly rather than abort
        producer.submit(Frame::from_rgb8(0, 0, vec![], Utc::now()).unwrap());
        producer.close();

        let control_loop = ControlLoop::new(
            consumer,
            Box::new(detector),
            test_tracker(),
            Some(Box::new(link)),
        );
        control_loop.run();

        // No steering decision was produced for the rejected cycle
        assert!(sent.lock().unwrap().is_empty());
    }
}

//! # Tracking Executable
//!
//! Camera-driven target tracking: captures frames from a USB camera, detects
//! the configured marker in each frame, and steers the drive platform towards
//! it over the serial command link.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod capture;
mod cmd_link;
mod control_loop;
mod detector;
mod frame_pipeline;
mod params;
mod target_trk;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::time::Duration;

// Internal
use capture::UsbCapture;
use cmd_link::SerialCmdLink;
use control_loop::ControlLoop;
use params::TrkExecParams;
use target_trk::TargetTrk;
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};
use vision_if::{cmd::CommandLink, marker::MarkerDetector};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("trk_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Tracking Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let params: TrkExecParams =
        util::params::load("trk_exec.toml").wrap_err("Could not load trk_exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE DETECTOR ----

    // An unsatisfiable detector configuration is a startup fault, the session
    // cannot run without its marker family
    let marker_detector =
        detector::from_config(&params.detector).wrap_err("Failed to build the marker detector")?;

    info!("Detector initialised: {:?} family", marker_detector.family());

    // ---- INITIALISE MODULES ----

    let mut target_trk = TargetTrk::default();
    target_trk
        .init("target_trk.toml", &session)
        .wrap_err("Failed to initialise TargetTrk")?;
    info!("TargetTrk init complete");

    // ---- INITIALISE COMMAND LINK ----

    // The command link is best effort from the start: a missing drive
    // platform leaves the session running command-less rather than aborting
    let cmd_link: Option<Box<dyn CommandLink>> = match SerialCmdLink::open(
        &params.serial_device,
        params.serial_baud,
        Duration::from_secs_f64(params.serial_open_timeout_s),
    ) {
        Ok(link) => Some(Box::new(link)),
        Err(e) => {
            warn!("Running command-less: {}", e);
            None
        }
    };

    // ---- INITIALISE CAPTURE ----

    let (producer, consumer) = frame_pipeline::new();

    info!("Opening capture device {}", params.video_device);

    // The camera is opened on the producer thread and confined to it, but a
    // missing or misconfigured device is still fatal here
    let capture_handle = capture::spawn(move || UsbCapture::new(&params), producer)
        .wrap_err("Failed to open the capture device")?;

    // ---- MAIN LOOP ----

    info!("Initialisation complete, starting the control loop\n");

    let control_loop = ControlLoop::new(consumer, marker_detector, target_trk, cmd_link);

    control_loop.run();

    // The control loop only exits once the pipeline has closed, so the
    // producer thread is already winding down
    if capture_handle.join().is_err() {
        warn!("The capture thread panicked");
    }

    info!("End of session");

    Ok(())
}

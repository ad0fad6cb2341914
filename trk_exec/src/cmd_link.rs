//! Serial command link
//!
//! Sends steering commands to the drive platform over a serial device node.
//! The link is best effort: a failed write is reported to the caller and
//! logged, it never aborts the control loop.
//!
//! The device node is expected to be configured (baud rate, raw mode) by the
//! platform before this executable starts.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::time::{Duration, Instant};
use thiserror::Error;

// Internal
use vision_if::cmd::CommandLink;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Pause between attempts to open the serial device.
const OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command link over a serial device node.
pub struct SerialCmdLink {
    port: File,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while opening the command link.
#[derive(Debug, Error)]
pub enum CmdLinkError {
    #[error("Could not open serial device {0} within {1:?}: {2}")]
    OpenTimeout(String, Duration, std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SerialCmdLink {
    /// Open the serial device, retrying until the timeout elapses.
    ///
    /// The device may enumerate a moment after boot, so a few failed attempts
    /// are expected and only the final failure is an error. The baud rate is
    /// recorded for traceability, the device node is expected to already be
    /// configured for it.
    pub fn open(
        device: &str,
        baud: u32,
        open_timeout: Duration,
    ) -> Result<Self, CmdLinkError> {
        let deadline = Instant::now() + open_timeout;

        loop {
            match OpenOptions::new().write(true).open(device) {
                Ok(port) => {
                    info!("Serial command link open on {} at {} baud", device, baud);
                    return Ok(Self { port });
                }
                Err(e) => {
                    if Instant::now() >= deadline {
                        return Err(CmdLinkError::OpenTimeout(
                            device.to_string(),
                            open_timeout,
                            e,
                        ));
                    }

                    std::thread::sleep(OPEN_RETRY_INTERVAL);
                }
            }
        }
    }
}

impl CommandLink for SerialCmdLink {
    fn send(&mut self, command: &str) -> bool {
        let result = self
            .port
            .write_all(command.as_bytes())
            .and_then(|_| self.port.flush());

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Command send failed: {}", e);
                false
            }
        }
    }
}

//! Capture producer module
//!
//! Owns the capture source on a dedicated producer thread, feeding the frame
//! pipeline at the source's own cadence. The source is constructed inside
//! the thread and confined to it, only the construction result crosses back
//! to the caller, so sources wrapping thread-bound device handles work
//! unchanged. The thread invokes the source's stream lifecycle hooks and
//! closes the pipeline when the source terminates, so the consumer exits
//! deterministically instead of blocking forever.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod usb;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use std::sync::mpsc;
use std::thread;

// Internal
use crate::frame_pipeline::FrameProducer;
pub use usb::UsbCapture;
use vision_if::cap::{CaptureError, CaptureSource};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Spawn the capture producer thread.
///
/// `make_source` is invoked on the new thread and a construction fault is
/// handed back to the caller, a source which cannot be built is a startup
/// fault. Once built, the thread reads frames from the source and submits
/// them to the pipeline until the source reports end of stream, then closes
/// the pipeline.
pub fn spawn<S, F>(
    make_source: F,
    producer: FrameProducer,
) -> Result<thread::JoinHandle<()>, CaptureError>
where
    S: CaptureSource + 'static,
    F: FnOnce() -> Result<S, CaptureError> + Send + 'static,
{
    let (result_tx, result_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        let mut source = match make_source() {
            Ok(s) => {
                let _ = result_tx.send(Ok(()));
                s
            }
            Err(e) => {
                let _ = result_tx.send(Err(e));
                producer.close();
                return;
            }
        };

        if let Err(e) = source.start_stream() {
            warn!("Could not start the capture stream: {}", e);
        }

        while let Some(frame) = source.read() {
            producer.submit(frame);
        }

        info!("Capture source closed");

        if let Err(e) = source.stop_stream() {
            warn!("Could not stop the capture stream: {}", e);
        }

        producer.close();
    });

    match result_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(e)) => {
            let _ = handle.join();
            Err(e)
        }
        // The thread died before reporting, only possible if construction
        // panicked
        Err(_) => Err(CaptureError::DeviceConfigError(
            "the capture thread terminated during startup".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame_pipeline;
    use chrono::Utc;
    use vision_if::frame::Frame;

    /// A scripted capture source yielding a fixed set of frames then closing.
    struct ScriptedSource {
        frames: Vec<Frame>,
    }

    impl CaptureSource for ScriptedSource {
        fn read(&mut self) -> Option<Frame> {
            if self.frames.is_empty() {
                None
            } else {
                Some(self.frames.remove(0))
            }
        }

        fn closed(&self) -> bool {
            self.frames.is_empty()
        }
    }

    fn numbered_frame(n: u8) -> Frame {
        Frame::from_rgb8(1, 1, vec![n, 0, 0], Utc::now()).unwrap()
    }

    #[test]
    fn test_producer_thread_drains_source_and_closes() {
        let (producer, consumer) = frame_pipeline::new();

        let handle = spawn(
            || {
                Ok(ScriptedSource {
                    frames: vec![numbered_frame(1), numbered_frame(2), numbered_frame(3)],
                })
            },
            producer,
        )
        .unwrap();
        handle.join().unwrap();

        // All frames were submitted before the close: freshest wins, so the
        // consumer sees the final frame, then the closed signal
        let frame = consumer.take_latest().unwrap();
        assert_eq!(frame.pixel(0, 0), Some([3, 0, 0]));
        assert!(consumer.take_latest().is_none());
    }

    /// A one-frame source whose stream lifecycle hooks always fail.
    struct FaultyStreamSource {
        frame: Option<Frame>,
    }

    impl CaptureSource for FaultyStreamSource {
        fn read(&mut self) -> Option<Frame> {
            self.frame.take()
        }

        fn closed(&self) -> bool {
            self.frame.is_none()
        }

        fn start_stream(&mut self) -> Result<(), CaptureError> {
            Err(CaptureError::StreamRequestError("stream refused".into()))
        }

        fn stop_stream(&mut self) -> Result<(), CaptureError> {
            Err(CaptureError::StreamRequestError("stream refused".into()))
        }
    }

    #[test]
    fn test_stream_request_faults_are_not_fatal() {
        let (producer, consumer) = frame_pipeline::new();

        // Both lifecycle hooks fail, frames must still flow and the
        // pipeline must still close
        let handle = spawn(
            || {
                Ok(FaultyStreamSource {
                    frame: Some(numbered_frame(9)),
                })
            },
            producer,
        )
        .unwrap();
        handle.join().unwrap();

        let frame = consumer.take_latest().unwrap();
        assert_eq!(frame.pixel(0, 0), Some([9, 0, 0]));
        assert!(consumer.take_latest().is_none());
    }

    #[test]
    fn test_source_construction_fault_is_surfaced() {
        let (producer, consumer) = frame_pipeline::new();

        let result = spawn(
            || -> Result<ScriptedSource, CaptureError> {
                Err(CaptureError::DeviceConfigError("no such device".into()))
            },
            producer,
        );

        assert!(result.is_err());

        // The failed producer still closed the pipeline
        assert!(consumer.take_latest().is_none());
    }
}

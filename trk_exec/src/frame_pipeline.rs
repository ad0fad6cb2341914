//! # Frame Pipeline
//!
//! Bridges the asynchronous capture producer to the synchronous control-loop
//! consumer with "freshest wins" semantics: the pipeline holds at most one
//! pending frame, a new submission unconditionally replaces an unconsumed
//! one. Dropping a stale frame is strictly preferable to queueing it, a
//! steering command computed from an old frame can be actively wrong.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use vision_if::frame::Frame;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Producer side of the pipeline, owned by the capture source's thread.
///
/// Cloneable so the capture thread can hold the submission end while the main
/// thread retains the close signal if needed.
#[derive(Clone)]
pub struct FrameProducer {
    shared: Arc<Shared>,
}

/// Consumer side of the pipeline, owned by the control loop.
pub struct FrameConsumer {
    shared: Arc<Shared>,
}

/// The one-slot mailbox itself.
struct Shared {
    slot: Mutex<Slot>,
    available: Condvar,
}

struct Slot {
    frame: Option<Frame>,
    closed: bool,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a new frame pipeline, returning the producer and consumer ends.
pub fn new() -> (FrameProducer, FrameConsumer) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot {
            frame: None,
            closed: false,
        }),
        available: Condvar::new(),
    });

    (
        FrameProducer {
            shared: shared.clone(),
        },
        FrameConsumer { shared },
    )
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FrameProducer {
    /// Submit a frame to the pipeline.
    ///
    /// Always succeeds and never blocks beyond the slot lock. Any pending
    /// frame which has not yet been consumed is replaced, never retained.
    pub fn submit(&self, frame: Frame) {
        let mut slot = self.shared.lock_slot();
        slot.frame = Some(frame);
        self.shared.available.notify_one();
    }

    /// Signal that the capture source has terminated.
    ///
    /// `submit` must not be called after this. Wakes any blocked consumer so
    /// it can exit rather than wait forever.
    pub fn close(&self) {
        let mut slot = self.shared.lock_slot();
        slot.closed = true;
        self.shared.available.notify_all();
    }
}

impl FrameConsumer {
    /// Take the most recent frame, blocking until one is available.
    ///
    /// Returns `None` only once the producer has closed the pipeline and any
    /// final pending frame has been drained.
    pub fn take_latest(&self) -> Option<Frame> {
        let mut slot = self.shared.lock_slot();

        loop {
            if let Some(frame) = slot.frame.take() {
                return Some(frame);
            }

            if slot.closed {
                return None;
            }

            slot = match self.shared.available.wait(slot) {
                Ok(s) => s,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }
}

impl Shared {
    /// Lock the slot, recovering from a poisoned lock.
    ///
    /// A panicking producer cannot leave the slot in a torn state, every
    /// mutation is a single assignment, so the data is safe to reuse.
    fn lock_slot(&self) -> MutexGuard<Slot> {
        match self.slot.lock() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;
    use std::thread;
    use std::time::Duration;

    /// Build a 1x1 frame whose single pixel encodes a sequence number.
    fn numbered_frame(n: u8) -> Frame {
        Frame::from_rgb8(1, 1, vec![n, 0, 0], Utc::now()).unwrap()
    }

    #[test]
    fn test_freshest_wins() {
        let (producer, consumer) = new();

        // Rapid submissions with no intervening take: only the last survives
        for n in 0..5 {
            producer.submit(numbered_frame(n));
        }

        let frame = consumer.take_latest().unwrap();
        assert_eq!(frame.pixel(0, 0), Some([4, 0, 0]));

        // The slot is now empty, a close means no further frames
        producer.close();
        assert!(consumer.take_latest().is_none());
    }

    #[test]
    fn test_take_blocks_until_first_submit() {
        let (producer, consumer) = new();

        let handle = thread::spawn(move || consumer.take_latest());

        // Give the consumer time to block on the empty slot
        thread::sleep(Duration::from_millis(50));

        producer.submit(numbered_frame(7));

        let frame = handle.join().unwrap().unwrap();
        assert_eq!(frame.pixel(0, 0), Some([7, 0, 0]));
    }

    #[test]
    fn test_close_unblocks_consumer() {
        let (producer, consumer) = new();

        let handle = thread::spawn(move || consumer.take_latest());

        thread::sleep(Duration::from_millis(50));
        producer.close();

        assert!(handle.join().unwrap().is_none());
    }

    #[test]
    fn test_frame_submitted_before_close_is_delivered() {
        let (producer, consumer) = new();

        producer.submit(numbered_frame(3));
        producer.close();

        // The pending frame survives the close, only then does the pipeline
        // report closed
        let frame = consumer.take_latest().unwrap();
        assert_eq!(frame.pixel(0, 0), Some([3, 0, 0]));
        assert!(consumer.take_latest().is_none());
    }
}

//! Drop-latest admission of camera frames into the detection worker.
//!
//! At most one frame is in flight. Frames offered while the worker is busy
//! are dropped immediately and their buffers handed back to the capture side.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use crate::common::{select_best, DetectionEvent, DetectionResult, Frame, Selection};
use crate::data::send_channels::{detection_channels, DetectionState};
use crate::detection_runners::forward_pass::ForwardPass;
use crate::detection_runners::session::DetectorSession;
use crate::error::DetectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Handed to the worker.
    Admitted,
    /// The worker was busy; the frame buffer was released.
    Dropped,
    /// The pipeline has shut down.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Busy,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GateStats {
    pub frames_admitted: u64,
    pub frames_dropped: u64,
    pub cycles_completed: u64,
    /// Events discarded because the consumer fell behind.
    pub events_dropped: u64,
}

#[derive(Default)]
struct Slot {
    busy: bool,
    frame_tx: Option<Sender<Arc<Frame>>>,
    /// Last completed cycle, kept so a selection can crop the frame it saw.
    latest: Option<(Arc<Frame>, DetectionResult)>,
}

pub struct FrameGate {
    slot: Mutex<Slot>,
    recycler: Option<Sender<Vec<u8>>>,
    frames_admitted: AtomicU64,
    frames_dropped: AtomicU64,
    cycles_completed: AtomicU64,
    events_dropped: AtomicU64,
}

impl FrameGate {
    fn new(frame_tx: Sender<Arc<Frame>>, recycler: Option<Sender<Vec<u8>>>) -> Self {
        Self {
            slot: Mutex::new(Slot {
                frame_tx: Some(frame_tx),
                ..Default::default()
            }),
            recycler,
            frames_admitted: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            cycles_completed: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
        }
    }

    /// Offers a frame without blocking. Ownership passes to the gate in every
    /// case; a frame that is not admitted is released before returning.
    pub fn offer(&self, frame: Frame) -> Admission {
        let mut slot = self.slot.lock();
        if slot.busy {
            drop(slot);
            self.frames_dropped.fetch_add(1, Ordering::Relaxed);
            log::trace!("Worker busy, dropping frame");
            self.release(frame);
            return Admission::Dropped;
        }

        let Some(frame_tx) = slot.frame_tx.as_ref() else {
            drop(slot);
            self.release(frame);
            return Admission::Closed;
        };

        match frame_tx.try_send(Arc::new(frame)) {
            Ok(()) => {
                slot.busy = true;
                self.frames_admitted.fetch_add(1, Ordering::Relaxed);
                Admission::Admitted
            }
            Err(TrySendError::Full(frame)) => {
                drop(slot);
                self.frames_dropped.fetch_add(1, Ordering::Relaxed);
                self.release_shared(frame);
                Admission::Dropped
            }
            Err(TrySendError::Disconnected(frame)) => {
                slot.frame_tx = None;
                drop(slot);
                self.release_shared(frame);
                Admission::Closed
            }
        }
    }

    /// Records a finished cycle and returns the gate to idle. The frame it
    /// replaces as the latest snapshot is released.
    fn complete(&self, frame: Arc<Frame>, result: DetectionResult) {
        let previous = {
            let mut slot = self.slot.lock();
            slot.busy = false;
            slot.latest.replace((frame, result))
        };
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        if let Some((frame, _)) = previous {
            self.release_shared(frame);
        }
    }

    pub fn state(&self) -> GateState {
        if self.slot.lock().busy {
            GateState::Busy
        } else {
            GateState::Idle
        }
    }

    pub fn stats(&self) -> GateStats {
        GateStats {
            frames_admitted: self.frames_admitted.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
        }
    }

    /// The most recent result together with the frame it was computed from.
    pub fn latest(&self) -> Option<(Arc<Frame>, DetectionResult)> {
        self.slot.lock().latest.clone()
    }

    /// Picks the best box of the latest result and crops it out of its frame.
    pub fn select_best(&self) -> Option<Selection> {
        let (frame, result) = self.latest()?;
        select_best(&result, &frame)
    }

    fn disconnect(&self) {
        self.slot.lock().frame_tx = None;
    }

    fn clear(&self) {
        let latest = self.slot.lock().latest.take();
        if let Some((frame, _)) = latest {
            self.release_shared(frame);
        }
    }

    fn release(&self, frame: Frame) {
        if let Some(recycler) = &self.recycler {
            // the capture side may have gone away or be full; the buffer is simply freed then
            let _ = recycler.try_send(frame.into_buffer());
        }
    }

    fn release_shared(&self, frame: Arc<Frame>) {
        // still shared with a selection caller, which frees it on drop
        if let Ok(frame) = Arc::try_unwrap(frame) {
            self.release(frame);
        }
    }
}

/// Owns the detection worker thread and the gate feeding it.
pub struct Pipeline<E: ForwardPass + 'static> {
    gate: Arc<FrameGate>,
    session: Arc<DetectorSession<E>>,
    worker: Option<JoinHandle<()>>,
}

impl<E: ForwardPass + 'static> Pipeline<E> {
    /// Starts the worker. Results arrive on the returned receiver, one event
    /// per admitted frame.
    pub fn spawn(session: DetectorSession<E>) -> Result<(Self, Receiver<DetectionEvent>), DetectError> {
        Self::spawn_with_recycler(session, None)
    }

    /// Like [`Pipeline::spawn`], additionally handing released frame buffers
    /// to `recycler`.
    pub fn spawn_with_recycler(
        session: DetectorSession<E>,
        recycler: Option<Sender<Vec<u8>>>,
    ) -> Result<(Self, Receiver<DetectionEvent>), DetectError> {
        let (send_state, detection_state) = detection_channels();
        let gate = Arc::new(FrameGate::new(send_state.frame_tx, recycler));
        let session = Arc::new(session);

        let worker = {
            let gate = Arc::clone(&gate);
            let session = Arc::clone(&session);
            std::thread::Builder::new()
                .name("frame-detect-worker".to_string())
                .spawn(move || run_worker(session, gate, detection_state))?
        };

        log::debug!("Detection worker started");
        Ok((
            Self {
                gate,
                session,
                worker: Some(worker),
            },
            send_state.event_rx,
        ))
    }

    pub fn offer(&self, frame: Frame) -> Admission {
        self.gate.offer(frame)
    }

    pub fn gate(&self) -> Arc<FrameGate> {
        Arc::clone(&self.gate)
    }

    pub fn session(&self) -> &Arc<DetectorSession<E>> {
        &self.session
    }

    pub fn select_best(&self) -> Option<Selection> {
        self.gate.select_best()
    }

    /// Stops admitting frames, waits for the in-flight cycle, closes the
    /// session and releases the retained frame.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.gate.disconnect();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Detection worker panicked");
            }
        }
        self.session.close();
        self.gate.clear();
        log::debug!("Detection pipeline stopped: {:?}", self.gate.stats());
    }
}

impl<E: ForwardPass + 'static> Drop for Pipeline<E> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.stop();
        }
    }
}

fn run_worker<E: ForwardPass>(session: Arc<DetectorSession<E>>, gate: Arc<FrameGate>, state: DetectionState) {
    while let Ok(frame) = state.frame_rx.recv() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| session.detect_once(&frame)));
        let (result, stop) = match outcome {
            Ok(Ok(result)) => (result, false),
            Ok(Err(err)) => {
                log::error!("Detection worker stopping: {err}");
                // no frame may be admitted into a channel nobody reads any more
                gate.disconnect();
                (DetectionResult::empty(), true)
            }
            Err(_) => {
                log::error!("Detection cycle panicked, reporting no detections");
                (DetectionResult::empty(), false)
            }
        };

        let event = DetectionEvent::from(result.clone());
        gate.complete(frame, result);
        match state.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                gate.events_dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("Detection event channel full, dropping event");
            }
            Err(TrySendError::Disconnected(_)) => log::debug!("Detection event receiver dropped"),
        }
        if stop {
            break;
        }
    }
    log::debug!("Detection worker exiting");
}

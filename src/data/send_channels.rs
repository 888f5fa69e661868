use std::sync::Arc;
use crate::common::{DetectionEvent, Frame};

/// Worker side of the pipeline: admitted frames in, events out.
#[derive(Debug)]
pub struct DetectionState {
    pub frame_rx: crossbeam_channel::Receiver<Arc<Frame>>,
    pub event_tx: crossbeam_channel::Sender<DetectionEvent>,
}

/// Gate side of the pipeline.
#[derive(Debug)]
pub struct SendState {
    pub frame_tx: crossbeam_channel::Sender<Arc<Frame>>,
    pub event_rx: crossbeam_channel::Receiver<DetectionEvent>,
}

/// Events the worker may queue ahead of a slow consumer before it starts
/// discarding them.
pub const EVENT_CAPACITY: usize = 32;

/// Builds the paired channel ends. The frame channel holds a single job,
/// matching the one-frame-in-flight rule.
pub fn detection_channels() -> (SendState, DetectionState) {
    let (frame_tx, frame_rx) = crossbeam_channel::bounded(1);
    let (event_tx, event_rx) = crossbeam_channel::bounded(EVENT_CAPACITY);
    (
        SendState { frame_tx, event_rx },
        DetectionState { frame_rx, event_tx },
    )
}

use serde::{Deserialize, Serialize};
use crate::common::BoundingBox;

/// Outcome of one detection cycle.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Surviving boxes, highest confidence first.
    pub boxes: Vec<BoundingBox>,
    pub inference_time_ms: u64,
}

impl DetectionResult {
    pub fn new(boxes: Vec<BoundingBox>, inference_time_ms: u64) -> Self {
        Self {
            boxes,
            inference_time_ms,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }
}

/// What the pipeline sends to its consumer after every admitted frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionEvent {
    Empty,
    Detections {
        boxes: Vec<BoundingBox>,
        inference_time_ms: u64,
    },
}

impl From<DetectionResult> for DetectionEvent {
    fn from(result: DetectionResult) -> Self {
        if result.is_empty() {
            DetectionEvent::Empty
        } else {
            DetectionEvent::Detections {
                boxes: result.boxes,
                inference_time_ms: result.inference_time_ms,
            }
        }
    }
}

/// Callback-style consumer, for callers that prefer it over reading the
/// event channel directly.
pub trait DetectionListener {
    fn on_empty(&mut self);
    fn on_detections(&mut self, boxes: &[BoundingBox], inference_time_ms: u64);
}

impl DetectionEvent {
    pub fn dispatch<L: DetectionListener + ?Sized>(self, listener: &mut L) {
        match self {
            DetectionEvent::Empty => listener.on_empty(),
            DetectionEvent::Detections {
                boxes,
                inference_time_ms,
            } => listener.on_detections(&boxes, inference_time_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        empties: usize,
        seen: Vec<(usize, u64)>,
    }

    impl DetectionListener for Recorder {
        fn on_empty(&mut self) {
            self.empties += 1;
        }

        fn on_detections(&mut self, boxes: &[BoundingBox], inference_time_ms: u64) {
            self.seen.push((boxes.len(), inference_time_ms));
        }
    }

    #[test]
    fn empty_result_becomes_empty_event() {
        let event = DetectionEvent::from(DetectionResult::new(vec![], 12));
        assert_eq!(event, DetectionEvent::Empty);
    }

    #[test]
    fn dispatch_routes_to_listener() {
        let mut recorder = Recorder::default();
        DetectionEvent::Empty.dispatch(&mut recorder);

        let bbox = BoundingBox::from_x1y1_x2y2(0.1, 0.1, 0.4, 0.4).with_confidence(0.9);
        DetectionEvent::from(DetectionResult::new(vec![bbox], 7)).dispatch(&mut recorder);

        assert_eq!(recorder.empties, 1);
        assert_eq!(recorder.seen, vec![(1, 7)]);
    }
}

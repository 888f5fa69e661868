mod utils;
pub mod common;
pub mod data;
pub mod detection_runners;
pub mod error;

use std::time::Instant;
use crate::common::{Frame, ModelConfig, Rotation};
use crate::detection_runners::{DetectorSession, ForwardPass, OrtEngine};

pub use crate::common::{BoundingBox, DetectionEvent, DetectionListener, DetectionResult, Selection};
pub use crate::detection_runners::{Admission, FrameGate, Pipeline};
pub use crate::error::DetectError;

pub type Result<T, E = DetectError> = std::result::Result<T, E>;

/// Creates an ONNX Runtime session for `config` and runs it once on a blank
/// frame, so the first camera frame does not pay for graph initialization.
pub fn init_detector(config: &ModelConfig) -> Result<DetectorSession<OrtEngine>> {
    let session = DetectorSession::create(config)?;
    warm_up(&session)?;
    Ok(session)
}

pub fn warm_up<E: ForwardPass>(session: &DetectorSession<E>) -> Result<()> {
    let shape = session.shape();
    let (width, height) = (shape.input_width as u32, shape.input_height as u32);
    let blank = Frame::new(width, height, vec![0; (width * height * 4) as usize], Rotation::Deg0);

    let now = Instant::now();
    session.detect_once(&blank)?;
    log::info!("Warm-up run: {:?}", now.elapsed());
    Ok(())
}

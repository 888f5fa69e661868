use std::time::{Duration, Instant};
use ndarray::Axis;
use parking_lot::Mutex;
use crate::common::{DetectionResult, Frame, ModelConfig};
use crate::data::{LabelTable, OrtOptions, Stage, TimeCalc};
use crate::detection_runners::forward_pass::{ForwardPass, ModelShape};
use crate::detection_runners::ort_detector::decode::{decode, DecodeParams};
use crate::detection_runners::ort_detector::image_ops;
use crate::detection_runners::ort_detector::nms::non_max_suppression;
use crate::detection_runners::ort_detector::OrtEngine;
use crate::error::DetectError;
use crate::utils;

/// A loaded model plus the label table and thresholds it runs with.
///
/// `detect_once` and `close` serialize on the same lock, so closing waits
/// for an in-flight cycle and a closed session never touches the engine.
pub struct DetectorSession<E: ForwardPass> {
    engine: Mutex<Option<E>>,
    shape: ModelShape,
    labels: LabelTable,
    params: DecodeParams,
    iou_threshold: f32,
    timings: Mutex<TimeCalc>,
}

impl DetectorSession<OrtEngine> {
    /// Loads the model and labels named in `config`.
    pub fn create(config: &ModelConfig) -> Result<Self, DetectError> {
        log::info!("Creating detector session: {}", config);
        let labels = LabelTable::from_file(&config.labels_path)?;
        let engine = OrtEngine::new(&OrtOptions::from(config))?;
        Self::with_engine(engine, labels, config)
    }
}

impl<E: ForwardPass> DetectorSession<E> {
    /// Wraps an already built engine. The label count has to match the
    /// number of class channels the model declares.
    pub fn with_engine(engine: E, labels: LabelTable, config: &ModelConfig) -> Result<Self, DetectError> {
        let shape = engine.shape();
        shape.validate()?;
        if labels.len() != shape.num_classes() {
            return Err(DetectError::LabelCountMismatch {
                expected: shape.num_classes(),
                found: labels.len(),
            });
        }

        log::info!(
            "Detector ready | Input: {}x{} | Classes: {} | Elements: {} | Conf > {} | IoU > {}",
            shape.input_width,
            shape.input_height,
            shape.num_classes(),
            shape.num_elements,
            config.conf_threshold,
            config.iou_threshold,
        );

        Ok(Self {
            engine: Mutex::new(Some(engine)),
            shape,
            labels,
            params: DecodeParams::from(config),
            iou_threshold: config.iou_threshold,
            timings: Mutex::new(TimeCalc::default()),
        })
    }

    /// Runs one full cycle on `frame`.
    ///
    /// Failures inside the cycle are logged and reported as an empty result;
    /// the only error is calling this after `close`.
    pub fn detect_once(&self, frame: &Frame) -> Result<DetectionResult, DetectError> {
        let mut guard = self.engine.lock();
        let engine = guard.as_mut().ok_or(DetectError::SessionClosed)?;

        match self.run_cycle(engine, frame) {
            Ok(result) => Ok(result),
            Err(err) => {
                log::warn!("Detection cycle failed, reporting no detections: {err:#}");
                Ok(DetectionResult::empty())
            }
        }
    }

    fn run_cycle(&self, engine: &mut E, frame: &Frame) -> anyhow::Result<DetectionResult> {
        let detect_time = Instant::now();
        let mut elapsed = Duration::ZERO;

        let input = image_ops::preprocess(frame, self.shape.input_width, self.shape.input_height)?
            .insert_axis(Axis(0));
        elapsed = utils::trace("Preprocessing input", detect_time, elapsed);
        let t_pre = elapsed;

        let output = engine.forward(input)?;
        let expected = (self.shape.num_channels, self.shape.num_elements);
        if output.dim() != expected {
            anyhow::bail!("Model produced {:?}, expected {:?}", output.dim(), expected);
        }
        elapsed = utils::trace("Detection run", detect_time, elapsed);
        let t_run = elapsed - t_pre;

        let candidates = decode(output.view(), &self.labels, &self.params)?;
        let n_candidates = candidates.len();
        let boxes = non_max_suppression(candidates, self.iou_threshold);
        elapsed = utils::trace("Postprocessing", detect_time, elapsed);
        let t_post = elapsed - t_pre - t_run;

        let inference_time = t_run + t_post;
        {
            let mut timings = self.timings.lock();
            timings.add(Stage::Preprocess, t_pre);
            timings.add(Stage::Forward, t_run);
            timings.add(Stage::Postprocess, t_post);
            timings.finish_cycle();
        }

        log::debug!(
            "Detection cycle: {} candidates, {} kept, {:?} inference",
            n_candidates,
            boxes.len(),
            inference_time,
        );
        Ok(DetectionResult::new(boxes, inference_time.as_millis() as u64))
    }

    /// Releases the engine. Safe to call more than once; waits for a cycle
    /// that is already running.
    pub fn close(&self) {
        match self.engine.lock().take() {
            Some(engine) => {
                drop(engine);
                let timings = self.timings.lock();
                log::info!(
                    "Detector session closed after {} cycles (avg {:?} | forward {:?})",
                    timings.n(),
                    timings.avg(),
                    timings.avg_stage(Stage::Forward),
                );
            }
            None => log::debug!("Detector session already closed"),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.engine.lock().is_none()
    }

    pub fn shape(&self) -> ModelShape {
        self.shape
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn timings(&self) -> TimeCalc {
        self.timings.lock().clone()
    }
}

impl<E: ForwardPass> Drop for DetectorSession<E> {
    fn drop(&mut self) {
        self.close();
    }
}

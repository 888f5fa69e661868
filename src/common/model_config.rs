use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::common::inference_device::InferenceDevice;
use crate::error::DetectError;

pub const DEFAULT_CONF_THRESHOLD: f32 = 0.3;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;
pub const DEFAULT_MIN_BOX_SIZE: f32 = 0.01;
pub const DEFAULT_MAX_BOX_SIZE: f32 = 0.99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub inference_device: InferenceDevice,
    /// Objectness must be strictly above this to keep a candidate.
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    /// Exclusive bounds on normalized box width and height.
    pub min_box_size: f32,
    pub max_box_size: f32,
    /// ONNX Runtime intra-op threads; `0` lets the runtime decide.
    pub intra_threads: usize,
    /// Logs the duration of every forward pass.
    pub profile: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            labels_path: PathBuf::new(),
            inference_device: InferenceDevice::CPU,
            conf_threshold: DEFAULT_CONF_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            min_box_size: DEFAULT_MIN_BOX_SIZE,
            max_box_size: DEFAULT_MAX_BOX_SIZE,
            intra_threads: 0,
            profile: false,
        }
    }
}

impl ModelConfig {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(model_path: P, labels_path: Q) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            labels_path: labels_path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DetectError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn with_device(mut self, device: InferenceDevice) -> Self {
        self.inference_device = device;
        self
    }

    pub fn with_conf_threshold(mut self, x: f32) -> Self {
        self.conf_threshold = x;
        self
    }

    pub fn with_iou_threshold(mut self, x: f32) -> Self {
        self.iou_threshold = x;
        self
    }
}

impl std::fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model Path: {}\n\
        Labels Path: {}\n\
        Inference Device: {}\n\
        Confidence Threshold: {}\n\
        IoU Threshold: {}\n\
        Box Size Range: ({}, {})",
               self.model_path.display(), self.labels_path.display(),
               self.inference_device, self.conf_threshold, self.iou_threshold,
               self.min_box_size, self.max_box_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_detector_constants() {
        let config = ModelConfig::default();
        assert_eq!(config.conf_threshold, 0.3);
        assert_eq!(config.iou_threshold, 0.5);
        assert_eq!(config.min_box_size, 0.01);
        assert_eq!(config.max_box_size, 0.99);
        assert_eq!(config.inference_device, InferenceDevice::CPU);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ModelConfig::from_json_str(
            r#"{ "model_path": "best.onnx", "labels_path": "labels.txt", "inference_device": { "cuda": 0 } }"#,
        )
        .unwrap();
        assert_eq!(config.model_path, PathBuf::from("best.onnx"));
        assert_eq!(config.inference_device, InferenceDevice::CUDA(0));
        assert_eq!(config.conf_threshold, 0.3);
        assert!(!config.profile);
    }

    #[test]
    fn profile_flag_is_read_from_json() {
        let config = ModelConfig::from_json_str(r#"{ "profile": true }"#).unwrap();
        assert!(config.profile);
        assert_eq!(config.iou_threshold, 0.5);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = ModelConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, DetectError::Config(_)));
    }
}

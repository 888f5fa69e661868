//! Options for building the ONNX Runtime engine.

use std::path::{Path, PathBuf};
use crate::common::{InferenceDevice, ModelConfig};

#[derive(Debug, Clone)]
pub struct OrtOptions {
    pub onnx_path: PathBuf,
    pub device: InferenceDevice,
    pub intra_threads: usize,
    pub profile: bool,
}

impl Default for OrtOptions {
    fn default() -> Self {
        Self {
            onnx_path: PathBuf::new(),
            device: InferenceDevice::CPU,
            intra_threads: 0,
            profile: false,
        }
    }
}

impl OrtOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_model<P: AsRef<Path>>(mut self, onnx_path: P) -> Self {
        self.onnx_path = onnx_path.as_ref().to_path_buf();
        self
    }

    pub fn with_device(mut self, device: InferenceDevice) -> Self {
        self.device = device;
        self
    }

    pub fn with_intra_threads(mut self, n: usize) -> Self {
        self.intra_threads = n;
        self
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }
}

impl From<&ModelConfig> for OrtOptions {
    fn from(config: &ModelConfig) -> Self {
        OrtOptions::new()
            .with_model(&config.model_path)
            .with_device(config.inference_device)
            .with_intra_threads(config.intra_threads)
            .with_profile(config.profile)
    }
}

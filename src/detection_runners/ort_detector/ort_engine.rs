//! ONNX Runtime backend for the detection pipeline.

use anyhow::{anyhow, Result};
use half::f16;
use ndarray::{Array2, Array4, ArrayD};
use ort::{
    execution_providers::{CUDAExecutionProvider, ExecutionProvider},
    session::builder::{GraphOptimizationLevel, SessionBuilder},
    session::{Session, SessionInputValue},
    value::{DynValue, Tensor},
};
use crate::common::InferenceDevice;
use crate::data::{OrtOptions, CROSS_MARK};
use crate::detection_runners::forward_pass::{ForwardPass, ModelShape};
use crate::error::DetectError;
use crate::utils::human_bytes;

/// ONNXRuntime Backend
#[derive(Debug)]
pub struct OrtEngine {
    session: Session,
    device: InferenceDevice,
    shape: ModelShape,
    output_name: String,
    profile: bool,
}

impl OrtEngine {
    pub fn new(config: &OrtOptions) -> Result<Self, DetectError> {
        let path = &config.onnx_path;
        let load_err = |reason: String| DetectError::ModelLoad { path: path.clone(), reason };

        let file_size = std::fs::metadata(path).map_err(|e| load_err(e.to_string()))?.len();

        let mut builder = Session::builder().map_err(|e| load_err(e.to_string()))?;

        let mut device = config.device;
        if let InferenceDevice::CUDA(device_id) = device {
            Self::build_cuda(&mut builder, device_id).unwrap_or_else(|err| {
                log::warn!("{err}, Using cpu");
                device = InferenceDevice::CPU;
            });
        }

        if config.intra_threads > 0 {
            builder = builder
                .with_intra_threads(config.intra_threads)
                .map_err(|e| load_err(e.to_string()))?;
        }

        let session = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_err(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| load_err(e.to_string()))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| DetectError::ShapeMismatch("model declares no inputs".to_string()))?;
        let output = session
            .outputs
            .first()
            .ok_or_else(|| DetectError::ShapeMismatch("model declares no outputs".to_string()))?;

        let input_dims: Vec<i64> = input
            .input_type
            .tensor_shape()
            .map(|s| s.to_vec())
            .ok_or_else(|| DetectError::ShapeMismatch(format!("input '{}' is not a tensor", input.name)))?;
        let output_dims: Vec<i64> = output
            .output_type
            .tensor_shape()
            .map(|s| s.to_vec())
            .ok_or_else(|| DetectError::ShapeMismatch(format!("output '{}' is not a tensor", output.name)))?;

        let shape = ModelShape::from_dims(&input_dims, &output_dims)?;
        let output_name = output.name.to_string();

        // summary
        log::info!(
            "Backend: ONNXRuntime | Device: {} | Model: {} | Input '{}': {}x{} | Output '{}': {}x{}",
            device,
            human_bytes(file_size as f64),
            input.name,
            shape.input_width,
            shape.input_height,
            output_name,
            shape.num_channels,
            shape.num_elements,
        );

        Ok(Self {
            session,
            device,
            shape,
            output_name,
            profile: config.profile,
        })
    }

    fn build_cuda(builder: &mut SessionBuilder, device_id: usize) -> Result<()> {
        let ep = CUDAExecutionProvider::default().with_device_id(device_id as i32);
        match ep.is_available() {
            Ok(true) => {}
            _ => anyhow::bail!("{CROSS_MARK} CUDA execution provider not available"),
        }
        match ep.register(builder) {
            Ok(_) => Ok(()),
            Err(err) => anyhow::bail!("{CROSS_MARK} CUDA initialization failed: {:?}", err),
        }
    }

    fn tensor_postprocess(x: &DynValue) -> Result<ArrayD<f32>> {
        if let Ok(y) = x.try_extract_array::<f32>() {
            return Ok(y.into_owned());
        }
        match x.try_extract_array::<f16>() {
            Ok(y) => Ok(y.mapv(f16::to_f32)),
            Err(err) => Err(anyhow!("Unsupported output tensor type: {err}")),
        }
    }

    pub fn device(&self) -> &InferenceDevice {
        &self.device
    }
}

impl ForwardPass for OrtEngine {
    fn shape(&self) -> ModelShape {
        self.shape
    }

    fn forward(&mut self, input: Array4<f32>) -> Result<Array2<f32>> {
        let t_run = std::time::Instant::now();

        let tensor = Tensor::from_array(input).map_err(|e| anyhow!("{e}"))?;
        let xs = [SessionInputValue::from(tensor.into_dyn())];
        let outputs = self.session.run(&xs[..]).map_err(|e| anyhow!("{e}"))?;

        let y = Self::tensor_postprocess(&outputs[self.output_name.as_str()])?;
        let (c, n) = (self.shape.num_channels, self.shape.num_elements);
        if y.len() != c * n {
            anyhow::bail!("Output has shape {:?}, expected (1, {}, {})", y.shape(), c, n);
        }
        let y = y.into_shape_with_order((c, n))?;

        if self.profile {
            log::info!("[Profile] inference: {:>10.4?}", t_run.elapsed());
        }
        Ok(y)
    }
}

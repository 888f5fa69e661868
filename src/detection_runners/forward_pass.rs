use ndarray::{Array2, Array4};
use crate::error::DetectError;

/// Channels before the per-class scores: `cx, cy, w, h, objectness`.
pub const CLASS_OFFSET: usize = 5;
pub const INPUT_CHANNELS: usize = 3;

/// Tensor geometry declared by a detection model.
///
/// Input is NHWC `(1, input_height, input_width, 3)`, output is channel-major
/// `(1, num_channels, num_elements)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelShape {
    pub input_width: usize,
    pub input_height: usize,
    pub num_channels: usize,
    pub num_elements: usize,
}

impl ModelShape {
    pub fn num_classes(&self) -> usize {
        self.num_channels.saturating_sub(CLASS_OFFSET)
    }

    /// Derives the shape from declared input and output dimensions. Dynamic
    /// (non-positive) dimensions are only tolerated on the batch axis.
    pub fn from_dims(input: &[i64], output: &[i64]) -> Result<Self, DetectError> {
        if input.len() != 4 {
            return Err(DetectError::ShapeMismatch(format!(
                "expected 4D input (1, H, W, 3), got {:?}", input
            )));
        }
        if output.len() != 3 {
            return Err(DetectError::ShapeMismatch(format!(
                "expected 3D output (1, C, N), got {:?}", output
            )));
        }
        if input[0] > 1 || output[0] > 1 {
            return Err(DetectError::ShapeMismatch(format!(
                "batch size must be 1, got input {:?} / output {:?}", input, output
            )));
        }
        if input[3] != INPUT_CHANNELS as i64 {
            return Err(DetectError::ShapeMismatch(format!(
                "expected 3 input channels in NHWC layout, got {:?}", input
            )));
        }

        let positive = |dim: i64, what: &str| -> Result<usize, DetectError> {
            if dim > 0 {
                Ok(dim as usize)
            } else {
                Err(DetectError::ShapeMismatch(format!("{what} must be static and positive, got {dim}")))
            }
        };

        let shape = Self {
            input_height: positive(input[1], "input height")?,
            input_width: positive(input[2], "input width")?,
            num_channels: positive(output[1], "output channels")?,
            num_elements: positive(output[2], "output elements")?,
        };
        shape.validate()?;
        Ok(shape)
    }

    pub fn validate(&self) -> Result<(), DetectError> {
        if self.input_width == 0 || self.input_height == 0 || self.num_elements == 0 {
            return Err(DetectError::ShapeMismatch(format!("degenerate model shape {:?}", self)));
        }
        if self.num_channels <= CLASS_OFFSET {
            return Err(DetectError::ShapeMismatch(format!(
                "output needs more than {} channels to carry class scores, got {}",
                CLASS_OFFSET, self.num_channels
            )));
        }
        Ok(())
    }
}

/// The opaque "run the network once" capability.
///
/// Implementations are driven by a single worker at a time.
pub trait ForwardPass: Send {
    fn shape(&self) -> ModelShape;

    /// Runs the model on an NHWC tensor of shape `(1, H, W, 3)` and returns
    /// the output as `(num_channels, num_elements)`.
    fn forward(&mut self, input: Array4<f32>) -> anyhow::Result<Array2<f32>>;
}

impl<T: ForwardPass + ?Sized> ForwardPass for Box<T> {
    fn shape(&self) -> ModelShape {
        (**self).shape()
    }

    fn forward(&mut self, input: Array4<f32>) -> anyhow::Result<Array2<f32>> {
        (**self).forward(input)
    }
}

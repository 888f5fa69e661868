mod bounding_box;
mod detection;
mod frame;
mod inference_device;
mod model_config;
mod selection;

pub use bounding_box::*;
pub use detection::*;
pub use frame::*;
pub use inference_device::*;
pub use model_config::*;
pub use selection::*;

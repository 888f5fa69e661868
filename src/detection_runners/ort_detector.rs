mod ort_engine;
pub mod decode;
pub mod image_ops;
pub mod nms;

pub use ort_engine::*;

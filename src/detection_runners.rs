pub mod forward_pass;
pub mod frame_gate;
pub mod ort_detector;
pub mod session;

pub use forward_pass::{ForwardPass, ModelShape};
pub use frame_gate::*;
pub use ort_detector::*;
pub use session::*;

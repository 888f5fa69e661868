mod config_ort;
mod filesystem_access;
mod label_table;
mod time_calc;
pub mod send_channels;

pub use config_ort::OrtOptions;
pub use filesystem_access::FsAccess;
pub use label_table::LabelTable;
pub use time_calc::{Stage, TimeCalc};

pub(crate) const CROSS_MARK: &str = "❌";

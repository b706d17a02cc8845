mod log_format;
mod overflow;

pub use log_format::LogFormat;
pub use overflow::OverflowPolicy;

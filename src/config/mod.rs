mod logging;
mod probe;
mod prober;
mod schedule;
mod types;

pub use logging::Config as LoggingConfig;
pub use probe::Config as ProbeConfig;
pub use prober::Config;
pub use schedule::Config as ScheduleConfig;
pub use schedule::SUPPORTED_RATES;
pub use types::{LogFormat, OverflowPolicy};

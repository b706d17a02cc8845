mod config;
mod init;
mod kinds;
mod probe;
mod prober;

pub use kinds::ProbeFailureKind;

pub use config::ConfigValidationError;
pub use init::InitializationError;
pub use probe::ProbeError;
pub use prober::ProberError;

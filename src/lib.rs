pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod session;
pub mod transport;

pub use config::{
    Config, LogFormat, LoggingConfig, OverflowPolicy, ProbeConfig, ScheduleConfig,
    SUPPORTED_RATES,
};
pub use controller::RateController;
pub use dispatcher::{Dispatch, ProbeDispatcher};
pub use errors::{
    ConfigValidationError, InitializationError, ProbeError, ProbeFailureKind, ProberError,
};
pub use logging::setup_logging;
pub use metrics::{actual_frequency, Report};
pub use session::{interval_for_rate, Session, SessionId, SessionState};
pub use transport::{FakeOutcome, FakeTransport, ProbeTransport, SystemPing};

//! Probe transports.
//!
//! - [`SystemPing`]: runs the platform `ping` binary once per probe
//! - [`FakeTransport`]: scripted replies for tests and dry runs

mod fake;
mod system_ping;

use std::{future::Future, sync::Arc};

use crate::ProbeError;

pub use fake::{FakeOutcome, FakeTransport};
pub use system_ping::SystemPing;

/// Sends one echo probe to a target.
///
/// Implementations make exactly one attempt. The dispatcher bounds the call
/// with the configured probe timeout, so a transport may take longer without
/// stalling anything but its own task.
pub trait ProbeTransport: Send + Sync + 'static {
    fn probe(&self, target: &str) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

impl<T: ProbeTransport> ProbeTransport for Arc<T> {
    fn probe(&self, target: &str) -> impl Future<Output = Result<(), ProbeError>> + Send {
        (**self).probe(target)
    }
}

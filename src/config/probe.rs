use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::OverflowPolicy;

/// Probe transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Ping binary used by the system transport
    pub program: String,

    /// Upper bound for a single probe attempt
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// ICMP payload size in bytes
    pub payload_size: usize,

    /// Maximum number of probes allowed in flight at once
    pub max_in_flight: usize,

    /// What to do with a tick when `max_in_flight` probes are outstanding
    pub overflow: OverflowPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program: "ping".to_string(),
            timeout: Duration::from_millis(200),
            payload_size: 56,
            max_in_flight: 16,
            overflow: OverflowPolicy::Skip,
        }
    }
}

impl Config {
    /// Seconds passed to `ping -W`, which only takes whole seconds on most
    /// platforms. The dispatcher enforces the exact limit.
    pub fn wait_secs(&self) -> u64 {
        let millis = self.timeout.as_millis() as u64;
        millis.div_ceil(1000).max(1)
    }
}

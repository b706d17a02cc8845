use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Rates offered by the command line front end, in probes per second
pub const SUPPORTED_RATES: &[u32] = &[1, 2, 5, 10, 20, 50, 100];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Requested probe rate used when none is given on the command line
    pub rate_hz: f64,

    /// Reports taken before this much of the session has elapsed show 0 Hz
    #[serde(with = "humantime_serde")]
    pub min_report_elapsed: Duration,

    /// Capacity of the report channel
    pub report_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rate_hz: 10.0,
            min_report_elapsed: Duration::from_millis(10),
            report_buffer: 64,
        }
    }
}

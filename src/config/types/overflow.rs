use serde::{Deserialize, Serialize};

/// Behaviour of a tick that finds `max_in_flight` probes still outstanding
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Skip this tick's probe and count it as skipped
    #[default]
    Skip,
    /// Always spawn a probe, however many are outstanding
    Unbounded,
}

impl std::fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverflowPolicy::Skip => write!(f, "skip"),
            OverflowPolicy::Unbounded => write!(f, "unbounded"),
        }
    }
}

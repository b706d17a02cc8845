#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailureKind {
    Timeout,
    Unreachable,
    Transport,
    TransportUnavailable,
}

impl std::fmt::Display for ProbeFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "Timeout"),
            Self::Unreachable => write!(f, "Unreachable"),
            Self::Transport => write!(f, "Transport error"),
            Self::TransportUnavailable => write!(f, "Transport unavailable"),
        }
    }
}

mod probe_failure;

pub use probe_failure::ProbeFailureKind;

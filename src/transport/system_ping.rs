use std::process::Stdio;

use tokio::process::Command;
use tracing::trace;

use crate::{ProbeConfig, ProbeError};

use super::ProbeTransport;

/// Probe transport backed by the system `ping` binary.
///
/// Runs `ping -c 1 -W <secs> -s <payload> <target>` and treats exit status 0
/// as a reply.
#[derive(Debug, Clone)]
pub struct SystemPing {
    program: String,
    wait_secs: u64,
    payload_size: usize,
}

impl SystemPing {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            program: config.program.clone(),
            wait_secs: config.wait_secs(),
            payload_size: config.payload_size,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self, target: &str) -> Vec<String> {
        vec![
            "-c".to_string(),
            "1".to_string(),
            "-W".to_string(),
            self.wait_secs.to_string(),
            "-s".to_string(),
            self.payload_size.to_string(),
            target.to_string(),
        ]
    }
}

impl ProbeTransport for SystemPing {
    async fn probe(&self, target: &str) -> Result<(), ProbeError> {
        let args = self.arguments(target);
        trace!("Running {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            // The dispatcher drops this future on timeout, take the process with it
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProbeError::unavailable(&self.program, e))?;

        let status = child.wait().await?;
        if status.success() {
            Ok(())
        } else {
            Err(ProbeError::Unreachable {
                status: status.code(),
            })
        }
    }
}

use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::config::ServiceTarget;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A running `kubectl port-forward` child. The child is killed and reaped on drop.
pub struct PortForward {
    target: ServiceTarget,
    child: Child,
}

impl Drop for PortForward {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        tracing::debug!(
            "stopped port-forward to {}/{}",
            self.target.namespace,
            self.target.service
        );
    }
}

impl PortForward {
    pub fn spawn(kubectl: &str, target: &ServiceTarget) -> Result<Self> {
        let service = format!("svc/{}", target.service);
        let ports = format!("{}:{}", target.port, target.port);
        let child = Command::new(kubectl)
            .args([
                "-n",
                target.namespace.as_str(),
                "port-forward",
                service.as_str(),
                ports.as_str(),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawn {} port-forward", kubectl))?;

        Ok(Self {
            target: target.clone(),
            child,
        })
    }

    pub fn local_url(&self) -> String {
        format!("http://localhost:{}", self.target.port)
    }

    /// Polls until `check` succeeds. Fails as soon as the child exits, or once
    /// `timeout` elapses.
    pub fn wait_ready(&mut self, timeout: Duration, mut check: impl FnMut() -> bool) -> Result<()> {
        let start = Instant::now();
        loop {
            if let Some(status) = self.child.try_wait().context("poll port-forward")? {
                anyhow::bail!(
                    "failed to start port-forward to {}/{} (kubectl exited with {})",
                    self.target.namespace,
                    self.target.service,
                    status
                );
            }
            if check() {
                return Ok(());
            }
            if start.elapsed() > timeout {
                anyhow::bail!(
                    "port-forward to {}/{} not ready after {:?}",
                    self.target.namespace,
                    self.target.service,
                    timeout
                );
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

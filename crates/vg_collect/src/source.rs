//! gcloud-backed inventory source.

use crate::{CollectError, InventorySource};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument};
use vg_config::VmgrepConfig;

/// Inventory source shelling out to the cloud CLI.
///
/// Credentials and account context are the CLI's own; this source only
/// invokes it and captures stdout.
#[derive(Debug, Clone)]
pub struct GcloudSource {
    bin: String,
    timeout: Duration,
}

impl GcloudSource {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }

    pub fn from_config(config: &VmgrepConfig) -> Self {
        Self::new(
            config.gcloud_bin.clone(),
            Duration::from_secs(config.fetch_timeout_secs),
        )
    }

    /// Run the tool with the given arguments, returning stdout.
    ///
    /// The timeout bounds each invocation so one hung project cannot block
    /// the refresh barrier indefinitely.
    #[instrument(skip(self))]
    async fn run(&self, args: &[&str]) -> Result<String, CollectError> {
        debug!(bin = %self.bin, ?args, "Running inventory tool");

        let child = Command::new(&self.bin)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => CollectError::ToolNotFound(self.bin.clone()),
                _ => CollectError::Exec(e.to_string()),
            })?;

        let result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        match result {
            Ok(Ok(output)) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(Ok(output)) => Err(CollectError::Exec(format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            Ok(Err(e)) => Err(CollectError::Exec(e.to_string())),
            Err(_) => Err(CollectError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl InventorySource for GcloudSource {
    async fn list_instances(&self, project: &str) -> Result<String, CollectError> {
        self.run(&[
            "compute",
            "instances",
            "list",
            "--project",
            project,
            "--format=json",
        ])
        .await
    }

    async fn discover_projects(&self) -> Result<Vec<String>, CollectError> {
        let out = self
            .run(&["projects", "list", "--format=value(projectId)"])
            .await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}

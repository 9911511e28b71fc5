use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use super::{ActiveConfig, BootHost};
use crate::image::{CONFIG_NAME, Image};
use anyhow::{Context, Result, bail};

/// Firmware-exported node holding the configuration the system booted with
const ACTIVE_CONFIG_NODE: &str = "/sys/firmware/bootconf/config";

/// Platform updater binary: resolves releases and stages finished images
const UPDATECTL: &str = "updatectl";

/// Host implementation backed by the real platform updater and sysfs
pub struct LocalHost;

impl LocalHost {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BootHost for LocalHost {
    async fn resolve_latest_image(&self) -> Result<PathBuf> {
        let output = Command::new(UPDATECTL)
            .arg("latest")
            .output()
            .await
            .with_context(|| format!("failed to run {UPDATECTL}"))?;
        if !output.status.success() {
            bail!(
                "{UPDATECTL} latest failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let path = String::from_utf8(output.stdout).context("updater returned a non-UTF-8 path")?;
        let path = PathBuf::from(path.trim());
        if !path.is_file() {
            bail!("updater reported a missing image: {}", path.display());
        }
        debug!("latest release image: {}", path.display());
        Ok(path)
    }

    async fn schedule_update(&self, image: &Path) -> Result<()> {
        let output = Command::new(UPDATECTL)
            .arg("stage")
            .arg(image)
            .output()
            .await
            .with_context(|| format!("failed to run {UPDATECTL}"))?;
        if !output.status.success() {
            bail!(
                "{UPDATECTL} stage failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        info!("update staged from {}", image.display());
        Ok(())
    }

    async fn read_active_config(&self) -> Result<ActiveConfig> {
        match tokio::fs::read_to_string(ACTIVE_CONFIG_NODE).await {
            Ok(text) => Ok(ActiveConfig {
                text,
                source: ACTIVE_CONFIG_NODE.to_string(),
            }),
            Err(err) => {
                // Older kernels do not export the node; fall back to the
                // configuration embedded in the newest release image
                debug!("no {ACTIVE_CONFIG_NODE} ({err}), falling back to the release image");
                let path = self.resolve_latest_image().await?;
                let data = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let image = Image::from_bytes(data)?;
                let text = String::from_utf8_lossy(image.read_file(CONFIG_NAME)?).to_string();
                Ok(ActiveConfig {
                    text,
                    source: format!("release image {}", path.display()),
                })
            }
        }
    }
}

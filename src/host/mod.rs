mod local;

pub use local::LocalHost;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Configuration text as reported by the running system, together with a
/// human-readable label for where it came from
#[derive(Debug, Clone)]
pub struct ActiveConfig {
    /// The configuration text itself
    pub text: String,
    /// Provenance label, e.g. a sysfs node or an image path
    pub source: String,
}

/// Trait for the host-side update machinery the tool drives.
///
/// One method per external action, so tests can substitute deterministic
/// fakes and need no privileged environment or real hardware.
#[async_trait]
pub trait BootHost: Send + Sync {
    /// Path of the newest release image available on this host
    async fn resolve_latest_image(&self) -> Result<PathBuf>;

    /// Hand a finished image to the updater for application at next boot
    async fn schedule_update(&self, image: &Path) -> Result<()>;

    /// The configuration the running system actually booted with
    async fn read_active_config(&self) -> Result<ActiveConfig>;
}

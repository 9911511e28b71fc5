//! Shared helpers for integration tests: a deterministic fake host and an
//! image builder matching the external generator's layout.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bootconf::image::{
    BLOCK_ALIGN, ERASED, FILE_MAGIC, FILE_OVERHEAD, HEADER_SIZE, IMAGE_SIZE, NAME_SIZE, PAD_MAGIC,
    SECTION_ALIGN, align_up,
};
use bootconf::{ActiveConfig, BootHost};

/// Build a well-formed release image: each file section starts a 4096-byte
/// block, padding sections close the gaps, erased flash follows the last.
pub fn build_image(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut data = vec![ERASED; IMAGE_SIZE];
    let mut offset = 0;

    for (i, (name, payload)) in files.iter().enumerate() {
        let length = (payload.len() + FILE_OVERHEAD) as u32;
        data[offset..offset + 4].copy_from_slice(&FILE_MAGIC.to_be_bytes());
        data[offset + 4..offset + 8].copy_from_slice(&length.to_be_bytes());

        let mut field = [0u8; NAME_SIZE];
        field[..name.len()].copy_from_slice(name.as_bytes());
        data[offset + 8..offset + 8 + NAME_SIZE].copy_from_slice(&field);
        data[offset + 20..offset + 24].fill(0);

        data[offset + 24..offset + 24 + payload.len()].copy_from_slice(payload);
        offset = align_up(offset + 24 + payload.len(), SECTION_ALIGN);

        if i + 1 < files.len() {
            let gap = align_up(offset, BLOCK_ALIGN) - offset;
            assert!(gap > HEADER_SIZE, "test payload fills its block");
            data[offset..offset + 4].copy_from_slice(&PAD_MAGIC.to_be_bytes());
            data[offset + 4..offset + 8]
                .copy_from_slice(&((gap - HEADER_SIZE) as u32).to_be_bytes());
            offset += gap;
        }
    }
    data
}

/// A [`BootHost`] with canned answers, recording every scheduled update.
pub struct FakeHost {
    latest: PathBuf,
    active: ActiveConfig,
    scheduled: Mutex<Vec<PathBuf>>,
}

impl FakeHost {
    pub fn new(latest: PathBuf, active_text: &str) -> Self {
        Self {
            latest,
            active: ActiveConfig {
                text: active_text.to_string(),
                source: "fake host".to_string(),
            },
            scheduled: Mutex::new(Vec::new()),
        }
    }

    pub fn scheduled(&self) -> Vec<PathBuf> {
        self.scheduled.lock().unwrap().clone()
    }
}

#[async_trait]
impl BootHost for FakeHost {
    async fn resolve_latest_image(&self) -> anyhow::Result<PathBuf> {
        Ok(self.latest.clone())
    }

    async fn schedule_update(&self, image: &Path) -> anyhow::Result<()> {
        self.scheduled.lock().unwrap().push(image.to_path_buf());
        Ok(())
    }

    async fn read_active_config(&self) -> anyhow::Result<ActiveConfig> {
        Ok(self.active.clone())
    }
}

use crate::core::BrowserTrait;
use crate::errors::{HarnessError, Result};
use std::path::{Path, PathBuf};

pub struct ScreenshotManager;

impl ScreenshotManager {
    pub async fn save_to_file<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        file_path: &Path,
    ) -> Result<()> {
        let screenshot_bytes = browser.take_screenshot(tab).await?;
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(file_path, screenshot_bytes)
            .await
            .map_err(HarnessError::IoError)?;
        Ok(())
    }

    /// `<dir>/<scenario>-<timestamp>.png`, with the scenario label reduced
    /// to characters that are safe in file names.
    pub fn artifact_path(dir: &Path, scenario: &str) -> PathBuf {
        let slug: String = scenario
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let slug = slug
            .split('-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
        dir.join(format!("{}-{}.png", slug, stamp))
    }
}

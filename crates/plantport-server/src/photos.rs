use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use image::RgbImage;
use tracing::info;

/// Directory holding the resized images that were sent to the classifier.
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create photo directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `plant_<YYYYmmdd_HHMMSS>_<size>.jpg`
    pub fn file_name(at: DateTime<Local>, size: u32) -> String {
        format!("plant_{}_{size}.jpg", at.format("%Y%m%d_%H%M%S"))
    }

    pub fn save(&self, image: &RgbImage) -> Result<PathBuf> {
        let name = Self::file_name(Local::now(), image.width());
        let mut path = self.dir.join(&name);

        // two scans within the same second
        let mut n = 1;
        while path.exists() {
            let stem = name.trim_end_matches(".jpg");
            path = self.dir.join(format!("{stem}-{n}.jpg"));
            n += 1;
        }

        image
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "saved classifier input");
        Ok(path)
    }
}

/// Sidecar text export
///
/// Saves a prompt next to its image, e.g. `00123.png` → `00123.txt`.
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};
use crate::state::data::ImageRecord;

/// Where the sidecar for an image goes (same folder, same stem, `.txt`)
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    image_path.with_extension("txt")
}

/// Write the record's prompt as UTF-8 text, replacing any existing sidecar
pub fn save_sidecar(record: &ImageRecord) -> Result<PathBuf> {
    let target = sidecar_path(record.path());
    fs::write(&target, record.prompt()).map_err(|e| Error::io(&target, e))?;

    info!("💾 Saved prompt to {}", target.display());
    Ok(target)
}

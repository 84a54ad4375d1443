/// Persistent application settings
///
/// Stored as JSON in the user's config directory:
/// - Linux: ~/.config/prompt-explorer/settings.json
/// - macOS: ~/Library/Application Support/prompt-explorer/settings.json
/// - Windows: %APPDATA%\prompt-explorer\settings.json
///
/// The settings object is created once at startup, handed to the
/// application, and written back explicitly whenever it changes.
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const MIN_COLUMNS: u32 = 1;
pub const MAX_COLUMNS: u32 = 10;
pub const DEFAULT_COLUMNS: u32 = 5;

pub const MIN_THUMBNAIL_SIZE: u32 = 64;
pub const MAX_THUMBNAIL_SIZE: u32 = 320;
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 160;

const APP_DIR: &str = "prompt-explorer";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Folder indexed at startup
    #[serde(deserialize_with = "lenient")]
    pub default_folder: PathBuf,

    /// Saved folders offered in the preset list
    #[serde(deserialize_with = "lenient")]
    pub presets: Vec<PathBuf>,

    /// Thumbnails per grid row
    #[serde(deserialize_with = "lenient_columns")]
    pub columns: u32,

    /// Thumbnail edge length in pixels
    #[serde(deserialize_with = "lenient_thumbnail_size")]
    pub thumbnail_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_folder: fallback_folder(),
            presets: Vec::new(),
            columns: DEFAULT_COLUMNS,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
        }
    }
}

impl Settings {
    /// Get the path where the settings file should be stored
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        path.push(APP_DIR);
        path.push(SETTINGS_FILE);
        path
    }

    /// Load settings, falling back to defaults when the file is missing or invalid
    pub fn load(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                if path.exists() {
                    warn!("⚠️  Could not read {}: {}", path.display(), e);
                } else {
                    debug!("No settings file at {}, using defaults", path.display());
                }
                return Self::default();
            }
        };

        match Self::from_json(&json) {
            Ok(settings) => {
                info!("📁 Settings loaded from {}", path.display());
                settings.sanitized()
            }
            Err(e) => {
                warn!("⚠️  {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings to disk, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        fs::write(path, self.to_json()?).map_err(|e| Error::io(path, e))?;
        debug!("💾 Settings saved to {}", path.display());
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Clamp display values into range and fill in an empty default folder
    pub fn sanitized(mut self) -> Self {
        self.columns = clamp_columns(self.columns);
        self.thumbnail_size = clamp_thumbnail_size(self.thumbnail_size);
        if self.default_folder.as_os_str().is_empty() {
            self.default_folder = fallback_folder();
        }
        self
    }

    pub fn set_default_folder(&mut self, folder: impl Into<PathBuf>) {
        self.default_folder = folder.into();
    }

    /// Add a preset; returns false if it was already present
    pub fn add_preset(&mut self, folder: impl Into<PathBuf>) -> bool {
        let folder = normalize(folder.into());
        if folder.as_os_str().is_empty() || self.presets.contains(&folder) {
            return false;
        }
        self.presets.push(folder);
        true
    }

    /// Remove a preset; returns false if it was not present
    pub fn remove_preset(&mut self, folder: &Path) -> bool {
        let folder = normalize(folder.to_path_buf());
        let before = self.presets.len();
        self.presets.retain(|preset| *preset != folder);
        self.presets.len() != before
    }
}

pub fn clamp_columns(columns: u32) -> u32 {
    columns.clamp(MIN_COLUMNS, MAX_COLUMNS)
}

pub fn clamp_thumbnail_size(size: u32) -> u32 {
    size.clamp(MIN_THUMBNAIL_SIZE, MAX_THUMBNAIL_SIZE)
}

/// Folder used when no usable default is configured
fn fallback_folder() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// A malformed field falls back on its own instead of failing the whole file
fn lenient_or<'de, D, T>(deserializer: D, fallback: T) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value.clone()).unwrap_or_else(|e| {
        warn!("⚠️  Ignoring settings value {}: {}", value, e);
        fallback
    }))
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    lenient_or(deserializer, T::default())
}

fn lenient_columns<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_or(deserializer, DEFAULT_COLUMNS)
}

fn lenient_thumbnail_size<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_or(deserializer, DEFAULT_THUMBNAIL_SIZE)
}

/// Drop trailing separators and `.` components so equal folders compare equal
fn normalize(folder: PathBuf) -> PathBuf {
    folder.components().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json"));
        assert_eq!(settings, Settings::default());
        assert!(!settings.default_folder.as_os_str().is_empty());
    }

    #[test]
    fn test_invalid_json_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.set_default_folder("/shots/nai");
        settings.add_preset("/shots/sd");
        settings.columns = 7;
        settings.thumbnail_size = 224;

        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn test_camel_case_schema_with_missing_fields() {
        let settings =
            Settings::from_json(r#"{ "defaultFolder": "/shots", "presets": ["/a", "/b"] }"#)
                .unwrap();
        assert_eq!(settings.default_folder, PathBuf::from("/shots"));
        assert_eq!(settings.presets, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(settings.columns, DEFAULT_COLUMNS);
        assert_eq!(settings.thumbnail_size, DEFAULT_THUMBNAIL_SIZE);

        let json = settings.to_json().unwrap();
        assert!(json.contains("\"defaultFolder\""));
        assert!(json.contains("\"thumbnailSize\""));
    }

    #[test]
    fn test_load_clamps_display_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "defaultFolder": "", "columns": 0, "thumbnailSize": 4096 }"#)
            .unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.columns, MIN_COLUMNS);
        assert_eq!(settings.thumbnail_size, MAX_THUMBNAIL_SIZE);
        assert!(!settings.default_folder.as_os_str().is_empty());
    }

    #[test]
    fn test_malformed_field_keeps_the_rest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "defaultFolder": "/shots/nai", "presets": "oops", "columns": 3 }"#,
        )
        .unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.default_folder, PathBuf::from("/shots/nai"));
        assert!(settings.presets.is_empty());
        assert_eq!(settings.columns, 3);
    }

    #[test]
    fn test_malformed_values_fall_back_per_field() {
        let settings = Settings::from_json(
            r#"{ "defaultFolder": 42, "presets": ["/a"], "columns": "many", "thumbnailSize": -1 }"#,
        )
        .unwrap()
        .sanitized();

        assert_eq!(settings.presets, vec![PathBuf::from("/a")]);
        assert_eq!(settings.columns, DEFAULT_COLUMNS);
        assert_eq!(settings.thumbnail_size, DEFAULT_THUMBNAIL_SIZE);
        assert!(!settings.default_folder.as_os_str().is_empty());
    }

    #[test]
    fn test_presets_are_deduplicated() {
        let mut settings = Settings::default();
        assert!(settings.add_preset("/shots/nai"));
        assert!(!settings.add_preset("/shots/nai/"));
        assert!(!settings.add_preset(""));
        assert_eq!(settings.presets.len(), 1);
    }

    #[test]
    fn test_remove_preset() {
        let mut settings = Settings::default();
        settings.add_preset("/shots/nai");
        settings.add_preset("/shots/sd");

        assert!(settings.remove_preset(Path::new("/shots/nai/")));
        assert!(!settings.remove_preset(Path::new("/shots/other")));
        assert_eq!(settings.presets, vec![PathBuf::from("/shots/sd")]);
    }
}

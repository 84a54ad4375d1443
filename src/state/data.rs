/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the index builder, the search engine and the UI layer.
use std::path::{Path, PathBuf};

/// A single PNG in the prompt index
///
/// Records are created while building an index and never change afterwards.
/// A re-index throws every record away and builds new ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Full path to the PNG (unique within one index)
    path: PathBuf,
    /// Embedded prompt text, empty when the file has none
    prompt: String,
    /// Lowercased prompt, used by case-insensitive searches
    folded: String,
}

impl ImageRecord {
    pub fn new(path: impl Into<PathBuf>, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        let folded = prompt.to_lowercase();
        Self {
            path: path.into(),
            prompt,
            folded,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub(crate) fn folded_prompt(&self) -> &str {
        &self.folded
    }

    /// Filename only (e.g., "00123.png")
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    pub fn has_prompt(&self) -> bool {
        !self.prompt.is_empty()
    }
}

use std::path::{Path, PathBuf};

use iced::futures::{SinkExt, Stream};
use log::{debug, info, warn};
use tokio::task;
use walkdir::WalkDir;

use super::data::ImageRecord;
use crate::error::{Error, Result};
use crate::prompt::reader::{self, PromptRead};

/// Extensions that are indexed (compared case-insensitively)
const IMAGE_EXTENSIONS: [&str; 1] = ["png"];

/// Progress is reported after this many files (and after the last one)
pub const PROGRESS_INTERVAL: usize = 25;

/// Room for progress events not yet picked up by the UI
const PROGRESS_BUFFER: usize = 16;

/// The PromptIndex holds every PNG of one folder together with its prompt.
///
/// An index is a snapshot: it is built in one go from a directory listing
/// and never modified afterwards. Switching folders or reloading builds a
/// new index that replaces this one.
#[derive(Debug, Clone, Default)]
pub struct PromptIndex {
    folder: PathBuf,
    records: Vec<ImageRecord>,
}

/// Events of a background scan, in the order they are produced
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// `done` of `total` files have been read
    Progress { done: usize, total: usize },
    /// The scan is over; errors are flattened to strings for `Clone` messages
    Finished(std::result::Result<PromptIndex, String>),
}

impl PromptIndex {
    /// Scan `folder` (non-recursively) and read the prompt of every PNG.
    ///
    /// Files are visited in file-name order. A file whose metadata cannot be
    /// read still gets a record, with an empty prompt.
    pub fn build(folder: &Path) -> Result<Self> {
        Self::build_with_progress(folder, |_, _| {})
    }

    /// Same as `build`, calling `progress(done, total)` every
    /// `PROGRESS_INTERVAL` files and once more for the last file
    pub fn build_with_progress(
        folder: &Path,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<Self> {
        if !folder.is_dir() {
            return Err(Error::FolderNotFound(folder.to_path_buf()));
        }

        info!("🔍 Scanning folder: {}", folder.display());

        let paths = list_images(folder);
        let total = paths.len();
        debug!("Found {} PNG files", total);

        let mut records = Vec::with_capacity(total);
        let mut without_prompt = 0usize;

        for path in paths {
            let prompt = match reader::read_prompt(&path) {
                Ok(PromptRead::Parsed(text)) => text,
                Ok(PromptRead::NoMetadata) => {
                    without_prompt += 1;
                    String::new()
                }
                Ok(PromptRead::NotAnImage) => {
                    warn!("⚠️  Not a readable PNG: {}", path.display());
                    without_prompt += 1;
                    String::new()
                }
                Err(e) => {
                    warn!("⚠️  {}", e);
                    without_prompt += 1;
                    String::new()
                }
            };

            records.push(ImageRecord::new(path, prompt));

            let done = records.len();
            if done % PROGRESS_INTERVAL == 0 || done == total {
                progress(done, total);
            }
        }

        info!(
            "✅ Indexed {} images ({} without prompt) in {}",
            records.len(),
            without_prompt,
            folder.display()
        );

        Ok(Self {
            folder: folder.to_path_buf(),
            records,
        })
    }

    #[cfg(test)]
    pub fn from_records(folder: PathBuf, records: Vec<ImageRecord>) -> Self {
        Self { folder, records }
    }

    /// The folder this index was built from
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&ImageRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Direct children of `folder` with an indexed extension, sorted by file name
fn list_images(folder: &Path) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("⚠️  Skipping unreadable entry in {}: {}", folder.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_indexed_image(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Check if a path has an indexed image extension
pub fn is_indexed_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Build an index on the blocking pool, streaming progress while it runs.
///
/// The last item is always `ScanEvent::Finished`. Progress events are
/// dropped rather than blocking the scan when the UI falls behind.
pub fn index_stream(folder: PathBuf) -> impl Stream<Item = ScanEvent> {
    iced::stream::channel(PROGRESS_BUFFER, move |mut output| async move {
        let mut progress = output.clone();

        let result = task::spawn_blocking(move || {
            PromptIndex::build_with_progress(&folder, |done, total| {
                let _ = progress.try_send(ScanEvent::Progress { done, total });
            })
        })
        .await
        .map_err(|e| Error::TaskJoin(e.to_string()).to_string())
        .and_then(|built| built.map_err(|e| e.to_string()));

        if output.send(ScanEvent::Finished(result)).await.is_err() {
            debug!("Scan result dropped, nobody is listening");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::search::{SearchMode, SearchQuery};
    use crate::test_support::{write_png, TextChunk};
    use iced::futures::StreamExt;
    use std::fs;
    use tempfile::tempdir;

    /// a.png has a prompt, b.png has an empty one, c.png has no metadata
    fn scenario_folder() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        write_png(
            &dir.path().join("a.png"),
            &[TextChunk::Plain("prompt", "sky, tree, 1girl")],
        );
        write_png(&dir.path().join("b.png"), &[TextChunk::Plain("prompt", "")]);
        write_png(&dir.path().join("c.png"), &[]);
        dir
    }

    fn names(index: &PromptIndex) -> Vec<String> {
        index.records().iter().map(|r| r.file_name()).collect()
    }

    #[test]
    fn test_build_reads_prompts_in_name_order() {
        let dir = scenario_folder();
        let index = PromptIndex::build(dir.path()).unwrap();

        assert_eq!(index.folder(), dir.path());
        assert_eq!(names(&index), vec!["a.png", "b.png", "c.png"]);
        assert_eq!(index.get(0).unwrap().prompt(), "sky, tree, 1girl");
        assert_eq!(index.get(1).unwrap().prompt(), "");
        assert_eq!(index.get(2).unwrap().prompt(), "");
    }

    #[test]
    fn test_scenario_queries() {
        let dir = scenario_folder();
        let index = PromptIndex::build(dir.path()).unwrap();

        let hits = |raw: &str, mode| {
            let result = index.search(&SearchQuery::new(raw, mode));
            result.records(&index).map(|r| r.file_name()).collect::<Vec<_>>()
        };

        assert_eq!(hits("tree", SearchMode::Exact), vec!["a.png"]);
        assert_eq!(hits("tree,1girl", SearchMode::AndTags), vec!["a.png"]);
        assert_eq!(hits("", SearchMode::Exact), vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_skips_other_files_and_subfolders() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("keep.PNG"), &[TextChunk::Plain("prompt", "x")]);
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        write_png(
            &dir.path().join("nested").join("deep.png"),
            &[TextChunk::Plain("prompt", "deep")],
        );

        let index = PromptIndex::build(dir.path()).unwrap();
        assert_eq!(names(&index), vec!["keep.PNG"]);
    }

    #[test]
    fn test_corrupt_file_does_not_stop_scan() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"definitely not a png").unwrap();
        write_png(&dir.path().join("b.png"), &[TextChunk::Plain("prompt", "ok")]);

        let index = PromptIndex::build(dir.path()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(0).unwrap().prompt(), "");
        assert_eq!(index.get(1).unwrap().prompt(), "ok");
    }

    #[test]
    fn test_reindex_drops_deleted_files() {
        let dir = scenario_folder();
        let before = PromptIndex::build(dir.path()).unwrap();
        assert_eq!(before.len(), 3);

        fs::remove_file(dir.path().join("a.png")).unwrap();
        let after = PromptIndex::build(dir.path()).unwrap();

        let result = after.search(&SearchQuery::new("tree", SearchMode::Exact));
        assert!(result.is_empty());
        assert_eq!(names(&after), vec!["b.png", "c.png"]);
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");
        assert!(matches!(
            PromptIndex::build(&missing),
            Err(Error::FolderNotFound(path)) if path == missing
        ));
    }

    #[test]
    fn test_empty_folder() {
        let dir = tempdir().unwrap();
        let index = PromptIndex::build(dir.path()).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_progress_every_interval_and_at_end() {
        let dir = tempdir().unwrap();
        for i in 0..(PROGRESS_INTERVAL * 2 + 3) {
            write_png(&dir.path().join(format!("{:03}.png", i)), &[]);
        }

        let mut reports = Vec::new();
        let index =
            PromptIndex::build_with_progress(dir.path(), |done, total| reports.push((done, total)))
                .unwrap();

        assert_eq!(index.len(), 53);
        assert_eq!(reports, vec![(25, 53), (50, 53), (53, 53)]);
    }

    #[test]
    fn test_no_progress_for_empty_folder() {
        let dir = tempdir().unwrap();
        let mut calls = 0;
        PromptIndex::build_with_progress(dir.path(), |_, _| calls += 1).unwrap();
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_index_stream_ends_with_index() {
        let dir = scenario_folder();
        let events: Vec<ScanEvent> = index_stream(dir.path().to_path_buf()).collect().await;

        assert!(matches!(
            events.first(),
            Some(ScanEvent::Progress { done: 3, total: 3 })
        ));
        match events.last() {
            Some(ScanEvent::Finished(Ok(index))) => assert_eq!(index.len(), 3),
            other => panic!("unexpected last event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_index_stream_reports_missing_folder() {
        let dir = tempdir().unwrap();
        let events: Vec<ScanEvent> = index_stream(dir.path().join("missing")).collect().await;

        assert_eq!(events.len(), 1);
        match &events[0] {
            ScanEvent::Finished(Err(e)) => assert!(e.contains("Folder not found")),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

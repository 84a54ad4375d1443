use image::imageops::FilterType;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::task;

use crate::error::{Error, Result};

/// Maximum number of thumbnails kept in memory
pub const CACHE_CAPACITY: usize = 256;

/// Fill color for files that cannot be decoded
const PLACEHOLDER_RGBA: [u8; 4] = [60, 60, 60, 255];

/// A decoded thumbnail as a tightly packed RGBA8 buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Thumbnail {
    /// Solid grey square shown in place of an undecodable image
    pub fn placeholder(size: u32) -> Self {
        let size = size.max(1);
        let pixels = PLACEHOLDER_RGBA
            .iter()
            .copied()
            .cycle()
            .take((size * size * 4) as usize)
            .collect();

        Self {
            width: size,
            height: size,
            pixels,
        }
    }
}

/// Decode an image and shrink it to fit a `size` x `size` box
pub fn render_thumbnail(path: &Path, size: u32) -> Result<Thumbnail> {
    let img = image::open(path).map_err(|source| Error::Thumbnail {
        path: path.to_path_buf(),
        source,
    })?;

    // Resize maintaining aspect ratio
    let thumb = img.resize(size, size, FilterType::Lanczos3).to_rgba8();

    Ok(Thumbnail {
        width: thumb.width(),
        height: thumb.height(),
        pixels: thumb.into_raw(),
    })
}

/// Render a thumbnail on the blocking pool
///
/// Never fails: decode errors fall back to a placeholder tile.
pub async fn load_thumbnail(path: PathBuf, size: u32) -> Thumbnail {
    let result = task::spawn_blocking(move || render_thumbnail(&path, size)).await;

    match result {
        Ok(Ok(thumbnail)) => thumbnail,
        Ok(Err(e)) => {
            warn!("⚠️  {}", e);
            Thumbnail::placeholder(size)
        }
        Err(e) => {
            warn!("⚠️  {}", Error::TaskJoin(e.to_string()));
            Thumbnail::placeholder(size)
        }
    }
}

/// Cache key: one entry per file and thumbnail size
pub type ThumbnailKey = (PathBuf, u32);

/// Least-recently-used cache of rendered thumbnails
///
/// Also remembers which keys are currently being rendered so the same
/// thumbnail is never requested twice.
#[derive(Debug)]
pub struct ThumbnailCache<T> {
    capacity: usize,
    entries: HashMap<ThumbnailKey, (T, u64)>,
    pending: HashSet<ThumbnailKey>,
    clock: u64,
}

impl<T> ThumbnailCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            pending: HashSet::new(),
            clock: 0,
        }
    }

    /// Look up a thumbnail without touching its recency
    pub fn peek(&self, path: &Path, size: u32) -> Option<&T> {
        self.entries
            .get(&(path.to_path_buf(), size))
            .map(|(value, _)| value)
    }

    /// Returns true if the caller should start rendering this key.
    /// The key is then tracked as pending until `insert` is called.
    /// A cached key is marked as recently used instead.
    pub fn request(&mut self, path: &Path, size: u32) -> bool {
        let key = (path.to_path_buf(), size);
        self.clock += 1;
        if let Some((_, used)) = self.entries.get_mut(&key) {
            *used = self.clock;
            return false;
        }
        if self.pending.contains(&key) {
            return false;
        }
        self.pending.insert(key);
        true
    }

    pub fn insert(&mut self, path: PathBuf, size: u32, value: T) {
        let key = (path, size);
        self.pending.remove(&key);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        self.clock += 1;
        self.entries.insert(key, (value, self.clock));
    }

    /// Drop every thumbnail and forget pending requests
    pub fn clear(&mut self) {
        if !self.is_empty() {
            debug!("🧹 Clearing {} cached thumbnails", self.entries.len());
        }
        self.entries.clear();
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, (_, used))| *used)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

/// PNG prompt metadata reader
///
/// Image generators store their prompt in PNG text chunks:
/// - `tEXt` (Latin-1, uncompressed)
/// - `zTXt` (Latin-1, zlib-compressed)
/// - `iTXt` (UTF-8, optionally compressed)
///
/// Text chunks may sit before or after the image data. The rest of the
/// stream is walked to the end chunk, but pixels are never unfiltered.
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::Path;

use log::{debug, warn};

use crate::error::{Error, Result};

/// Every PNG starts with these 8 bytes
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Keywords whose values are shown first, in this order
const PRIORITY_KEYWORDS: [&str; 4] = ["prompt", "parameters", "description", "comment"];

/// Separator between the collected text values
const VALUE_SEPARATOR: &str = "\n\n";

/// Outcome of reading one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptRead {
    /// The PNG carries text; values joined in display order
    Parsed(String),
    /// A valid PNG without any non-empty text chunk
    NoMetadata,
    /// Not a PNG, or a PNG too damaged to decode
    NotAnImage,
}

/// Read the embedded prompt text of a PNG file
pub fn read_prompt(path: &Path) -> Result<PromptRead> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut stream = BufReader::new(file);

    let mut signature = [0u8; 8];
    match stream.read_exact(&mut signature) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(PromptRead::NotAnImage),
        Err(e) => return Err(Error::io(path, e)),
    }
    if signature != PNG_SIGNATURE {
        return Ok(PromptRead::NotAnImage);
    }

    // Hand the signature back to the decoder in front of the rest of the stream
    let decoder = png::Decoder::new(Cursor::new(signature).chain(stream));
    let mut png_reader = match decoder.read_info() {
        Ok(reader) => reader,
        Err(e) => {
            debug!("PNG header decode failed for {}: {}", path.display(), e);
            return Ok(PromptRead::NotAnImage);
        }
    };

    // Picks up text chunks placed after IDAT; the header chunks stay usable on failure
    if let Err(e) = png_reader.finish() {
        debug!("Trailing chunks unreadable in {}: {}", path.display(), e);
    }

    let entries = collect_text_entries(png_reader.info(), path);
    let text = assemble_text(&entries);

    if text.is_empty() {
        Ok(PromptRead::NoMetadata)
    } else {
        Ok(PromptRead::Parsed(text))
    }
}

/// Collect (keyword, value) pairs from every text chunk type
fn collect_text_entries(info: &png::Info, path: &Path) -> Vec<(String, String)> {
    let mut entries = Vec::new();

    for chunk in &info.uncompressed_latin1_text {
        entries.push((chunk.keyword.clone(), chunk.text.clone()));
    }

    for chunk in &info.compressed_latin1_text {
        match chunk.get_text() {
            Ok(text) => entries.push((chunk.keyword.clone(), text)),
            Err(e) => warn!(
                "⚠️  Skipping zTXt '{}' in {}: {}",
                chunk.keyword,
                path.display(),
                e
            ),
        }
    }

    for chunk in &info.utf8_text {
        match chunk.get_text() {
            Ok(text) => entries.push((chunk.keyword.clone(), text)),
            Err(e) => warn!(
                "⚠️  Skipping iTXt '{}' in {}: {}",
                chunk.keyword,
                path.display(),
                e
            ),
        }
    }

    entries
}

/// Order, de-duplicate and join text values
///
/// Values under a priority keyword come first (in `PRIORITY_KEYWORDS` order),
/// everything else follows in the order given. Values are trimmed; empty
/// values and repeats of an earlier value are dropped.
pub(crate) fn assemble_text(entries: &[(String, String)]) -> String {
    let is_priority = |keyword: &str| {
        PRIORITY_KEYWORDS
            .iter()
            .any(|p| p.eq_ignore_ascii_case(keyword))
    };

    let prioritized = PRIORITY_KEYWORDS.iter().flat_map(|priority| {
        entries
            .iter()
            .filter(move |(keyword, _)| priority.eq_ignore_ascii_case(keyword))
    });
    let remaining = entries.iter().filter(|(keyword, _)| !is_priority(keyword.as_str()));

    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for (_, value) in prioritized.chain(remaining) {
        let value = value.trim();
        if !value.is_empty() && seen.insert(value) {
            values.push(value);
        }
    }

    values.join(VALUE_SEPARATOR)
}

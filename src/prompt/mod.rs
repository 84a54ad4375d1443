/// PNG prompt handling module
///
/// This module handles:
/// - Reading prompt text from PNG text chunks
/// - Generating and caching thumbnails
/// - Exporting prompts to sidecar text files

pub mod reader;
pub mod thumbnail;
pub mod export;

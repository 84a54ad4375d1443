/// State management module
///
/// This module handles all application state, including:
/// - The prompt index for the current folder (library.rs)
/// - Shared data structures (data.rs)
/// - Searching the index (search.rs)
/// - Persistent settings (settings.rs)

pub mod library;
pub mod data;
pub mod search;
pub mod settings;

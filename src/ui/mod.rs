/// UI building blocks
///
/// - `grid.rs` - thumbnail grid layout, lazy loading window and selection
/// - `prompt_pane.rs` - full prompt display with sidecar export

pub mod grid;
pub mod prompt_pane;

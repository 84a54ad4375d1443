/// Thumbnail grid: layout math, selection and the grid widget
///
/// Only entries whose rows are near the viewport get a real thumbnail;
/// everything else is drawn as an empty tile of the same size so the
/// scroll height stays stable while thumbnails stream in.
use std::ops::Range;

use iced::widget::image::{Handle, Image};
use iced::widget::{button, column, container, row, scrollable, text, Space};
use iced::{Alignment, ContentFit, Element, Length, Theme};

use crate::prompt::thumbnail::ThumbnailCache;
use crate::state::library::PromptIndex;
use crate::state::search::SearchResult;
use crate::state::settings::{
    clamp_columns, clamp_thumbnail_size, DEFAULT_COLUMNS, DEFAULT_THUMBNAIL_SIZE,
};
use crate::Message;

/// Gap between cells and between rows
pub const CELL_SPACING: f32 = 8.0;
/// Padding inside each cell button
pub const CELL_PADDING: f32 = 4.0;
/// Height reserved for the file name under a thumbnail
pub const LABEL_HEIGHT: f32 = 20.0;
/// Pixels added or removed per Ctrl + wheel notch
pub const SIZE_STEP: u32 = 16;
/// Smallest extra band above and below the viewport that is preloaded
const MIN_PRELOAD_MARGIN: f32 = 128.0;

/// Grid geometry: how many columns and how large each thumbnail is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    columns: u32,
    thumbnail_size: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMNS, DEFAULT_THUMBNAIL_SIZE)
    }
}

impl GridLayout {
    pub fn new(columns: u32, thumbnail_size: u32) -> Self {
        Self {
            columns: clamp_columns(columns),
            thumbnail_size: clamp_thumbnail_size(thumbnail_size),
        }
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn thumbnail_size(&self) -> u32 {
        self.thumbnail_size
    }

    /// Returns true if the column count changed
    pub fn set_columns(&mut self, columns: u32) -> bool {
        let columns = clamp_columns(columns);
        let changed = columns != self.columns;
        self.columns = columns;
        changed
    }

    /// Returns true if the thumbnail size changed
    pub fn set_thumbnail_size(&mut self, size: u32) -> bool {
        let size = clamp_thumbnail_size(size);
        let changed = size != self.thumbnail_size;
        self.thumbnail_size = size;
        changed
    }

    /// Grow (positive) or shrink (negative) by whole `SIZE_STEP`s
    pub fn step_thumbnail_size(&mut self, steps: i32) -> bool {
        let delta = steps.unsigned_abs().saturating_mul(SIZE_STEP);
        let size = if steps >= 0 {
            self.thumbnail_size.saturating_add(delta)
        } else {
            self.thumbnail_size.saturating_sub(delta)
        };
        self.set_thumbnail_size(size)
    }

    /// Height of one grid row including spacing
    pub fn row_height(&self) -> f32 {
        self.thumbnail_size as f32 + LABEL_HEIGHT + 2.0 * CELL_PADDING + CELL_SPACING
    }

    pub fn rows(&self, len: usize) -> usize {
        len.div_ceil(self.columns as usize)
    }

    /// Positions (into the result list) whose rows are within the viewport
    /// plus a preload margin of `max(128, size)` pixels on both sides
    pub fn visible_range(&self, scroll_y: f32, viewport_height: f32, len: usize) -> Range<usize> {
        if len == 0 {
            return 0..0;
        }

        let margin = MIN_PRELOAD_MARGIN.max(self.thumbnail_size as f32);
        let row_height = self.row_height();
        let top = (scroll_y - margin).max(0.0);
        let bottom = (scroll_y + viewport_height.max(0.0) + margin).max(0.0);

        let rows = self.rows(len);
        let first_row = ((top / row_height).floor() as usize).min(rows);
        let end_row = ((bottom / row_height).ceil() as usize).clamp(first_row, rows);

        let columns = self.columns as usize;
        (first_row * columns).min(len)..(end_row * columns).min(len)
    }
}

/// The selected record, as an index into the `PromptIndex`
///
/// A selection only ever points at an entry of the current search result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    index: Option<usize>,
}

impl Selection {
    pub fn current(&self) -> Option<usize> {
        self.index
    }

    /// Select `index` if it is part of `result`; returns true on success
    pub fn select(&mut self, index: usize, result: &SearchResult) -> bool {
        if !result.contains(index) {
            return false;
        }
        self.index = Some(index);
        true
    }

    /// Move to the first hit, or to nothing when there are no hits
    pub fn select_first(&mut self, result: &SearchResult) {
        self.index = result.get(0);
    }

    pub fn clear(&mut self) {
        self.index = None;
    }
}

/// Identifier of the grid's scrollable, used to jump back to the top
pub fn grid_scroll_id() -> scrollable::Id {
    scrollable::Id::new("thumbnail-grid")
}

/// Build the scrollable thumbnail grid for the current search result
pub fn thumbnail_grid<'a>(
    index: &'a PromptIndex,
    result: &'a SearchResult,
    layout: GridLayout,
    selection: Selection,
    visible: Range<usize>,
    thumbnails: &ThumbnailCache<Handle>,
) -> Element<'a, Message> {
    if result.is_empty() {
        return container(text("No matching images").size(14))
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into();
    }

    let size = layout.thumbnail_size();
    let edge = Length::Fixed(size as f32);
    let columns = layout.columns() as usize;

    let mut rows = column![].spacing(CELL_SPACING).padding(CELL_SPACING);

    for (row_number, chunk) in result.indices().chunks(columns).enumerate() {
        let mut cells = row![].spacing(CELL_SPACING);

        for (offset, &record_index) in chunk.iter().enumerate() {
            let Some(record) = index.get(record_index) else {
                continue;
            };
            let position = row_number * columns + offset;

            let handle = if visible.contains(&position) {
                thumbnails.peek(record.path(), size)
            } else {
                None
            };

            let picture: Element<'a, Message> = match handle {
                Some(handle) => Image::new(handle.clone())
                    .width(edge)
                    .height(edge)
                    .content_fit(ContentFit::Contain)
                    .into(),
                None => container(Space::new(edge, edge))
                    .style(container::rounded_box)
                    .into(),
            };

            let label = container(text(record.file_name()).size(12))
                .width(edge)
                .height(Length::Fixed(LABEL_HEIGHT))
                .center_x(edge)
                .clip(true);

            let style: fn(&Theme, button::Status) -> button::Style =
                if selection.current() == Some(record_index) {
                    button::primary
                } else {
                    button::text
                };

            let cell = button(column![picture, label].align_x(Alignment::Center))
                .padding(CELL_PADDING)
                .style(style)
                .on_press(Message::SelectEntry(record_index));

            cells = cells.push(cell);
        }

        rows = rows.push(cells);
    }

    scrollable(rows)
        .id(grid_scroll_id())
        .on_scroll(Message::GridScrolled)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::ImageRecord;
    use crate::state::search::{SearchMode, SearchQuery};
    use crate::state::settings::{MAX_COLUMNS, MAX_THUMBNAIL_SIZE, MIN_THUMBNAIL_SIZE};
    use std::path::PathBuf;

    #[test]
    fn test_layout_clamps() {
        let layout = GridLayout::new(0, 10_000);
        assert_eq!(layout.columns(), 1);
        assert_eq!(layout.thumbnail_size(), MAX_THUMBNAIL_SIZE);

        let mut layout = GridLayout::default();
        assert!(layout.set_columns(99));
        assert_eq!(layout.columns(), MAX_COLUMNS);
        assert!(!layout.set_columns(MAX_COLUMNS));
    }

    #[test]
    fn test_step_thumbnail_size() {
        let mut layout = GridLayout::new(5, 160);
        assert!(layout.step_thumbnail_size(1));
        assert_eq!(layout.thumbnail_size(), 176);
        assert!(layout.step_thumbnail_size(-2));
        assert_eq!(layout.thumbnail_size(), 144);

        let mut small = GridLayout::new(5, MIN_THUMBNAIL_SIZE);
        assert!(!small.step_thumbnail_size(-1));
        assert_eq!(small.thumbnail_size(), MIN_THUMBNAIL_SIZE);
    }

    #[test]
    fn test_visible_range_at_top() {
        // row height = 160 + 20 + 8 + 8 = 196, margin = 160
        let layout = GridLayout::new(5, 160);
        assert_eq!(layout.row_height(), 196.0);

        // 0..560px covers rows 0, 1, 2
        assert_eq!(layout.visible_range(0.0, 400.0, 100), 0..15);
    }

    #[test]
    fn test_visible_range_scrolled() {
        let layout = GridLayout::new(5, 160);
        // 840..1560px covers rows 4 through 7
        assert_eq!(layout.visible_range(1000.0, 400.0, 100), 20..40);
    }

    #[test]
    fn test_visible_range_clamps_to_len() {
        let layout = GridLayout::new(4, 64);
        assert_eq!(layout.visible_range(0.0, 10_000.0, 6), 0..6);
        assert_eq!(layout.visible_range(50_000.0, 400.0, 6), 6..6);
        assert_eq!(layout.visible_range(0.0, 400.0, 0), 0..0);
    }

    fn sample() -> (PromptIndex, SearchResult) {
        let index = PromptIndex::from_records(
            PathBuf::from("/shots"),
            vec![
                ImageRecord::new("/shots/a.png", "sky"),
                ImageRecord::new("/shots/b.png", "sea"),
                ImageRecord::new("/shots/c.png", "sky, sea"),
            ],
        );
        let result = index.search(&SearchQuery::new("sky", SearchMode::Exact));
        (index, result)
    }

    #[test]
    fn test_selection_stays_inside_result() {
        let (_, result) = sample();
        let mut selection = Selection::default();

        assert!(selection.select(2, &result));
        assert_eq!(selection.current(), Some(2));

        // b.png is not a hit
        assert!(!selection.select(1, &result));
        assert_eq!(selection.current(), Some(2));
    }

    #[test]
    fn test_select_first() {
        let (index, result) = sample();
        let mut selection = Selection::default();
        selection.select_first(&result);
        assert_eq!(selection.current(), Some(0));

        let empty = index.search(&SearchQuery::new("forest", SearchMode::Exact));
        selection.select_first(&empty);
        assert_eq!(selection.current(), None);
    }
}

use iced::widget::image::Handle;
use iced::widget::pane_grid::{self, PaneGrid};
use iced::widget::{
    button, checkbox, column, container, horizontal_space, pick_list, radio, row, scrollable,
    slider, text, text_editor, text_input,
};
use iced::{event, keyboard, mouse, Alignment, Element, Event, Length, Subscription, Task, Theme};
use log::{debug, info, warn};
use rfd::FileDialog;
use std::path::PathBuf;

mod error;
mod prompt;
mod state;
mod ui;

#[cfg(test)]
mod test_support;

use prompt::export::save_sidecar;
use prompt::thumbnail::{load_thumbnail, Thumbnail, ThumbnailCache, CACHE_CAPACITY};
use state::data::ImageRecord;
use state::library::{index_stream, PromptIndex, ScanEvent};
use state::search::{SearchMode, SearchQuery, SearchResult};
use state::settings::{Settings, MAX_COLUMNS, MAX_THUMBNAIL_SIZE, MIN_COLUMNS, MIN_THUMBNAIL_SIZE};
use ui::grid::{grid_scroll_id, GridLayout, Selection, SIZE_STEP};

/// Viewport height assumed until the grid reports its real size
const INITIAL_VIEWPORT_HEIGHT: f32 = 800.0;

/// The two sides of the split view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Thumbnails,
    Prompt,
}

/// Main application state
struct PromptExplorer {
    /// Persistent settings and where they live
    settings: Settings,
    settings_path: PathBuf,
    /// Snapshot of the current folder
    index: PromptIndex,
    /// Hits of the last search against `index`
    result: SearchResult,
    /// Bumped for every scan so late results of older scans are dropped
    scan_generation: u64,
    indexing: bool,

    query_input: String,
    mode: SearchMode,
    case_sensitive: bool,
    folder_input: String,
    selected_preset: Option<String>,

    layout: GridLayout,
    selection: Selection,
    thumbnails: ThumbnailCache<Handle>,
    scroll_y: f32,
    viewport_height: f32,
    modifiers: keyboard::Modifiers,

    panes: pane_grid::State<Pane>,
    prompt_content: text_editor::Content,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    QueryChanged(String),
    ModeSelected(SearchMode),
    CaseSensitiveToggled(bool),
    /// Search button or Enter in the search box
    Search,
    ResetSearch,

    FolderInputChanged(String),
    /// Reload button or Enter in the folder box
    LoadFolder,
    BrowseFolder,
    /// Background scan progress (generation, done, total)
    IndexProgress(u64, usize, usize),
    /// Background scan finished (generation, index)
    IndexBuilt(u64, Result<PromptIndex, String>),
    SetDefaultFolder,
    AddPreset,
    RemovePreset,
    PresetSelected(String),

    ColumnsChanged(u32),
    ThumbnailSizeChanged(u32),
    /// Slider released: persist display settings
    DisplayCommitted,
    ModifiersChanged(keyboard::Modifiers),
    WheelScrolled(mouse::ScrollDelta),
    GridScrolled(scrollable::Viewport),
    ThumbnailLoaded(PathBuf, u32, Thumbnail),

    SelectEntry(usize),
    PromptAction(text_editor::Action),
    ExportPrompt,
    PaneResized(pane_grid::ResizeEvent),
}

impl PromptExplorer {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let settings_path = Settings::default_path();
        let settings = Settings::load(&settings_path);
        Self::with_settings(settings, settings_path)
    }

    /// Build the application around an explicit settings object and
    /// start indexing its default folder
    fn with_settings(settings: Settings, settings_path: PathBuf) -> (Self, Task<Message>) {
        let layout = GridLayout::new(settings.columns, settings.thumbnail_size);
        let default_folder = settings.default_folder.clone();

        let panes = pane_grid::State::with_configuration(pane_grid::Configuration::Split {
            axis: pane_grid::Axis::Vertical,
            ratio: 0.6,
            a: Box::new(pane_grid::Configuration::Pane(Pane::Thumbnails)),
            b: Box::new(pane_grid::Configuration::Pane(Pane::Prompt)),
        });

        let mut app = PromptExplorer {
            settings,
            settings_path,
            index: PromptIndex::default(),
            result: SearchResult::default(),
            scan_generation: 0,
            indexing: false,
            query_input: String::new(),
            mode: SearchMode::Exact,
            case_sensitive: false,
            folder_input: default_folder.display().to_string(),
            selected_preset: None,
            layout,
            selection: Selection::default(),
            thumbnails: ThumbnailCache::new(CACHE_CAPACITY),
            scroll_y: 0.0,
            viewport_height: INITIAL_VIEWPORT_HEIGHT,
            modifiers: keyboard::Modifiers::default(),
            panes,
            prompt_content: text_editor::Content::new(),
            status: "Ready.".to_string(),
        };

        info!("🎨 Prompt Explorer starting in {}", default_folder.display());
        let task = app.start_indexing(default_folder);
        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::QueryChanged(query) => {
                self.query_input = query;
                Task::none()
            }
            Message::ModeSelected(mode) => {
                self.mode = mode;
                self.apply_search()
            }
            Message::CaseSensitiveToggled(case_sensitive) => {
                self.case_sensitive = case_sensitive;
                self.apply_search()
            }
            Message::Search => self.apply_search(),
            Message::ResetSearch => {
                self.query_input.clear();
                self.mode = SearchMode::Exact;
                self.apply_search()
            }

            Message::FolderInputChanged(folder) => {
                self.folder_input = folder;
                Task::none()
            }
            Message::LoadFolder => {
                let folder = PathBuf::from(self.folder_input.trim());
                self.start_indexing(folder)
            }
            Message::BrowseFolder => {
                // Show the native folder picker dialog
                let mut dialog = FileDialog::new().set_title("Select Folder with PNG Images");
                if self.index.folder().is_dir() {
                    dialog = dialog.set_directory(self.index.folder());
                }

                match dialog.pick_folder() {
                    Some(folder) => self.start_indexing(folder),
                    None => Task::none(),
                }
            }
            Message::IndexProgress(generation, done, total) => {
                if generation == self.scan_generation && self.indexing {
                    self.status = format!("⏳ Indexing... {}/{}", done, total);
                }
                Task::none()
            }
            Message::IndexBuilt(generation, result) => {
                if generation != self.scan_generation {
                    debug!("Dropping stale scan #{} (current #{})", generation, self.scan_generation);
                    return Task::none();
                }
                self.indexing = false;

                match result {
                    Ok(index) => {
                        self.status = if index.is_empty() {
                            format!("No PNG images in {}", index.folder().display())
                        } else {
                            format!(
                                "✅ Loaded {} images from {}",
                                index.len(),
                                index.folder().display()
                            )
                        };
                        self.index = index;
                        self.apply_search()
                    }
                    Err(e) => {
                        warn!("⚠️  Indexing failed: {}", e);
                        self.status = format!("❌ {}", e);
                        Task::none()
                    }
                }
            }
            Message::SetDefaultFolder => {
                let folder = self.folder_input.trim().to_string();
                if !folder.is_empty() {
                    self.settings.set_default_folder(&folder);
                    self.persist_settings();
                    self.status = format!("Default folder set to {}", folder);
                }
                Task::none()
            }
            Message::AddPreset => {
                let folder = self.folder_input.trim().to_string();
                if self.settings.add_preset(&folder) {
                    self.persist_settings();
                    self.status = format!("Preset added: {}", folder);
                }
                Task::none()
            }
            Message::RemovePreset => {
                if let Some(preset) = self.selected_preset.take() {
                    if self.settings.remove_preset(&PathBuf::from(&preset)) {
                        self.persist_settings();
                        self.status = format!("Preset removed: {}", preset);
                    }
                }
                Task::none()
            }
            Message::PresetSelected(preset) => {
                self.selected_preset = Some(preset.clone());
                self.start_indexing(PathBuf::from(preset))
            }

            Message::ColumnsChanged(columns) => {
                if self.layout.set_columns(columns) {
                    return self.request_visible_thumbnails();
                }
                Task::none()
            }
            Message::ThumbnailSizeChanged(size) => {
                if self.layout.set_thumbnail_size(size) {
                    return self.on_thumbnail_size_changed();
                }
                Task::none()
            }
            Message::DisplayCommitted => {
                self.persist_settings();
                Task::none()
            }
            Message::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers;
                Task::none()
            }
            Message::WheelScrolled(delta) => {
                if !self.modifiers.control() {
                    return Task::none();
                }

                let y = match delta {
                    mouse::ScrollDelta::Lines { y, .. } | mouse::ScrollDelta::Pixels { y, .. } => y,
                };
                let steps = if y > 0.0 {
                    1
                } else if y < 0.0 {
                    -1
                } else {
                    0
                };

                if steps != 0 && self.layout.step_thumbnail_size(steps) {
                    self.persist_settings();
                    return self.on_thumbnail_size_changed();
                }
                Task::none()
            }
            Message::GridScrolled(viewport) => {
                self.scroll_y = viewport.absolute_offset().y;
                self.viewport_height = viewport.bounds().height;
                self.request_visible_thumbnails()
            }
            Message::ThumbnailLoaded(path, size, thumbnail) => {
                // Rendered for a size that is no longer shown
                if size == self.layout.thumbnail_size() {
                    let handle =
                        Handle::from_rgba(thumbnail.width, thumbnail.height, thumbnail.pixels);
                    self.thumbnails.insert(path, size, handle);
                }
                Task::none()
            }

            Message::SelectEntry(index) => {
                if self.selection.select(index, &self.result) {
                    self.refresh_prompt();
                }
                Task::none()
            }
            Message::PromptAction(action) => {
                // Read-only: allow selection and scrolling, drop edits
                if !action.is_edit() {
                    self.prompt_content.perform(action);
                }
                Task::none()
            }
            Message::ExportPrompt => {
                match self.selected_record() {
                    Some(record) => match save_sidecar(record) {
                        Ok(path) => {
                            self.status = format!(
                                "💾 Saved {}",
                                path.file_name().unwrap_or_default().to_string_lossy()
                            );
                        }
                        Err(e) => {
                            warn!("⚠️  {}", e);
                            self.status = format!("❌ {}", e);
                        }
                    },
                    None => self.status = "No prompt selected.".to_string(),
                }
                Task::none()
            }
            Message::PaneResized(pane_grid::ResizeEvent { split, ratio }) => {
                self.panes.resize(split, ratio);
                Task::none()
            }
        }
    }

    /// Start a background scan of `folder`; the current index is dropped
    fn start_indexing(&mut self, folder: PathBuf) -> Task<Message> {
        if !folder.is_dir() {
            self.status = format!("❌ Folder not found: {}", folder.display());
            return Task::none();
        }

        self.scan_generation += 1;
        let generation = self.scan_generation;

        self.indexing = true;
        self.folder_input = folder.display().to_string();
        self.status = format!("Indexing {}...", folder.display());

        self.index = PromptIndex::default();
        self.result = SearchResult::default();
        self.selection.clear();
        self.thumbnails.clear();
        self.refresh_prompt();

        Task::run(index_stream(folder), move |event| match event {
            ScanEvent::Progress { done, total } => Message::IndexProgress(generation, done, total),
            ScanEvent::Finished(result) => Message::IndexBuilt(generation, result),
        })
    }

    /// Re-run the current query against the index
    fn apply_search(&mut self) -> Task<Message> {
        let query = SearchQuery::new(self.query_input.clone(), self.mode)
            .case_sensitive(self.case_sensitive);

        self.result = self.index.search(&query);
        self.selection.select_first(&self.result);
        self.refresh_prompt();

        debug!("🔎 {:?} → {} hits", query, self.result.len());

        self.scroll_y = 0.0;
        Task::batch([
            scrollable::snap_to(grid_scroll_id(), scrollable::RelativeOffset::START),
            self.request_visible_thumbnails(),
        ])
    }

    /// Queue thumbnail renders for visible entries that are not cached yet
    fn request_visible_thumbnails(&mut self) -> Task<Message> {
        let size = self.layout.thumbnail_size();
        let visible = self
            .layout
            .visible_range(self.scroll_y, self.viewport_height, self.result.len());

        let mut tasks = Vec::new();
        for position in visible {
            let Some(record) = self.result.get(position).and_then(|i| self.index.get(i)) else {
                continue;
            };

            if self.thumbnails.request(record.path(), size) {
                let path = record.path().to_path_buf();
                let key = path.clone();
                tasks.push(Task::perform(load_thumbnail(path, size), move |thumbnail| {
                    Message::ThumbnailLoaded(key.clone(), size, thumbnail)
                }));
            }
        }

        if !tasks.is_empty() {
            debug!(
                "🖼️  Rendering {} thumbnails ({} cached)",
                tasks.len(),
                self.thumbnails.len()
            );
        }
        Task::batch(tasks)
    }

    fn on_thumbnail_size_changed(&mut self) -> Task<Message> {
        self.thumbnails.clear();
        self.request_visible_thumbnails()
    }

    fn selected_record(&self) -> Option<&ImageRecord> {
        self.selection.current().and_then(|i| self.index.get(i))
    }

    /// Show the selected prompt in the text pane
    fn refresh_prompt(&mut self) {
        let body = ui::prompt_pane::display_text(self.selected_record()).to_string();
        self.prompt_content = text_editor::Content::with_text(&body);
    }

    /// Save settings now; failures are reported but never fatal
    fn persist_settings(&mut self) {
        self.settings.columns = self.layout.columns();
        self.settings.thumbnail_size = self.layout.thumbnail_size();

        if let Err(e) = self.settings.save(&self.settings_path) {
            warn!("⚠️  Could not save settings: {}", e);
            self.status = format!("❌ Could not save settings: {}", e);
        }
    }

    /// Listen for Ctrl state and mouse wheel (Ctrl + wheel resizes thumbnails)
    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            Event::Keyboard(keyboard::Event::ModifiersChanged(modifiers)) => {
                Some(Message::ModifiersChanged(modifiers))
            }
            Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                Some(Message::WheelScrolled(delta))
            }
            _ => None,
        })
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let hits = if self.indexing {
            "Hits: …".to_string()
        } else {
            format!("Hits: {}", self.result.len())
        };

        let search_bar = row![
            text("Search:"),
            text_input("tags, separated by commas", &self.query_input)
                .on_input(Message::QueryChanged)
                .on_submit(Message::Search)
                .width(Length::Fixed(360.0)),
            button("Search").on_press(Message::Search),
            button("Reset").on_press(Message::ResetSearch),
            radio(
                SearchMode::Exact.to_string(),
                SearchMode::Exact,
                Some(self.mode),
                Message::ModeSelected
            ),
            radio(
                SearchMode::AndTags.to_string(),
                SearchMode::AndTags,
                Some(self.mode),
                Message::ModeSelected
            ),
            checkbox("Match case", self.case_sensitive).on_toggle(Message::CaseSensitiveToggled),
            horizontal_space(),
            text(hits),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let folder_bar = row![
            text_input("Folder", &self.folder_input)
                .on_input(Message::FolderInputChanged)
                .on_submit(Message::LoadFolder)
                .width(Length::Fill),
            button("Browse").on_press(Message::BrowseFolder),
            button("Reload").on_press(Message::LoadFolder),
            button("Set default").on_press(Message::SetDefaultFolder),
            button("Add preset").on_press(Message::AddPreset),
            button("Remove preset")
                .on_press_maybe(self.selected_preset.as_ref().map(|_| Message::RemovePreset)),
        ]
        .spacing(6)
        .align_y(Alignment::Center);

        let presets: Vec<String> = self
            .settings
            .presets
            .iter()
            .map(|preset| preset.display().to_string())
            .collect();

        let display_bar = row![
            text("Presets:"),
            pick_list(presets, self.selected_preset.clone(), Message::PresetSelected)
                .placeholder("Choose a folder")
                .width(Length::Fixed(280.0)),
            horizontal_space(),
            text("Columns"),
            slider(MIN_COLUMNS..=MAX_COLUMNS, self.layout.columns(), Message::ColumnsChanged)
                .on_release(Message::DisplayCommitted)
                .width(Length::Fixed(140.0)),
            text(self.layout.columns().to_string()),
            text("Thumbnail size"),
            slider(
                MIN_THUMBNAIL_SIZE..=MAX_THUMBNAIL_SIZE,
                self.layout.thumbnail_size(),
                Message::ThumbnailSizeChanged
            )
            .step(SIZE_STEP)
            .on_release(Message::DisplayCommitted)
            .width(Length::Fixed(180.0)),
            text(format!("{}px", self.layout.thumbnail_size())),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let visible = self
            .layout
            .visible_range(self.scroll_y, self.viewport_height, self.result.len());

        let panes = PaneGrid::new(&self.panes, |_id, pane, _maximized| {
            let content: Element<Message> = match pane {
                Pane::Thumbnails => ui::grid::thumbnail_grid(
                    &self.index,
                    &self.result,
                    self.layout,
                    self.selection,
                    visible.clone(),
                    &self.thumbnails,
                ),
                Pane::Prompt => {
                    ui::prompt_pane::prompt_pane(self.selected_record(), &self.prompt_content)
                }
            };
            pane_grid::Content::new(container(content).style(container::bordered_box))
        })
        .on_resize(10, Message::PaneResized)
        .spacing(8)
        .width(Length::Fill)
        .height(Length::Fill);

        let content = column![
            search_bar,
            folder_bar,
            display_bar,
            panes,
            text(&self.status).size(14),
        ]
        .spacing(8)
        .padding(10);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,prompt_explorer=info"),
    )
    .init();

    iced::application("Prompt Explorer", PromptExplorer::update, PromptExplorer::view)
        .subscription(PromptExplorer::subscription)
        .theme(PromptExplorer::theme)
        .window_size((1200.0, 720.0))
        .centered()
        .run_with(PromptExplorer::new)
}

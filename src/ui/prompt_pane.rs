use iced::widget::{button, column, row, text, text_editor};
use iced::{Alignment, Element, Length};

use crate::state::data::ImageRecord;
use crate::Message;

/// Shown in the text area when the selected image has no prompt
pub const EMPTY_PROMPT_TEXT: &str = "(no prompt)";

/// Title shown when nothing is selected
pub const NO_SELECTION_TITLE: &str = "No prompt selected";

/// Text to put in the prompt area for a (possibly missing) selection
pub fn display_text(record: Option<&ImageRecord>) -> &str {
    match record {
        Some(record) if record.has_prompt() => record.prompt(),
        Some(_) => EMPTY_PROMPT_TEXT,
        None => "",
    }
}

/// Header with the file name and a save button, above a read-only text area
pub fn prompt_pane<'a>(
    record: Option<&'a ImageRecord>,
    content: &'a text_editor::Content,
) -> Element<'a, Message> {
    let title = record
        .map(ImageRecord::file_name)
        .unwrap_or_else(|| NO_SELECTION_TITLE.to_string());

    let header = row![
        text(title).size(16).width(Length::Fill),
        button("Save .txt")
            .on_press_maybe(record.map(|_| Message::ExportPrompt))
            .padding(6),
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    let body = text_editor(content)
        .on_action(Message::PromptAction)
        .height(Length::Fill);

    column![header, body].spacing(8).padding(8).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text() {
        let with_prompt = ImageRecord::new("a.png", "sky, tree");
        let without = ImageRecord::new("b.png", "");

        assert_eq!(display_text(Some(&with_prompt)), "sky, tree");
        assert_eq!(display_text(Some(&without)), EMPTY_PROMPT_TEXT);
        assert_eq!(display_text(None), "");
    }
}

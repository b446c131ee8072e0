//! The closed set of menu commands and their presentation.
//!
//! Routing logic works on [`MenuCommand`] only; the user-visible button
//! labels live in one mapping table here, so changing a label never touches
//! a handler.

use teloxide::types::{KeyboardButton, KeyboardMarkup};

/// One entry of the reply-keyboard menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    AddImage,
    CreatePdf,
    AddPdf,
    MergePdfs,
    SplitPdf,
    ExtractText,
    ConvertToWord,
    Cancel,
}

/// Presentation-layer mapping between commands and button labels.
const LABELS: &[(MenuCommand, &str)] = &[
    (MenuCommand::AddImage, "🖼️ Add Image"),
    (MenuCommand::CreatePdf, "📄 Create PDF"),
    (MenuCommand::AddPdf, "📥 Add PDF"),
    (MenuCommand::MergePdfs, "🔗 Merge PDFs"),
    (MenuCommand::SplitPdf, "✂️ Split PDF"),
    (MenuCommand::ExtractText, "🔍 Extract Text"),
    (MenuCommand::ConvertToWord, "📝 PDF → Word"),
    (MenuCommand::Cancel, "🛑 Cancel"),
];

impl MenuCommand {
    /// Match a message text against the label table.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        LABELS
            .iter()
            .find(|(_, label)| *label == text)
            .map(|(cmd, _)| *cmd)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        LABELS
            .iter()
            .find(|(cmd, _)| *cmd == self)
            .map(|(_, label)| *label)
            .unwrap_or_default()
    }
}

/// The persistent reply keyboard shown under the input field.
#[must_use]
pub fn main_keyboard() -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = vec![
        vec![
            KeyboardButton::new(MenuCommand::AddImage.label()),
            KeyboardButton::new(MenuCommand::CreatePdf.label()),
        ],
        vec![KeyboardButton::new(MenuCommand::AddPdf.label())],
        vec![
            KeyboardButton::new(MenuCommand::MergePdfs.label()),
            KeyboardButton::new(MenuCommand::SplitPdf.label()),
        ],
        vec![
            KeyboardButton::new(MenuCommand::ExtractText.label()),
            KeyboardButton::new(MenuCommand::ConvertToWord.label()),
        ],
        vec![KeyboardButton::new(MenuCommand::Cancel.label())],
    ];
    let mut keyboard = KeyboardMarkup::new(rows);
    keyboard.resize_keyboard = true;
    keyboard
}

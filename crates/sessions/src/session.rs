use serde::{Deserialize, Serialize};

/// Opaque reference to content that has already been transferred to the
/// hosting side (a Telegram file id). Only durably stored content is ever
/// recorded in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef(pub String);

impl FileRef {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for FileRef {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for FileRef {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of attachment the session currently accepts.
///
/// A single enum instead of independent boolean flags, so "collecting images
/// and PDFs at the same time" cannot be represented at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectMode {
    /// Attachments are classified by content type only.
    #[default]
    Idle,
    /// Incoming photos and image documents are appended to `images`.
    Images,
    /// Incoming PDF uploads accumulate in `pdfs`.
    Pdfs,
}

/// Mutable per-user record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Collected images, in upload order. Order becomes page order.
    pub images: Vec<FileRef>,
    /// Collected PDFs. Handlers operate on the last entry ("current PDF").
    pub pdfs: Vec<FileRef>,
    /// Current collection mode.
    pub mode: CollectMode,
}

impl Session {
    /// The PDF that page-level operations apply to.
    #[must_use]
    pub fn current_pdf(&self) -> Option<&FileRef> {
        self.pdfs.last()
    }

    /// Reset to the default empty state (the Cancel action).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Enter image-collection mode, discarding any previously collected
    /// images so a new batch starts clean.
    pub fn begin_collecting_images(&mut self) {
        self.images.clear();
        self.mode = CollectMode::Images;
    }

    /// Enter PDF-collection mode.
    pub fn begin_collecting_pdfs(&mut self) {
        self.mode = CollectMode::Pdfs;
    }

    /// Record a re-hosted image. Caller must have checked the mode.
    pub fn push_image(&mut self, file: FileRef) {
        self.images.push(file);
    }

    /// Record a re-hosted PDF.
    ///
    /// While collecting PDFs, uploads accumulate in order so multi-input
    /// operations can see more than one entry. Outside collection a fresh
    /// upload supersedes whatever the session held before.
    pub fn store_pdf(&mut self, file: FileRef) {
        if self.mode == CollectMode::Pdfs {
            self.pdfs.push(file);
        } else {
            self.pdfs = vec![file];
        }
    }
}

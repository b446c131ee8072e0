use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

/// Ephemeral directory bound to one handler invocation.
///
/// The directory is removed when the value is dropped, which covers every
/// exit path of a handler: normal return, precondition short-circuit, and
/// collaborator errors propagated with `?`.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create() -> Result<Self> {
        let dir = TempDir::with_prefix("pdfmill-")?;
        tracing::debug!(path = %dir.path().display(), "workspace created");
        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the workspace.
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

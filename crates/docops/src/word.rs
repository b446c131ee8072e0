//! Word document generation from extracted text.

use {
    docx_rs::{Docx, Paragraph, Run},
    std::io::Cursor,
};

use crate::error::{Error, Result};

/// Build a `.docx` with one paragraph per non-empty line of `text`, in the
/// original line order.
pub fn text_to_docx(text: &str) -> Result<Vec<u8>> {
    let mut docx = Docx::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
    }

    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|e| Error::DocumentWrite(e.to_string()))?;
    Ok(cursor.into_inner())
}

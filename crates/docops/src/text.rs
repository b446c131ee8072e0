//! Plain-text extraction and delivery chunking.

use lopdf::Document;

use crate::error::{Error, Result};

/// Character budget per delivered chunk. Telegram caps messages at 4096
/// bytes; the original toolkit used 4000 and we keep that contract.
pub const MAX_CHUNK_LEN: usize = 4000;

/// Extract text from every page, in page order, joined with newlines.
/// Pages with no extractable text contribute nothing.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    let doc = Document::load_mem(bytes).map_err(|e| Error::Parse(e.to_string()))?;
    let mut page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    page_numbers.sort_unstable();

    let mut out = String::new();
    for number in page_numbers {
        let page_text = doc.extract_text(&[number]).unwrap_or_default();
        if !page_text.is_empty() {
            out.push_str(&page_text);
            if !page_text.ends_with('\n') {
                out.push('\n');
            }
        }
    }
    Ok(out)
}

/// Split `text` into chunks of at most `max_len` bytes on char boundaries.
///
/// Chunking is lossless: concatenating the chunks reproduces the input
/// byte for byte, and chunk order follows input order.
#[must_use]
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    if max_len == 0 || text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }
        let mut end = remaining.floor_char_boundary(max_len);
        if end == 0 {
            end = remaining
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(remaining.len());
        }
        chunks.push(remaining[..end].to_string());
        remaining = &remaining[end..];
    }
    chunks
}

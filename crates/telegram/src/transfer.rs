//! Content transfer: download by file id, re-host uploads for durability.

use {
    std::path::Path,
    teloxide::net::Download,
    teloxide::prelude::*,
    teloxide::types::{ChatId, InputFile},
    tracing::debug,
};

use pdfmill_sessions::FileRef;

use crate::{Error, Result, state::BotState};

/// Download a file from Telegram into a workspace path.
///
/// Goes through the bot's configured API URL, so tests against a mock
/// server exercise the same path as production.
pub async fn download_to(bot: &Bot, file_id: &str, dest: &Path) -> Result<()> {
    let file = bot.get_file(file_id).await?;
    let mut out = tokio::fs::File::create(dest).await?;
    bot.download_file(&file.path, &mut out).await?;
    debug!(file_id, dest = %dest.display(), "downloaded file");
    Ok(())
}

/// Re-host a document so its file id outlives the user's own message.
///
/// With an archive chat configured the document is forwarded there and the
/// archive copy's id is recorded; otherwise the original id is used as-is.
pub async fn rehost_document(state: &BotState, file_id: &str) -> Result<FileRef> {
    let Some(archive) = state.config.archive_chat_id else {
        return Ok(FileRef::from(file_id));
    };
    let sent = state
        .bot
        .send_document(ChatId(archive), InputFile::file_id(file_id))
        .await?;
    let rehosted = sent
        .document()
        .map(|d| d.file.id.clone())
        .ok_or_else(|| Error::message("archive copy has no document"))?;
    debug!(file_id, rehosted = %rehosted, "re-hosted document to archive chat");
    Ok(FileRef(rehosted))
}

/// Re-host a photo; same contract as [`rehost_document`].
pub async fn rehost_photo(state: &BotState, file_id: &str) -> Result<FileRef> {
    let Some(archive) = state.config.archive_chat_id else {
        return Ok(FileRef::from(file_id));
    };
    let sent = state
        .bot
        .send_photo(ChatId(archive), InputFile::file_id(file_id))
        .await?;
    let rehosted = sent
        .photo()
        .and_then(|sizes| sizes.last())
        .map(|p| p.file.id.clone())
        .ok_or_else(|| Error::message("archive copy has no photo"))?;
    debug!(file_id, rehosted = %rehosted, "re-hosted photo to archive chat");
    Ok(FileRef(rehosted))
}

/// Mirror an artifact we just sent to the user into the archive chat.
/// Best effort: failures are logged by the caller, never fatal.
pub async fn archive_copy(state: &BotState, file_id: &str) -> Result<()> {
    if let Some(archive) = state.config.archive_chat_id {
        state
            .bot
            .send_document(ChatId(archive), InputFile::file_id(file_id))
            .await?;
    }
    Ok(())
}

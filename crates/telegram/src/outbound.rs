//! Outbound sends: replies, artifacts, and activity indicators.

use {
    teloxide::{
        payloads::SendMessageSetters,
        prelude::*,
        types::{ChatAction, ChatId, InputFile, Message},
    },
    tracing::warn,
};

use crate::{Result, menu};

/// Outbound message sender.
pub struct Outbound {
    bot: Bot,
}

impl Outbound {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Plain text reply.
    pub async fn send_text(&self, chat: ChatId, text: &str) -> Result<()> {
        self.bot.send_message(chat, text).await?;
        Ok(())
    }

    /// Text reply with the main menu keyboard attached.
    pub async fn send_menu(&self, chat: ChatId, text: &str) -> Result<()> {
        self.bot
            .send_message(chat, text)
            .reply_markup(menu::main_keyboard())
            .await?;
        Ok(())
    }

    /// Sequence of pre-chunked messages, delivered in order.
    pub async fn send_text_chunks(&self, chat: ChatId, chunks: &[String]) -> Result<()> {
        for chunk in chunks {
            self.bot.send_message(chat, chunk).await?;
        }
        Ok(())
    }

    /// Deliver a produced artifact. Returns the sent message so callers can
    /// record the uploaded file's id.
    pub async fn send_document(
        &self,
        chat: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Message> {
        let input = InputFile::memory(bytes).file_name(file_name.to_string());
        let message = self.bot.send_document(chat, input).await?;
        Ok(message)
    }

    /// Show the "uploading a document" activity indicator. Best effort; a
    /// failure here must not fail the operation.
    pub async fn upload_action(&self, chat: ChatId) {
        if let Err(e) = self
            .bot
            .send_chat_action(chat, ChatAction::UploadDocument)
            .await
        {
            warn!(chat_id = chat.0, error = %e, "failed to send chat action");
        }
    }
}

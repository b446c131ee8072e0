//! Telegram front-end for pdfmill.
//!
//! Uses teloxide to receive updates (long polling by default, or an axum
//! webhook endpoint) and routes each one through the menu-driven command
//! router in [`handlers`]. All updates flow through a single dispatch loop,
//! so one user's events are handled to completion in arrival order.

pub mod bot;
pub mod config;
pub mod handlers;
pub mod menu;
pub mod outbound;
pub mod state;
pub mod transfer;
pub mod webhook;

pub use {config::BotConfig, state::BotState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Download(#[from] teloxide::DownloadError),

    #[error(transparent)]
    DocOps(#[from] pdfmill_docops::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Per-user session tracking for the bot.
//!
//! A [`Session`] records which attachments a user has collected and which
//! collection mode the conversation is in; the [`SessionStore`] maps user ids
//! to sessions with an atomic ensure-or-create path so two concurrent
//! first-contact events cannot overwrite each other.

pub mod session;
pub mod store;

pub use {
    session::{CollectMode, FileRef, Session},
    store::SessionStore,
};

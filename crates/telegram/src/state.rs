use std::sync::Arc;

use pdfmill_sessions::SessionStore;

use crate::{config::BotConfig, outbound::Outbound};

/// Shared runtime state, injected into every handler.
pub struct BotState {
    pub bot: teloxide::Bot,
    pub config: BotConfig,
    pub sessions: SessionStore,
    pub outbound: Outbound,
}

pub type SharedState = Arc<BotState>;

impl BotState {
    #[must_use]
    pub fn new(bot: teloxide::Bot, config: BotConfig) -> SharedState {
        Arc::new(Self {
            outbound: Outbound::new(bot.clone()),
            bot,
            config,
            sessions: SessionStore::new(),
        })
    }
}

//! Bot startup: transport selection and the single dispatch loop.
//!
//! Updates arrive over exactly one transport (long polling by default,
//! webhook when configured) and are funneled into one mpsc channel. The
//! dispatch loop drains that channel and handles each update to completion,
//! so per-user event order is the arrival order regardless of transport.

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, Update},
    },
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{config::BotConfig, handlers, state::BotState, webhook};

/// Connect to Telegram and run until Ctrl-C or a fatal transport error.
pub async fn start(config: BotConfig) -> anyhow::Result<()> {
    // Client timeout above the long-polling timeout (30s) so the HTTP client
    // doesn't abort the request before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    let me = bot.get_me().await?;
    info!(username = ?me.username, "telegram bot connected");

    let (tx, mut rx) = mpsc::channel::<Update>(128);
    let cancel = CancellationToken::new();

    if let Some(webhook_config) = config.webhook.clone() {
        let callback = webhook_config.callback_url();
        bot.set_webhook(reqwest::Url::parse(&callback)?).await?;
        info!(
            callback = %callback,
            bind = %webhook_config.bind,
            port = webhook_config.port,
            "webhook registered"
        );
        tokio::spawn(webhook::serve(webhook_config, tx, cancel.clone()));
    } else {
        // Clear any stale webhook so getUpdates is allowed.
        bot.delete_webhook().send().await?;
        info!("webhook cleared, long polling");
        tokio::spawn(poll_updates(bot.clone(), tx, cancel.clone()));
    }

    let state = BotState::new(bot, config);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                cancel.cancel();
                break;
            },
            update = rx.recv() => {
                let Some(update) = update else {
                    info!("update stream closed");
                    break;
                };
                if let Err(e) = handlers::handle_update(&state, update).await {
                    error!(error = %e, "error handling update");
                }
            },
        }
    }
    Ok(())
}

/// Manual getUpdates loop feeding the dispatch channel.
async fn poll_updates(bot: Bot, tx: mpsc::Sender<Update>, cancel: CancellationToken) {
    let mut offset: i32 = 0;

    loop {
        if cancel.is_cancelled() {
            info!("telegram polling stopped");
            break;
        }

        let result = bot
            .get_updates()
            .offset(offset)
            .timeout(30)
            .allowed_updates(vec![AllowedUpdate::Message])
            .await;

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    if tx.send(update).await.is_err() {
                        info!("dispatch channel closed, stopping polling");
                        return;
                    }
                }
            },
            Err(e) => {
                // Conflict means another instance is polling with this token.
                if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                    warn!("another instance is already running with this token, stopping");
                    cancel.cancel();
                    break;
                }
                warn!(error = %e, "telegram getUpdates failed");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            },
        }
    }
}

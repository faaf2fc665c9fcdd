pub mod deal;
pub mod onboarding;
pub mod status;

use std::sync::Arc;

use tracing::{error, warn};

use escrow_db::Database;
use escrow_types::events::{MessageRef, Reply};

use crate::error::HandlerError;
use crate::messenger::Messenger;

/// Everything a handler may touch: the store, the outbound chat surface,
/// and the bot's own handle (used in `/new` mentions and onboarding text).
pub struct BotState<M> {
    pub db: Arc<Database>,
    pub messenger: M,
    pub bot_username: Option<String>,
}

impl<M: Messenger> BotState<M> {
    pub fn new(db: Arc<Database>, messenger: M, bot_username: Option<String>) -> Self {
        Self {
            db,
            messenger,
            bot_username,
        }
    }

    /// Run a blocking store operation off the async runtime.
    pub async fn store<F, T>(&self, f: F) -> Result<T, HandlerError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                HandlerError::Storage(anyhow::anyhow!("store task failed: {}", e))
            })?
            .map_err(HandlerError::Storage)
    }

    pub async fn send(&self, chat_id: i64, reply: Reply) -> Result<(), HandlerError> {
        self.messenger
            .send(chat_id, reply)
            .await
            .map_err(HandlerError::Chat)
    }

    pub async fn edit(&self, message: MessageRef, reply: Reply) -> Result<(), HandlerError> {
        self.messenger
            .edit(message, reply)
            .await
            .map_err(HandlerError::Chat)
    }

    pub async fn answer(&self, callback_id: &str, text: Option<&str>) -> Result<(), HandlerError> {
        self.messenger
            .answer_callback(callback_id, text)
            .await
            .map_err(HandlerError::Chat)
    }

    /// Post to a deal's group chat after a committed change. Failures are
    /// logged and swallowed; the commit stands and nothing is retried.
    pub async fn notify_group(&self, chat_id: Option<i64>, text: String) {
        let Some(chat_id) = chat_id else { return };
        if let Err(e) = self.messenger.send(chat_id, Reply::text(text)).await {
            warn!("Group notification to {} failed: {:#}", chat_id, e);
        }
    }
}

use anyhow::Result;
use async_trait::async_trait;

use escrow_types::events::{MessageRef, Reply};

/// Outbound side of the chat platform. The server binds this to the
/// Telegram Bot API; tests bind it to an in-memory recorder.
#[async_trait]
pub trait Messenger: Send + Sync + 'static {
    /// Post a new message into a chat.
    async fn send(&self, chat_id: i64, reply: Reply) -> Result<()>;

    /// Replace the text (and keyboard) of a message the bot sent earlier.
    async fn edit(&self, message: MessageRef, reply: Reply) -> Result<()>;

    /// Acknowledge a button press, optionally with a toast.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}

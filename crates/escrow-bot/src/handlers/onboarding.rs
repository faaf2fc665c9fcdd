use chrono::Utc;
use tracing::info;

use escrow_types::events::{ChatKind, MessageRef, Reply, Sender};
use escrow_types::models::Language;

use crate::error::HandlerError;
use crate::handlers::BotState;
use crate::messenger::Messenger;
use crate::texts;

/// `/start`: a command overview in groups; in private chats, register the
/// caller and offer the language menu.
pub async fn start<M: Messenger>(
    state: &BotState<M>,
    chat_id: i64,
    chat_kind: ChatKind,
    sender: &Sender,
) -> Result<(), HandlerError> {
    if chat_kind.is_group() {
        return state.send(chat_id, Reply::text(texts::group_welcome())).await;
    }

    let external_id = sender.id;
    let username = sender.username.clone();
    let account = state
        .store(move |db| db.upsert_account(external_id, username.as_deref(), Utc::now()))
        .await?;
    info!("Account {} ready for user {}", account.id, external_id);

    state.send(chat_id, texts::private_welcome(&sender.first_name)).await
}

pub async fn help<M: Messenger>(state: &BotState<M>, chat_id: i64) -> Result<(), HandlerError> {
    state.send(chat_id, Reply::text(texts::help())).await
}

/// `lang_<code>` button: store the preference and turn the menu into a
/// confirmation.
pub async fn select_language<M: Messenger>(
    state: &BotState<M>,
    callback_id: &str,
    origin: Option<MessageRef>,
    sender: &Sender,
    code: &str,
) -> Result<(), HandlerError> {
    let language: Language = code
        .parse()
        .map_err(|_| HandlerError::validation(texts::UNSUPPORTED_LANGUAGE))?;

    let external_id = sender.id;
    let username = sender.username.clone();
    state
        .store(move |db| db.set_language(external_id, username.as_deref(), language, Utc::now()))
        .await?;
    info!("User {} chose language {}", external_id, language.code());

    state
        .answer(callback_id, Some(&texts::language_toast(language)))
        .await?;
    if let Some(message) = origin {
        state
            .edit(message, Reply::text(texts::language_set(language, &sender.first_name)))
            .await?;
    }
    Ok(())
}

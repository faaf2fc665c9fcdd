//! Telegram adapter: outbound calls through the bot API, and conversion of
//! incoming updates into platform-neutral events.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, Chat, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode, User,
};

use escrow_bot::Messenger;
use escrow_types::events::{ChatKind, Inbound, Keyboard, MessageRef, Reply, Sender};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn markup(keyboard: Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.into_iter().map(|row| {
        row.into_iter()
            .map(|button| InlineKeyboardButton::callback(button.label, button.data))
            .collect::<Vec<_>>()
    }))
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, chat_id: i64, reply: Reply) -> anyhow::Result<()> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), reply.text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = reply.keyboard {
            request = request.reply_markup(markup(keyboard));
        }
        request.await?;
        Ok(())
    }

    async fn edit(&self, message: MessageRef, reply: Reply) -> anyhow::Result<()> {
        let mut request = self
            .bot
            .edit_message_text(ChatId(message.chat_id), MessageId(message.message_id), reply.text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = reply.keyboard {
            request = request.reply_markup(markup(keyboard));
        }
        request.await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> anyhow::Result<()> {
        let mut request = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await?;
        Ok(())
    }
}

/// Commands shown in the client's command menu.
pub fn command_menu() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start the bot"),
        BotCommand::new("help", "Show help message"),
        BotCommand::new("new", "Create new transaction"),
        BotCommand::new("status", "Check transaction status"),
        BotCommand::new("ok", "Confirm transaction"),
    ]
}

fn chat_kind(chat: &Chat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Group
    }
}

fn sender(user: &User) -> Sender {
    Sender {
        id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
    }
}

/// Text messages with a known author; everything else is not ours to handle.
pub fn inbound_message(msg: &Message) -> Option<Inbound> {
    let text = msg.text()?;
    let user = msg.from.as_ref()?;
    Some(Inbound::Message {
        chat_id: msg.chat.id.0,
        chat_kind: chat_kind(&msg.chat),
        sender: sender(user),
        text: text.to_string(),
    })
}

pub fn inbound_callback(query: &CallbackQuery) -> Option<Inbound> {
    let data = query.data.clone()?;
    let origin = query.message.as_ref().map(|message| MessageRef {
        chat_id: message.chat().id.0,
        message_id: message.id().0,
    });
    Some(Inbound::Callback {
        callback_id: query.id.to_string(),
        origin,
        sender: sender(&query.from),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use escrow_types::events::Button;

    fn message(json: serde_json::Value) -> Message {
        serde_json::from_value(json).unwrap()
    }

    fn alice() -> serde_json::Value {
        serde_json::json!({"id": 1, "is_bot": false, "first_name": "Alice", "username": "alice"})
    }

    #[test]
    fn group_text_becomes_message_event() {
        let msg = message(serde_json::json!({
            "message_id": 7,
            "date": 1700000000,
            "chat": {"id": -1001, "type": "supergroup", "title": "Traders"},
            "from": alice(),
            "text": "/new @bob 100 Widget"
        }));

        let Some(Inbound::Message { chat_id, chat_kind, sender, text }) = inbound_message(&msg) else {
            panic!("expected a message event");
        };
        assert_eq!(chat_id, -1001);
        assert_eq!(chat_kind, ChatKind::Group);
        assert_eq!(sender.id, 1);
        assert_eq!(sender.username.as_deref(), Some("alice"));
        assert_eq!(text, "/new @bob 100 Widget");
    }

    #[test]
    fn private_chat_is_private() {
        let msg = message(serde_json::json!({
            "message_id": 8,
            "date": 1700000000,
            "chat": {"id": 1, "type": "private", "first_name": "Alice"},
            "from": alice(),
            "text": "/start"
        }));
        let Some(Inbound::Message { chat_kind, .. }) = inbound_message(&msg) else {
            panic!("expected a message event");
        };
        assert_eq!(chat_kind, ChatKind::Private);
    }

    #[test]
    fn keyboards_keep_layout() {
        let markup = markup(Keyboard::column([
            Button::new("One", "lang_en"),
            Button::new("Two", "lang_es"),
        ]));
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "Two");
    }

    #[test]
    fn menu_lists_every_command() {
        let names: Vec<String> = command_menu().into_iter().map(|c| c.command).collect();
        assert_eq!(names, vec!["start", "help", "new", "status", "ok"]);
    }
}

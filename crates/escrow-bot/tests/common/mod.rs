#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use escrow_bot::{BotState, Dispatcher, Messenger};
use escrow_db::Database;
use escrow_types::events::{ChatKind, Inbound, MessageRef, Reply, Sender};

pub const GROUP: i64 = -1001;
pub const OTHER_GROUP: i64 = -2002;
pub const KEYBOARD_MESSAGE: MessageRef = MessageRef {
    chat_id: GROUP,
    message_id: 10,
};

/// One outbound call made by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Message { chat_id: i64, reply: Reply },
    Edit { message: MessageRef, reply: Reply },
    Answer { callback_id: String, text: Option<String> },
}

/// Messenger fake that records every call. Clones share the same log.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<Sent>>>,
    unreachable: Arc<Mutex<HashSet<i64>>>,
}

impl Recorder {
    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }

    /// Make sends and edits in this chat fail.
    pub fn cut_off(&self, chat_id: i64) {
        self.unreachable.lock().unwrap().insert(chat_id);
    }
}

#[async_trait]
impl Messenger for Recorder {
    async fn send(&self, chat_id: i64, reply: Reply) -> anyhow::Result<()> {
        if self.unreachable.lock().unwrap().contains(&chat_id) {
            anyhow::bail!("chat {} unreachable", chat_id);
        }
        self.log.lock().unwrap().push(Sent::Message { chat_id, reply });
        Ok(())
    }

    async fn edit(&self, message: MessageRef, reply: Reply) -> anyhow::Result<()> {
        if self.unreachable.lock().unwrap().contains(&message.chat_id) {
            anyhow::bail!("chat {} unreachable", message.chat_id);
        }
        self.log.lock().unwrap().push(Sent::Edit { message, reply });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(Sent::Answer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }
}

pub struct Harness {
    pub dispatcher: Dispatcher<Recorder>,
    pub recorder: Recorder,
    pub db: Arc<Database>,
}

impl Harness {
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let recorder = Recorder::default();
        let state = BotState::new(db.clone(), recorder.clone(), Some("EscrowBot".into()));
        Self {
            dispatcher: Dispatcher::new(state),
            recorder,
            db,
        }
    }

    pub async fn group(&self, sender: &Sender, text: &str) -> Vec<Sent> {
        self.dispatcher
            .handle(Inbound::Message {
                chat_id: GROUP,
                chat_kind: ChatKind::Group,
                sender: sender.clone(),
                text: text.to_string(),
            })
            .await;
        self.recorder.take()
    }

    pub async fn private(&self, sender: &Sender, text: &str) -> Vec<Sent> {
        self.dispatcher
            .handle(Inbound::Message {
                chat_id: sender.id,
                chat_kind: ChatKind::Private,
                sender: sender.clone(),
                text: text.to_string(),
            })
            .await;
        self.recorder.take()
    }

    pub async fn press(&self, sender: &Sender, data: &str) -> Vec<Sent> {
        self.dispatcher
            .handle(Inbound::Callback {
                callback_id: format!("cb-{}", sender.id),
                origin: Some(KEYBOARD_MESSAGE),
                sender: sender.clone(),
                data: data.to_string(),
            })
            .await;
        self.recorder.take()
    }

    /// Break the store so every deal query fails.
    pub fn drop_deals_table(&self) {
        self.db
            .with_conn(|conn| {
                conn.execute_batch("DROP TABLE transactions")?;
                Ok(())
            })
            .unwrap();
    }

    /// `/start` in private so the user becomes findable by handle.
    pub async fn register(&self, sender: &Sender) {
        self.private(sender, "/start").await;
    }

    /// Register both parties and open `/new @seller <amount> Widget` in GROUP.
    pub async fn open_deal(&self, buyer: &Sender, seller: &Sender, amount: &str) -> i64 {
        self.register(seller).await;
        let handle = seller.username.clone().unwrap();
        self.group(buyer, &format!("/new @{} {} Widget", handle, amount)).await;
        self.db
            .deals_as_buyer(buyer.id)
            .unwrap()
            .last()
            .expect("deal was not created")
            .transaction
            .id
    }
}

pub fn user(id: i64, username: &str, first_name: &str) -> Sender {
    Sender {
        id,
        username: Some(username.to_string()),
        first_name: first_name.to_string(),
    }
}

pub fn alice() -> Sender {
    user(1, "alice", "Alice")
}

pub fn bob() -> Sender {
    user(2, "bob", "Bob")
}

pub fn carol() -> Sender {
    user(3, "carol", "Carol")
}

/// Texts of all plain messages sent to `chat_id`.
pub fn messages_to(sent: &[Sent], chat_id: i64) -> Vec<String> {
    sent.iter()
        .filter_map(|s| match s {
            Sent::Message { chat_id: c, reply } if *c == chat_id => Some(reply.text.clone()),
            _ => None,
        })
        .collect()
}

pub fn answers(sent: &[Sent]) -> Vec<Option<String>> {
    sent.iter()
        .filter_map(|s| match s {
            Sent::Answer { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

pub fn edits(sent: &[Sent]) -> Vec<String> {
    sent.iter()
        .filter_map(|s| match s {
            Sent::Edit { reply, .. } => Some(reply.text.clone()),
            _ => None,
        })
        .collect()
}

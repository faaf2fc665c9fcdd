use serde::{Deserialize, Serialize};

/// Kind of chat an event arrived from. Supergroups are reported as `Group`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

impl ChatKind {
    pub fn is_group(self) -> bool {
        matches!(self, Self::Group)
    }
}

/// The chat participant that produced an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Chat-platform user id.
    pub id: i64,
    /// Handle without the leading `@`, if the user has one.
    pub username: Option<String>,
    pub first_name: String,
}

/// Address of a message the bot may later edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

/// Events delivered FROM the chat platform TO the bot, normalized so the
/// routing layer never sees platform types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Inbound {
    /// A text message (commands included)
    Message {
        chat_id: i64,
        chat_kind: ChatKind,
        sender: Sender,
        text: String,
    },

    /// An inline keyboard button was pressed
    Callback {
        callback_id: String,
        /// The message carrying the keyboard; absent when it is too old to edit.
        origin: Option<MessageRef>,
        sender: Sender,
        data: String,
    },
}

impl Inbound {
    pub fn sender(&self) -> &Sender {
        match self {
            Self::Message { sender, .. } | Self::Callback { sender, .. } => sender,
        }
    }
}

// -- Outbound --

/// One inline keyboard button. `data` comes back verbatim in the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// A keyboard with one button per row.
    pub fn column(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }
}

/// A message the bot sends or edits. Text is always HTML-formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

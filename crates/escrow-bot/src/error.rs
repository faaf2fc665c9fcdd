use thiserror::Error;

/// Why a handler stopped early. The first three carry the text shown to
/// the user; none of them leaves a state change behind.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),

    #[error("chat platform error: {0:#}")]
    Chat(anyhow::Error),
}

impl HandlerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Text to show the user, if any. Platform failures are only logged
    /// since the platform is what would carry the message.
    pub fn user_message<'a>(&'a self, retry_text: &'a str) -> Option<&'a str> {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) | Self::Forbidden(msg) => Some(msg.as_str()),
            Self::Storage(_) => Some(retry_text),
            Self::Chat(_) => None,
        }
    }

    /// Expected rejections are routine; only infrastructure failures are errors.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_) | Self::Forbidden(_))
    }
}

pub mod catalog;
pub mod commands;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod messenger;
pub mod texts;

pub use dispatcher::Dispatcher;
pub use error::HandlerError;
pub use handlers::BotState;
pub use messenger::Messenger;

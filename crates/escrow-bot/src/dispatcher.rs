use std::sync::Arc;

use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use escrow_types::events::{Inbound, Reply};

use crate::commands::{CallbackAction, Command, parse_callback, parse_command};
use crate::error::HandlerError;
use crate::handlers::{BotState, deal, onboarding, status};
use crate::messenger::Messenger;
use crate::texts;

/// Routes inbound chat events to handlers by command name or callback
/// prefix. Holds no per-user state; everything lives in the store.
pub struct Dispatcher<M> {
    inner: Arc<BotState<M>>,
}

impl<M> Clone for Dispatcher<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M: Messenger> Dispatcher<M> {
    pub fn new(state: BotState<M>) -> Self {
        Self {
            inner: Arc::new(state),
        }
    }

    pub fn state(&self) -> &BotState<M> {
        &self.inner
    }

    /// Handle one event to completion. Failures are logged and, where the
    /// user can act on them, reported back; they never propagate.
    pub async fn handle(&self, event: Inbound) {
        let event_id = Uuid::new_v4();
        let span = info_span!("event", %event_id, user = event.sender().id);
        self.dispatch(event).instrument(span).await
    }

    async fn dispatch(&self, event: Inbound) {
        let state = &*self.inner;

        match event {
            Inbound::Message {
                chat_id,
                chat_kind,
                sender,
                text,
            } => {
                let Some(command) = parse_command(&text, state.bot_username.as_deref()) else {
                    debug!("Ignoring non-command message in chat {}", chat_id);
                    return;
                };
                debug!("/{} from {} in chat {}", command.name(), sender.id, chat_id);

                let result = match &command {
                    Command::Start => onboarding::start(state, chat_id, chat_kind, &sender).await,
                    Command::Help => onboarding::help(state, chat_id).await,
                    Command::New(args) => deal::create(state, chat_id, chat_kind, &sender, args).await,
                    Command::Status => status::status(state, chat_id, chat_kind, &sender).await,
                    Command::Ok(args) => deal::confirm(state, chat_id, &sender, args).await,
                };

                if let Err(e) = result {
                    log_failure(command.name(), &e);
                    if let Some(text) = e.user_message(texts::GENERIC_RETRY) {
                        if let Err(send_err) = state.messenger.send(chat_id, Reply::text(text)).await {
                            error!("Could not report failure to chat {}: {:#}", chat_id, send_err);
                        }
                    }
                }
            }

            Inbound::Callback {
                callback_id,
                origin,
                sender,
                data,
            } => {
                let Some(action) = parse_callback(&data) else {
                    debug!("Dropping unmatched callback data '{}'", data);
                    return;
                };

                let (name, result) = match &action {
                    CallbackAction::Language(code) => (
                        "lang",
                        onboarding::select_language(state, &callback_id, origin, &sender, code).await,
                    ),
                    CallbackAction::Chain(payload) => (
                        "chain",
                        deal::select_network(state, &callback_id, origin, &sender, payload).await,
                    ),
                };

                if let Err(e) = result {
                    log_failure(name, &e);
                    if let Some(text) = e.user_message(texts::CALLBACK_RETRY) {
                        if let Err(answer_err) =
                            state.messenger.answer_callback(&callback_id, Some(text)).await
                        {
                            error!("Could not answer callback {}: {:#}", callback_id, answer_err);
                        }
                    }
                }
            }
        }
    }
}

fn log_failure(handler: &str, e: &HandlerError) {
    if e.is_rejection() {
        info!("{} rejected: {}", handler, e);
    } else {
        error!("{} failed: {}", handler, e);
    }
}

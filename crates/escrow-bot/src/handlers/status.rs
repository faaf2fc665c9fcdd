use escrow_types::events::{ChatKind, Reply, Sender};

use crate::error::HandlerError;
use crate::handlers::BotState;
use crate::messenger::Messenger;
use crate::texts;

/// How many deals `/status` lists in a group.
pub const GROUP_STATUS_LIMIT: u32 = 5;

/// `/status`: the group's latest deals, or every deal the caller is part of.
pub async fn status<M: Messenger>(
    state: &BotState<M>,
    chat_id: i64,
    chat_kind: ChatKind,
    sender: &Sender,
) -> Result<(), HandlerError> {
    if chat_kind.is_group() {
        let deals = state
            .store(move |db| db.recent_deals_for_chat(chat_id, GROUP_STATUS_LIMIT))
            .await?;

        let text = if deals.is_empty() {
            texts::NO_GROUP_DEALS.to_string()
        } else {
            texts::group_status(&deals)
        };
        return state.send(chat_id, Reply::text(text)).await;
    }

    let external_id = sender.id;
    let (as_buyer, as_seller) = state
        .store(move |db| Ok((db.deals_as_buyer(external_id)?, db.deals_as_seller(external_id)?)))
        .await?;

    if as_buyer.is_empty() && as_seller.is_empty() {
        return state.send(chat_id, Reply::text(texts::NO_PRIVATE_DEALS)).await;
    }

    for page in texts::private_status(&as_buyer, &as_seller) {
        state.send(chat_id, Reply::text(page)).await?;
    }
    Ok(())
}

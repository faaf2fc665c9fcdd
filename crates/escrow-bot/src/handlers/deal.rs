//! The escrow lifecycle: open a deal, pick a payment network, confirm.
//!
//! Status only ever moves `awaiting_payment -> completed`. Buyer-only
//! actions compare the caller's platform id with the buyer account loaded
//! for the transaction; rejected calls write nothing.

use chrono::Utc;
use tracing::{info, warn};

use escrow_db::queries::NewTransaction;
use escrow_types::events::{ChatKind, MessageRef, Reply, Sender};
use escrow_types::models::{Deal, MAX_DESCRIPTION_CHARS, SERVICE_FEE};

use crate::commands::{PayloadError, parse_amount, parse_chain_payload};
use crate::error::HandlerError;
use crate::handlers::BotState;
use crate::messenger::Messenger;
use crate::texts;

/// `/new <@seller> <amount> <description...>`
pub async fn create<M: Messenger>(
    state: &BotState<M>,
    chat_id: i64,
    chat_kind: ChatKind,
    sender: &Sender,
    args: &[String],
) -> Result<(), HandlerError> {
    if !chat_kind.is_group() {
        return Err(HandlerError::validation(texts::NEW_NEEDS_GROUP));
    }
    if args.len() < 3 {
        return Err(HandlerError::validation(texts::new_usage()));
    }

    let seller_handle = args[0].trim_start_matches('@').to_string();
    let amount = parse_amount(&args[1]).map_err(|e| {
        info!("Rejected amount '{}': {}", args[1], e);
        HandlerError::validation(texts::BAD_AMOUNT)
    })?;
    let description = args[2..].join(" ");
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(HandlerError::validation(texts::description_too_long()));
    }

    let buyer_external_id = sender.id;
    let buyer_username = sender.username.clone();
    let lookup_handle = seller_handle.clone();
    let (buyer, seller) = state
        .store(move |db| {
            let buyer = db.upsert_account(buyer_external_id, buyer_username.as_deref(), Utc::now())?;
            let seller = db.find_account_by_username(&lookup_handle)?;
            Ok((buyer, seller))
        })
        .await?;

    let Some(seller) = seller else {
        return Err(HandlerError::not_found(texts::seller_unknown(
            &seller_handle,
            state.bot_username.as_deref(),
        )));
    };
    if seller.id == buyer.id {
        return Err(HandlerError::validation(texts::SELF_DEAL));
    }

    let (buyer_id, seller_id) = (buyer.id, seller.id);
    let deal = state
        .store(move |db| {
            let tx = db.insert_transaction(&NewTransaction {
                buyer_id,
                seller_id,
                amount,
                description: &description,
                fee_amount: SERVICE_FEE,
                chat_id: Some(chat_id),
                created_at: Utc::now(),
            })?;
            db.get_deal(tx.id)?
                .ok_or_else(|| anyhow::anyhow!("Transaction {} missing after insert", tx.id))
        })
        .await?;

    info!(
        "Deal #{} opened in chat {}: buyer {} seller {} amount {}",
        deal.transaction.id, chat_id, buyer.external_id, seller.external_id, deal.transaction.amount
    );

    state.send(chat_id, texts::deal_created(&deal)).await
}

/// `chain_<NETWORK>_<id>` button.
pub async fn select_network<M: Messenger>(
    state: &BotState<M>,
    callback_id: &str,
    origin: Option<MessageRef>,
    sender: &Sender,
    payload: &str,
) -> Result<(), HandlerError> {
    let (network, transaction_id) = parse_chain_payload(payload).map_err(|e| {
        warn!("Bad network selection payload: {}", e);
        match e {
            PayloadError::UnknownNetwork(_) => HandlerError::validation(texts::NETWORK_UNKNOWN_TOAST),
            PayloadError::Malformed(_) => HandlerError::validation(texts::CALLBACK_RETRY),
        }
    })?;

    let mut deal = load_deal(state, transaction_id, texts::DEAL_MISSING_TOAST).await?;
    if !deal.is_buyer(sender.id) {
        info!("User {} tried to pick the network for deal #{}", sender.id, transaction_id);
        return Err(HandlerError::forbidden(texts::ONLY_BUYER_NETWORK));
    }

    let now = Utc::now();
    let updated = state
        .store(move |db| db.set_network(transaction_id, network, now))
        .await?;
    if !updated {
        return Err(HandlerError::not_found(texts::DEAL_MISSING_TOAST));
    }
    deal.transaction.network = Some(network);
    deal.transaction.network_selected_at = Some(now);
    info!("Deal #{} network set to {}", transaction_id, network);

    // Answer first so the button stops spinning even if the edit fails.
    if let Err(e) = state.answer(callback_id, Some(texts::NETWORK_CHOSEN_TOAST)).await {
        warn!("Could not answer network selection for deal #{}: {}", transaction_id, e);
    }

    let instructions = Reply::text(texts::payment_instructions(&deal, network));
    match origin {
        Some(message) => state.edit(message, instructions).await?,
        None => {
            // The keyboard message is no longer editable; post a fresh copy.
            if let Some(chat_id) = deal.transaction.chat_id {
                state.send(chat_id, instructions).await?;
            }
        }
    }

    state
        .notify_group(deal.transaction.chat_id, texts::group_deal_started(&deal, network))
        .await;
    Ok(())
}

/// `/ok <id>`: the buyer confirms and the deal closes.
pub async fn confirm<M: Messenger>(
    state: &BotState<M>,
    chat_id: i64,
    sender: &Sender,
    args: &[String],
) -> Result<(), HandlerError> {
    let transaction_id: i64 = args
        .first()
        .and_then(|raw| raw.trim_start_matches('#').parse().ok())
        .ok_or_else(|| HandlerError::validation(texts::OK_USAGE))?;

    let deal = load_deal(state, transaction_id, texts::DEAL_NOT_FOUND).await?;
    if !deal.is_buyer(sender.id) {
        info!("User {} tried to confirm deal #{}", sender.id, transaction_id);
        return Err(HandlerError::forbidden(texts::ONLY_BUYER_CONFIRM));
    }

    let updated = state
        .store(move |db| db.complete_transaction(transaction_id, Utc::now()))
        .await?;
    if !updated {
        return Err(HandlerError::not_found(texts::DEAL_NOT_FOUND));
    }
    info!("Deal #{} completed by buyer {}", transaction_id, sender.id);

    state
        .notify_group(deal.transaction.chat_id, texts::group_deal_completed(&deal))
        .await;
    state.send(chat_id, Reply::text(texts::DEAL_COMPLETED)).await
}

async fn load_deal<M: Messenger>(
    state: &BotState<M>,
    transaction_id: i64,
    missing_text: &str,
) -> Result<Deal, HandlerError> {
    state
        .store(move |db| db.get_deal(transaction_id))
        .await?
        .ok_or_else(|| HandlerError::not_found(missing_text))
}

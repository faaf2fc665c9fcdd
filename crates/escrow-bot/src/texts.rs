//! User-facing message bodies. Everything returned here is Telegram HTML;
//! user-supplied fragments are escaped before interpolation.

use rust_decimal::Decimal;

use escrow_types::events::{Button, Keyboard, Reply};
use escrow_types::models::{Deal, Language, MAX_DESCRIPTION_CHARS, Network, SERVICE_FEE};

use crate::catalog::network_info;
use crate::commands::{chain_callback_data, escape_html, language_callback_data};

const DIVIDER: &str = "➖➖➖➖➖➖➖➖";

pub const GENERIC_RETRY: &str = "Oops! Something didn't work right. 😅\nLet's try that again! Need help? Type /help";
pub const CALLBACK_RETRY: &str = "Oops! Something went wrong. Let's try again! 😅";

pub fn money(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

// -- Onboarding --

pub fn group_welcome() -> String {
    format!(
        "👋 <b>Hi! I'm your AI Escrow Assistant!</b>\n\n\
         I'm here to help make deals safe and easy. Here's what I can do:\n\n\
         🤝 <code>/new</code> - Start a new deal\n\
         🔍 <code>/status</code> - Check your deals\n\
         ✅ <code>/ok</code> - Confirm everything's good\n\
         ❓ <code>/help</code> - Get my help\n\n\
         💡 <b>Example:</b> Type <code>/new @seller 100 Product</code>\n\
         I'll guide you through the whole process!\n\n\
         🔒 <b>Fixed Fee:</b> {} per transaction for secure escrow service",
        money(SERVICE_FEE)
    )
}

pub fn private_welcome(first_name: &str) -> Reply {
    let text = format!(
        "👋 <b>Hello {}!</b>\n\n\
         I'm your AI Escrow Assistant, and I'm here to help make your deals safe and easy!\n\n\
         🛡️ <b>How I Help You:</b>\n\
         1️⃣ Create secure deals\n\
         2️⃣ Handle payments safely\n\
         3️⃣ Guide both parties\n\
         4️⃣ Verify transactions\n\n\
         💰 <b>Service Fee:</b>\n\
         • Fixed {} per transaction\n\
         • Automatically added to the deal\n\
         • Ensures secure escrow service\n\n\
         🌍 <b>First, let's set your preferred language:</b>",
        escape_html(first_name),
        money(SERVICE_FEE)
    );

    let keyboard = Keyboard::column(Language::ALL.into_iter().map(|lang| {
        Button::new(format!("🌐 {}", lang.label()), language_callback_data(lang.code()))
    }));

    Reply::text(text).with_keyboard(keyboard)
}

pub fn language_set(language: Language, first_name: &str) -> String {
    format!(
        "🎉 <b>Perfect! I'll speak {} with you!</b>\n\n\
         Hey {}, I'm ready to help you make safe deals!\n\n\
         💫 <b>Quick Start:</b>\n\
         1. Add me to your group chat\n\
         2. Start a deal with <code>/new</code>\n\
         3. I'll guide you step by step!\n\n\
         Need help? Just type /help anytime! 😊",
        language.label(),
        escape_html(first_name)
    )
}

pub fn language_toast(language: Language) -> String {
    format!("Language set to {}! 🌟", language.label())
}

pub const UNSUPPORTED_LANGUAGE: &str = "That language isn't supported yet. Please pick one from the list.";

pub fn help() -> String {
    format!(
        "👋 <b>Hey there! Need help? I've got you covered!</b>\n\n\
         🚀 <b>Simple Commands:</b>\n\
         • <code>/new</code> - Start a new deal\n\
         • <code>/status</code> - Check your deals\n\
         • <code>/ok</code> - Confirm everything's good\n\
         • <code>/help</code> - Get my help\n\n\
         💰 <b>Service Fee:</b>\n\
         • Fixed {fee} per transaction\n\
         • Automatically added to deal amount\n\
         • Ensures secure escrow service\n\n\
         💡 <b>Quick Example:</b>\n\
         1. Type <code>/new @seller 100 Product</code>\n\
         2. Choose payment network\n\
         3. Send payment (amount + {fee} fee)\n\
         4. Type <code>/ok</code> when done\n\n\
         🤝 <b>I'll guide you through each step!</b>\n\
         Just start a deal and I'll help you both stay safe! 😊",
        fee = money(SERVICE_FEE)
    )
}

// -- Deal creation --

pub const NEW_NEEDS_GROUP: &str = "🤔 Let's do this in a group chat where both buyer and seller are present!\n\
     Add me to your group and try again. 👥";

pub fn new_usage() -> String {
    format!(
        "👋 <b>Let me help you create a deal!</b>\n\n\
         Here's how to do it:\n\
         Type <code>/new @seller amount description</code>\n\n\
         <b>For example:</b>\n\
         <code>/new @john 100 Product</code>\n\n\
         💰 <b>Note:</b> A fixed fee of {} will be added to the transaction amount.\n\
         I'll help guide you through the rest! 🤝",
        money(SERVICE_FEE)
    )
}

pub const BAD_AMOUNT: &str = "🤔 The amount doesn't look right.\n\
     Please use a positive number, like:\n\
     <code>/new @seller 100 Product</code>";

pub const SELF_DEAL: &str = "🤔 You can't open a deal with yourself.\nPick the seller's handle, like <code>/new @seller 100 Product</code>";

pub fn description_too_long() -> String {
    format!(
        "📝 That description is too long. Please keep it under {} characters.",
        MAX_DESCRIPTION_CHARS
    )
}

pub fn seller_unknown(seller: &str, bot_username: Option<&str>) -> String {
    let bot = bot_username
        .map(|name| format!(" (@{})", escape_html(name)))
        .unwrap_or_default();
    format!(
        "👋 I see that @{} hasn't met me yet!\n\n\
         🤝 Ask them to:\n\
         1. Start a chat with me{}\n\
         2. Send me a /start message\n\
         3. Then we can create the deal!",
        escape_html(seller),
        bot
    )
}

pub fn deal_created(deal: &Deal) -> Reply {
    let tx = &deal.transaction;
    let text = format!(
        "🎉 <b>Great! Let's set up your deal #{id}</b>\n\n\
         💫 <b>Deal Summary:</b>\n\
         💰 Base Amount: {amount}\n\
         🔒 Service Fee: {fee}\n\
         💎 Total Amount: {total}\n\
         📝 For: {description}\n\
         🤝 Between: {buyer} and {seller}\n\n\
         🌟 <b>Next Step:</b>\n\
         Choose a payment network below. I'll help you pick:\n\n\
         💡 <b>Quick Guide:</b>\n\
         • BEP20: Lowest fees\n\
         • ERC20: Most secure\n\
         • Optimism: Fast &amp; cheap\n\
         • Arbitrum: Ultra fast",
        id = tx.id,
        amount = money(tx.amount),
        fee = money(tx.fee_amount),
        total = money(tx.total()),
        description = escape_html(&tx.description),
        buyer = escape_html(&deal.buyer.handle()),
        seller = escape_html(&deal.seller.handle()),
    );

    let keyboard = Keyboard::column(Network::ALL.into_iter().map(|network| {
        Button::new(
            network_info(network).button_label(network),
            chain_callback_data(network, tx.id),
        )
    }));

    Reply::text(text).with_keyboard(keyboard)
}

// -- Network selection --

pub const DEAL_MISSING_TOAST: &str = "I couldn't find that deal! Let's start a new one.";
pub const ONLY_BUYER_NETWORK: &str = "Only the buyer can select the payment network! 👀";
pub const NETWORK_UNKNOWN_TOAST: &str = "That payment network isn't available. Please pick one from the list.";
pub const NETWORK_CHOSEN_TOAST: &str = "Great choice! Let's proceed with payment! 🚀";

pub fn payment_instructions(deal: &Deal, network: Network) -> String {
    let tx = &deal.transaction;
    let info = network_info(network);
    format!(
        "🎉 <b>Perfect! Deal #{id} is ready!</b>\n\n\
         💰 <b>Amount to Send:</b> {total}\n\
         🔗 <b>Network:</b> {network} ({name})\n\
         ⚡️ <b>Speed:</b> {speed}\n\
         💸 <b>Network Fee:</b> {gas}\n\
         🛡️ <b>Security:</b> {security}\n\n\
         📤 <b>Send payment to:</b>\n\
         <code>{wallet}</code>\n\
         🔎 Explorer: {explorer}\n\n\
         🎯 <b>What's Next:</b>\n\
         1. Send {total} to the address above\n\
         2. Once sent, type: <code>/ok {id}</code>\n\
         3. I'll verify everything and help complete the deal!\n\n\
         💡 Need help? Just type /help",
        id = tx.id,
        total = money(tx.total()),
        network = network.as_str(),
        name = info.name,
        speed = info.speed,
        gas = info.gas_fee,
        security = info.security,
        wallet = info.wallet,
        explorer = info.explorer,
    )
}

pub fn group_deal_started(deal: &Deal, network: Network) -> String {
    format!(
        "🎉 <b>New Deal Started!</b>\n\n\
         💰 Amount: {}\n\
         🤝 Buyer: {}\n\
         🤝 Seller: {}\n\
         🔗 Network: {}\n\n\
         ⏳ Waiting for payment...\n\
         I'll keep everyone updated on the progress! 👀",
        money(deal.transaction.total()),
        escape_html(&deal.buyer.handle()),
        escape_html(&deal.seller.handle()),
        network.as_str()
    )
}

// -- Completion --

pub const OK_USAGE: &str = "❌ <b>Wrong Format</b>\n\nType like this:\n<code>/ok 123</code>";
pub const DEAL_NOT_FOUND: &str = "❌ Deal not found";
pub const ONLY_BUYER_CONFIRM: &str = "❌ Only the buyer can confirm";
pub const DEAL_COMPLETED: &str = "✅ Deal completed!";

pub fn group_deal_completed(deal: &Deal) -> String {
    format!(
        "✅ <b>Deal #{} Complete!</b>\n\n\
         💰 Amount: {}\n\
         👤 Buyer: {}\n\
         👤 Seller: {}\n\n\
         🎉 Everyone happy!",
        deal.transaction.id,
        money(deal.transaction.total()),
        escape_html(&deal.buyer.handle()),
        escape_html(&deal.seller.handle()),
    )
}

// -- Status --

pub const NO_GROUP_DEALS: &str = "No active deals in this group";
pub const NO_PRIVATE_DEALS: &str = "No deals found.\nCreate new deal with /new in group chat";

pub fn group_status(deals: &[Deal]) -> String {
    let mut out = String::from("🔍 <b>Recent Deals</b>\n\n");
    for deal in deals {
        let tx = &deal.transaction;
        out.push_str(&format!(
            "💫 <b>Deal #{}</b>\n💰 Amount: {}\n👤 Buyer: {}\n👤 Seller: {}\n📊 Status: {}\n{}\n",
            tx.id,
            money(tx.total()),
            escape_html(&deal.buyer.handle()),
            escape_html(&deal.seller.handle()),
            tx.status,
            DIVIDER
        ));
    }
    out
}

/// Telegram's cap on one message, in UTF-16 code units.
pub const MESSAGE_LIMIT: usize = 4096;

/// Every deal the caller is part of, as one or more messages. Entries are
/// never split across messages.
pub fn private_status(as_buyer: &[Deal], as_seller: &[Deal]) -> Vec<String> {
    let mut entries = Vec::with_capacity(as_buyer.len() + as_seller.len());

    for (i, deal) in as_buyer.iter().enumerate() {
        let tx = &deal.transaction;
        let heading = if i == 0 { "💳 <b>As Buyer:</b>\n" } else { "" };
        entries.push(format!(
            "{}📝 <b>#{}</b>\n💰 Amount: {}\n👤 Seller: {}\n📊 Status: {}\n{}\n",
            heading,
            tx.id,
            money(tx.total()),
            escape_html(&deal.seller.handle()),
            tx.status,
            DIVIDER
        ));
    }

    for (i, deal) in as_seller.iter().enumerate() {
        let tx = &deal.transaction;
        let heading = if i == 0 { "\n🏦 <b>As Seller:</b>\n" } else { "" };
        entries.push(format!(
            "{}📝 <b>#{}</b>\n💰 Amount: {}\n👤 Buyer: {}\n📊 Status: {}\n{}\n",
            heading,
            tx.id,
            money(tx.total()),
            escape_html(&deal.buyer.handle()),
            tx.status,
            DIVIDER
        ));
    }

    paginate("🔍 <b>Your Deals</b>\n\n", entries)
}

/// Pack `entries` after `header` into as few messages as fit under
/// [`MESSAGE_LIMIT`].
fn paginate(header: &str, entries: Vec<String>) -> Vec<String> {
    let mut pages = Vec::new();
    let mut page = header.to_string();
    let mut page_len = utf16_len(header);
    let mut has_entries = false;

    for entry in entries {
        let entry_len = utf16_len(&entry);
        if has_entries && page_len + entry_len > MESSAGE_LIMIT {
            pages.push(std::mem::take(&mut page));
            page_len = 0;
        }
        page.push_str(&entry);
        page_len += entry_len;
        has_entries = true;
    }

    pages.push(page);
    pages
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

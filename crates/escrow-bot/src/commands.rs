//! Parsing of inbound command text and callback payloads.
//!
//! Nothing here touches the store; the dispatcher uses these to pick a
//! handler and the handlers use them to validate their arguments.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use escrow_types::models::{MAX_AMOUNT, Network};

/// Slash commands the bot answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/new <@seller> <amount> <description...>`
    New(Vec<String>),
    Status,
    /// `/ok <id>`
    Ok(Vec<String>),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::New(_) => "new",
            Self::Status => "status",
            Self::Ok(_) => "ok",
        }
    }
}

/// Inline-button payloads, by prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// `lang_<code>`
    Language(String),
    /// `chain_<NETWORK>_<transaction id>`, unvalidated
    Chain(String),
}

pub const LANGUAGE_PREFIX: &str = "lang_";
pub const CHAIN_PREFIX: &str = "chain_";

/// Parse a message into a command. Returns `None` for plain text, unknown
/// commands, and commands addressed to a different bot (`/new@OtherBot`).
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let mut words = text.split_whitespace();
    let head = words.next()?.strip_prefix('/')?;

    let name = match head.split_once('@') {
        Some((name, mention)) => {
            if let Some(me) = bot_username {
                if !mention.eq_ignore_ascii_case(me.trim_start_matches('@')) {
                    return None;
                }
            }
            name
        }
        None => head,
    };

    let args = || words.map(str::to_string).collect::<Vec<_>>();

    match name.to_ascii_lowercase().as_str() {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "new" => Some(Command::New(args())),
        "status" => Some(Command::Status),
        "ok" => Some(Command::Ok(args())),
        _ => None,
    }
}

pub fn parse_callback(data: &str) -> Option<CallbackAction> {
    if let Some(code) = data.strip_prefix(LANGUAGE_PREFIX) {
        return Some(CallbackAction::Language(code.to_string()));
    }
    if let Some(rest) = data.strip_prefix(CHAIN_PREFIX) {
        return Some(CallbackAction::Chain(rest.to_string()));
    }
    None
}

pub fn chain_callback_data(network: Network, transaction_id: i64) -> String {
    format!("{}{}_{}", CHAIN_PREFIX, network.as_str(), transaction_id)
}

pub fn language_callback_data(code: &str) -> String {
    format!("{}{}", LANGUAGE_PREFIX, code)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("malformed network selection: {0}")]
    Malformed(String),
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}

/// Split a `chain_` payload (prefix already removed) into network and id.
pub fn parse_chain_payload(payload: &str) -> Result<(Network, i64), PayloadError> {
    let (network, id) = payload
        .split_once('_')
        .ok_or_else(|| PayloadError::Malformed(payload.to_string()))?;

    let id: i64 = id
        .parse()
        .map_err(|_| PayloadError::Malformed(payload.to_string()))?;
    let network =
        Network::from_str(network).map_err(|_| PayloadError::UnknownNetwork(network.to_string()))?;

    Ok((network, id))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("not a number: {0}")]
    NotANumber(String),
    #[error("amount must be positive")]
    NotPositive,
    #[error("amount exceeds the 99999999.99 maximum")]
    TooLarge,
}

/// Parse a deal amount, rounded half away from zero to cents.
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountError> {
    let value =
        Decimal::from_str(raw.trim()).map_err(|_| AmountError::NotANumber(raw.to_string()))?;
    let value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    if value <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    if value > MAX_AMOUNT {
        return Err(AmountError::TooLarge);
    }
    Ok(value)
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed service fee added to every deal: 0.50.
pub const SERVICE_FEE: Decimal = Decimal::from_parts(50, 0, 0, false, 2);

/// Largest base amount a deal may carry: 99 999 999.99 (ten digits, two decimals).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Longest accepted deal description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Returned when a stored or user-supplied label does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// -- Accounts --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub external_id: i64,
    pub username: Option<String>,
    pub language: Language,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Handle rendered for chat output, `@name` or a placeholder.
    pub fn handle(&self) -> String {
        display_handle(self.username.as_deref())
    }
}

pub fn display_handle(username: Option<&str>) -> String {
    match username {
        Some(name) if !name.is_empty() => format!("@{}", name),
        _ => "(no handle)".to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
    Es,
    Ru,
}

impl Language {
    pub const ALL: [Language; 4] = [Self::En, Self::Zh, Self::Es, Self::Ru];

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
            Self::Es => "es",
            Self::Ru => "ru",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::En => "English 🇬🇧",
            Self::Zh => "Chinese 🇨🇳",
            Self::Es => "Spanish 🇪🇸",
            Self::Ru => "Russian 🇷🇺",
        }
    }
}

impl FromStr for Language {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.code() == s)
            .ok_or_else(|| ParseError::new("language", s))
    }
}

// -- Transactions --

/// Escrow deal status. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    AwaitingPayment,
    Completed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingPayment => "awaiting_payment",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_payment" => Ok(Self::AwaitingPayment),
            "completed" => Ok(Self::Completed),
            other => Err(ParseError::new("transaction status", other)),
        }
    }
}

/// Payment rail label. No on-chain integration backs these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Network {
    Bep20,
    Erc20,
    Optimism,
    Arbitrum,
}

impl Network {
    pub const ALL: [Network; 4] = [Self::Bep20, Self::Erc20, Self::Optimism, Self::Arbitrum];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bep20 => "BEP20",
            Self::Erc20 => "ERC20",
            Self::Optimism => "OPTIMISM",
            Self::Arbitrum => "ARBITRUM",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| ParseError::new("network", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub amount: Decimal,
    pub description: String,
    pub status: TransactionStatus,
    pub network: Option<Network>,
    pub fee_amount: Decimal,
    pub fee_paid: bool,
    /// Group chat the deal was opened in.
    pub chat_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub network_selected_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// What the buyer sends: base amount plus the service fee.
    pub fn total(&self) -> Decimal {
        self.amount + self.fee_amount
    }
}

/// One side of a deal, resolved from the accounts table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub account_id: i64,
    pub external_id: i64,
    pub username: Option<String>,
}

impl Party {
    pub fn handle(&self) -> String {
        display_handle(self.username.as_deref())
    }
}

/// A transaction together with both parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub transaction: Transaction,
    pub buyer: Party,
    pub seller: Party,
}

impl Deal {
    pub fn is_buyer(&self, external_id: i64) -> bool {
        self.buyer.external_id == external_id
    }
}

// -- Disputes --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisputeStatus {
    Open,
    Resolved,
}

impl DisputeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
        }
    }
}

impl FromStr for DisputeStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "resolved" => Ok(Self::Resolved),
            other => Err(ParseError::new("dispute status", other)),
        }
    }
}

/// A claim against a transaction. Stored only; nothing opens or resolves one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub id: i64,
    pub transaction_id: i64,
    pub created_by_id: i64,
    pub reason: String,
    pub status: DisputeStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
}

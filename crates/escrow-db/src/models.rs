//! Database row types. These map directly to SQLite rows.
//! Timestamps and money are TEXT columns; `into_model` parses them into
//! the escrow-types domain models.
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;

use escrow_types::models::{Account, Deal, Dispute, Network, Party, Transaction};

pub struct AccountRow {
    pub id: i64,
    pub external_id: i64,
    pub username: Option<String>,
    pub language: String,
    pub created_at: String,
}

impl AccountRow {
    pub fn into_model(self) -> Result<Account> {
        Ok(Account {
            id: self.id,
            external_id: self.external_id,
            username: self.username,
            language: self.language.parse()?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

pub struct TransactionRow {
    pub id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub amount: String,
    pub description: String,
    pub status: String,
    pub network: Option<String>,
    pub fee_amount: String,
    pub fee_paid: bool,
    pub chat_id: Option<i64>,
    pub created_at: String,
    pub network_selected_at: Option<String>,
    pub completed_at: Option<String>,
}

impl TransactionRow {
    pub fn into_model(self) -> Result<Transaction> {
        Ok(Transaction {
            id: self.id,
            buyer_id: self.buyer_id,
            seller_id: self.seller_id,
            amount: parse_money(&self.amount)
                .with_context(|| format!("transaction {} amount", self.id))?,
            description: self.description,
            status: self.status.parse()?,
            network: self.network.as_deref().map(str::parse::<Network>).transpose()?,
            fee_amount: parse_money(&self.fee_amount)
                .with_context(|| format!("transaction {} fee", self.id))?,
            fee_paid: self.fee_paid,
            chat_id: self.chat_id,
            created_at: parse_timestamp(&self.created_at)?,
            network_selected_at: self.network_selected_at.as_deref().map(parse_timestamp).transpose()?,
            completed_at: self.completed_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

/// A transaction joined with both parties' accounts.
pub struct DealRow {
    pub transaction: TransactionRow,
    pub buyer_external_id: i64,
    pub buyer_username: Option<String>,
    pub seller_external_id: i64,
    pub seller_username: Option<String>,
}

impl DealRow {
    pub fn into_model(self) -> Result<Deal> {
        let transaction = self.transaction.into_model()?;
        Ok(Deal {
            buyer: Party {
                account_id: transaction.buyer_id,
                external_id: self.buyer_external_id,
                username: self.buyer_username,
            },
            seller: Party {
                account_id: transaction.seller_id,
                external_id: self.seller_external_id,
                username: self.seller_username,
            },
            transaction,
        })
    }
}

pub struct DisputeRow {
    pub id: i64,
    pub transaction_id: i64,
    pub created_by_id: i64,
    pub reason: String,
    pub status: String,
    pub created_at: String,
    pub resolved_at: Option<String>,
    pub resolution_notes: Option<String>,
}

impl DisputeRow {
    pub fn into_model(self) -> Result<Dispute> {
        Ok(Dispute {
            id: self.id,
            transaction_id: self.transaction_id,
            created_by_id: self.created_by_id,
            reason: self.reason,
            status: self.status.parse()?,
            created_at: parse_timestamp(&self.created_at)?,
            resolved_at: self.resolved_at.as_deref().map(parse_timestamp).transpose()?,
            resolution_notes: self.resolution_notes,
        })
    }
}

/// Fixed-width UTC timestamps so lexical order in SQL matches time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone; treat it as UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("corrupt timestamp '{}'", raw))
}

/// Money is stored with exactly two decimal places.
pub fn format_money(amount: Decimal) -> String {
    let mut scaled = amount.round_dp(2);
    scaled.rescale(2);
    scaled.to_string()
}

pub fn parse_money(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).with_context(|| format!("corrupt amount '{}'", raw))
}

use crate::Database;
use crate::models::{
    AccountRow, DealRow, DisputeRow, TransactionRow, format_money, format_timestamp,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use tracing::info;

use escrow_types::models::{
    Account, Deal, Dispute, Language, Network, Transaction, TransactionStatus,
};

const ACCOUNT_COLUMNS: &str = "id, external_id, username, language, created_at";

const DEAL_SELECT: &str = "
    SELECT t.id, t.buyer_id, t.seller_id, t.amount, t.description, t.status, t.network,
           t.fee_amount, t.fee_paid, t.chat_id, t.created_at, t.network_selected_at,
           t.completed_at, b.external_id, b.username, s.external_id, s.username
    FROM transactions t
    JOIN accounts b ON b.id = t.buyer_id
    JOIN accounts s ON s.id = t.seller_id";

/// Input for a freshly opened deal.
#[derive(Debug, Clone)]
pub struct NewTransaction<'a> {
    pub buyer_id: i64,
    pub seller_id: i64,
    pub amount: Decimal,
    pub description: &'a str,
    pub fee_amount: Decimal,
    pub chat_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Database {
    // -- Accounts --

    /// Insert the account on first sight, otherwise refresh its handle.
    /// A missing handle never erases a known one. A handle belongs to one
    /// account at a time: storing it takes it away from any other account.
    pub fn upsert_account(
        &self,
        external_id: i64,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Account> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let account = upsert_account(&tx, external_id, username, now)?;
            tx.commit()?;
            Ok(account)
        })
    }

    pub fn set_language(
        &self,
        external_id: i64,
        username: Option<&str>,
        language: Language,
        now: DateTime<Utc>,
    ) -> Result<Account> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            upsert_account(&tx, external_id, username, now)?;
            tx.execute(
                "UPDATE accounts SET language = ?2 WHERE external_id = ?1",
                rusqlite::params![external_id, language.code()],
            )?;
            let account = query_account_by_external_id(&tx, external_id)?
                .ok_or_else(|| anyhow::anyhow!("Account vanished: {}", external_id))?;
            tx.commit()?;
            Ok(account)
        })
    }

    pub fn get_account_by_external_id(&self, external_id: i64) -> Result<Option<Account>> {
        self.with_conn(|conn| query_account_by_external_id(conn, external_id))
    }

    /// Case-insensitive handle lookup; a leading `@` is ignored.
    pub fn find_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let username = username.trim_start_matches('@');
        if username.is_empty() {
            return Ok(None);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM accounts WHERE username = ?1 COLLATE NOCASE ORDER BY id DESC LIMIT 1",
                ACCOUNT_COLUMNS
            );
            let row = conn.query_row(&sql, [username], account_row).optional()?;
            row.map(AccountRow::into_model).transpose()
        })
    }

    // -- Transactions --

    pub fn insert_transaction(&self, new: &NewTransaction<'_>) -> Result<Transaction> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO transactions
                    (buyer_id, seller_id, amount, description, status, fee_amount, fee_paid, chat_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)",
                rusqlite::params![
                    new.buyer_id,
                    new.seller_id,
                    format_money(new.amount),
                    new.description,
                    TransactionStatus::AwaitingPayment.as_str(),
                    format_money(new.fee_amount),
                    new.chat_id,
                    format_timestamp(new.created_at),
                ],
            )?;
            let id = conn.last_insert_rowid();

            Ok(Transaction {
                id,
                buyer_id: new.buyer_id,
                seller_id: new.seller_id,
                amount: new.amount.round_dp(2),
                description: new.description.to_string(),
                status: TransactionStatus::AwaitingPayment,
                network: None,
                fee_amount: new.fee_amount,
                fee_paid: false,
                chat_id: new.chat_id,
                created_at: new.created_at,
                network_selected_at: None,
                completed_at: None,
            })
        })
    }

    pub fn get_deal(&self, id: i64) -> Result<Option<Deal>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE t.id = ?1", DEAL_SELECT);
            let row = conn.query_row(&sql, [id], deal_row).optional()?;
            row.map(DealRow::into_model).transpose()
        })
    }

    /// Record the buyer's network choice. Status is left alone.
    /// Returns false when no such transaction exists.
    pub fn set_network(&self, id: i64, network: Network, now: DateTime<Utc>) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE transactions SET network = ?2, network_selected_at = ?3 WHERE id = ?1",
                rusqlite::params![id, network.as_str(), format_timestamp(now)],
            )?;
            Ok(changed == 1)
        })
    }

    /// Mark the deal completed and the fee as paid. Repeating this on a
    /// completed deal rewrites the same fields with a fresh timestamp.
    pub fn complete_transaction(&self, id: i64, now: DateTime<Utc>) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE transactions SET status = ?2, completed_at = ?3, fee_paid = 1 WHERE id = ?1",
                rusqlite::params![id, TransactionStatus::Completed.as_str(), format_timestamp(now)],
            )?;
            Ok(changed == 1)
        })
    }

    /// Most recent deals opened in a group chat, newest first.
    pub fn recent_deals_for_chat(&self, chat_id: i64, limit: u32) -> Result<Vec<Deal>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE t.chat_id = ?1 ORDER BY t.created_at DESC, t.id DESC LIMIT ?2",
                DEAL_SELECT
            );
            query_deals(conn, &sql, rusqlite::params![chat_id, limit])
        })
    }

    /// Every deal where the account with this platform id is the buyer.
    pub fn deals_as_buyer(&self, external_id: i64) -> Result<Vec<Deal>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE b.external_id = ?1 ORDER BY t.id", DEAL_SELECT);
            query_deals(conn, &sql, rusqlite::params![external_id])
        })
    }

    /// Every deal where the account with this platform id is the seller.
    pub fn deals_as_seller(&self, external_id: i64) -> Result<Vec<Deal>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE s.external_id = ?1 ORDER BY t.id", DEAL_SELECT);
            query_deals(conn, &sql, rusqlite::params![external_id])
        })
    }

    // -- Disputes --

    pub fn disputes_for_transaction(&self, transaction_id: i64) -> Result<Vec<Dispute>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, transaction_id, created_by_id, reason, status, created_at, resolved_at, resolution_notes
                 FROM disputes WHERE transaction_id = ?1 ORDER BY id",
            )?;

            let rows = stmt
                .query_map([transaction_id], |row| {
                    Ok(DisputeRow {
                        id: row.get(0)?,
                        transaction_id: row.get(1)?,
                        created_by_id: row.get(2)?,
                        reason: row.get(3)?,
                        status: row.get(4)?,
                        created_at: row.get(5)?,
                        resolved_at: row.get(6)?,
                        resolution_notes: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(DisputeRow::into_model).collect()
        })
    }
}

fn upsert_account(
    conn: &Connection,
    external_id: i64,
    username: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Account> {
    if let Some(handle) = username {
        let released = conn.execute(
            "UPDATE accounts SET username = NULL
             WHERE username = ?1 COLLATE NOCASE AND external_id <> ?2",
            rusqlite::params![handle, external_id],
        )?;
        if released > 0 {
            info!("Handle @{} moved to user {}", handle, external_id);
        }
    }

    conn.execute(
        "INSERT INTO accounts (external_id, username, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(external_id) DO UPDATE
            SET username = COALESCE(excluded.username, accounts.username)",
        rusqlite::params![external_id, username, format_timestamp(now)],
    )?;

    query_account_by_external_id(conn, external_id)?
        .ok_or_else(|| anyhow::anyhow!("Account upsert lost row: {}", external_id))
}

fn query_account_by_external_id(conn: &Connection, external_id: i64) -> Result<Option<Account>> {
    let sql = format!("SELECT {} FROM accounts WHERE external_id = ?1", ACCOUNT_COLUMNS);
    let row = conn.query_row(&sql, [external_id], account_row).optional()?;
    row.map(AccountRow::into_model).transpose()
}

fn query_deals(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Deal>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, deal_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(DealRow::into_model).collect()
}

fn account_row(row: &Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        id: row.get(0)?,
        external_id: row.get(1)?,
        username: row.get(2)?,
        language: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn deal_row(row: &Row<'_>) -> rusqlite::Result<DealRow> {
    Ok(DealRow {
        transaction: TransactionRow {
            id: row.get(0)?,
            buyer_id: row.get(1)?,
            seller_id: row.get(2)?,
            amount: row.get(3)?,
            description: row.get(4)?,
            status: row.get(5)?,
            network: row.get(6)?,
            fee_amount: row.get(7)?,
            fee_paid: row.get(8)?,
            chat_id: row.get(9)?,
            created_at: row.get(10)?,
            network_selected_at: row.get(11)?,
            completed_at: row.get(12)?,
        },
        buyer_external_id: row.get(13)?,
        buyer_username: row.get(14)?,
        seller_external_id: row.get(15)?,
        seller_username: row.get(16)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const SCHEMA_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (accounts, transactions, disputes)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE accounts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id INTEGER NOT NULL UNIQUE,
                username    TEXT,
                language    TEXT NOT NULL DEFAULT 'en',
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_accounts_username
                ON accounts(username COLLATE NOCASE);

            CREATE TABLE transactions (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                buyer_id            INTEGER NOT NULL REFERENCES accounts(id),
                seller_id           INTEGER NOT NULL REFERENCES accounts(id),
                amount              TEXT NOT NULL,
                description         TEXT NOT NULL,
                status              TEXT NOT NULL DEFAULT 'awaiting_payment',
                network             TEXT,
                fee_amount          TEXT NOT NULL DEFAULT '0.50',
                fee_paid            INTEGER NOT NULL DEFAULT 0,
                chat_id             INTEGER,
                created_at          TEXT NOT NULL,
                network_selected_at TEXT,
                completed_at        TEXT,
                CHECK (buyer_id <> seller_id)
            );

            CREATE INDEX idx_transactions_chat
                ON transactions(chat_id, created_at);

            CREATE TABLE disputes (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                transaction_id   INTEGER NOT NULL REFERENCES transactions(id),
                created_by_id    INTEGER NOT NULL REFERENCES accounts(id),
                reason           TEXT NOT NULL,
                status           TEXT NOT NULL DEFAULT 'open',
                created_at       TEXT NOT NULL,
                resolved_at      TEXT,
                resolution_notes TEXT
            );

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete (schema v{})", SCHEMA_VERSION);
    Ok(())
}

//! PostgreSQL-backed ledger repository.
//!
//! Schema (created by [`LedgerRepository::ensure_schema`]):
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS bets (
//!     id           BIGSERIAL PRIMARY KEY,
//!     ticker       TEXT NOT NULL,
//!     side         TEXT NOT NULL,
//!     price_cents  INTEGER NOT NULL,
//!     count        INTEGER NOT NULL,
//!     stake_cents  BIGINT NOT NULL,
//!     mode         TEXT NOT NULL,
//!     status       TEXT NOT NULL,
//!     order_id     TEXT,
//!     outcome      TEXT,
//!     reasoning    TEXT,
//!     confidence   DOUBLE PRECISION,
//!     created_at   TIMESTAMPTZ NOT NULL,
//!     finalized_at TIMESTAMPTZ
//! );
//! ```
//!
//! A partial unique index enforces the pipeline's idempotency invariant at
//! the store level — at most one placed/simulated row per ticker — so even
//! a buggy caller cannot double-record a market.

use crate::ledger::Ledger;
use crate::models::{BetOutcome, BetStatus, ExecutionMode, LedgerEntry, NewLedgerEntry};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

/// Repository for ledger operations against PostgreSQL.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    /// Creates a repository over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Creates the bets table and its indexes if missing.
    ///
    /// # Errors
    /// Returns an error if the DDL fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS bets (
                id           BIGSERIAL PRIMARY KEY,
                ticker       TEXT NOT NULL,
                side         TEXT NOT NULL,
                price_cents  INTEGER NOT NULL,
                count        INTEGER NOT NULL,
                stake_cents  BIGINT NOT NULL,
                mode         TEXT NOT NULL,
                status       TEXT NOT NULL,
                order_id     TEXT,
                outcome      TEXT,
                reasoning    TEXT,
                confidence   DOUBLE PRECISION,
                created_at   TIMESTAMPTZ NOT NULL,
                finalized_at TIMESTAMPTZ
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS bets_one_placed_per_ticker
            ON bets (ticker)
            WHERE status IN ('placed', 'simulated')
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(r"CREATE INDEX IF NOT EXISTS bets_ticker_idx ON bets (ticker)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

const ENTRY_COLUMNS: &str = "id, ticker, side, price_cents, count, stake_cents, mode, status, \
                             order_id, outcome, reasoning, confidence, created_at, finalized_at";

fn entry_from_row(row: &PgRow) -> Result<LedgerEntry> {
    let mode: String = row.try_get("mode")?;
    let status: String = row.try_get("status")?;
    let outcome: Option<String> = row.try_get("outcome")?;

    Ok(LedgerEntry {
        id: row.try_get("id")?,
        ticker: row.try_get("ticker")?,
        side: row.try_get("side")?,
        price_cents: row.try_get("price_cents")?,
        count: row.try_get("count")?,
        stake_cents: row.try_get("stake_cents")?,
        mode: ExecutionMode::parse(&mode).ok_or_else(|| anyhow!("unknown mode: {mode}"))?,
        status: BetStatus::parse(&status).ok_or_else(|| anyhow!("unknown status: {status}"))?,
        order_id: row.try_get("order_id")?,
        outcome: outcome
            .as_deref()
            .map(|o| BetOutcome::parse(o).ok_or_else(|| anyhow!("unknown outcome: {o}")))
            .transpose()?,
        reasoning: row.try_get("reasoning")?,
        confidence: row.try_get("confidence")?,
        created_at: row.try_get("created_at")?,
        finalized_at: row.try_get("finalized_at")?,
    })
}

#[async_trait]
impl Ledger for LedgerRepository {
    async fn has_placed_bet(&self, ticker: &str) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS (
                SELECT 1 FROM bets
                WHERE ticker = $1 AND status IN ('placed', 'simulated')
            )
            ",
        )
        .bind(ticker)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn record_attempt(&self, entry: &NewLedgerEntry) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r"
            INSERT INTO bets
                (ticker, side, price_cents, count, stake_cents, mode, status,
                 reasoning, confidence, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(&entry.ticker)
        .bind(&entry.side)
        .bind(entry.price_cents)
        .bind(entry.count)
        .bind(entry.stake_cents)
        .bind(entry.mode.as_str())
        .bind(&entry.reasoning)
        .bind(entry.confidence)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn finalize(&self, id: i64, status: BetStatus, order_id: Option<&str>) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE bets
            SET status = $2, order_id = $3, finalized_at = $4
            WHERE id = $1 AND finalized_at IS NULL
            ",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(order_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() != 1 {
            bail!("ledger entry {id} missing or already finalized");
        }
        Ok(())
    }

    async fn open_entries(&self) -> Result<Vec<LedgerEntry>> {
        let sql = format!(
            r"
            SELECT {ENTRY_COLUMNS}
            FROM bets
            WHERE status = 'placed' AND outcome IS NULL
            ORDER BY created_at ASC
            "
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn record_outcome(&self, id: i64, outcome: BetOutcome) -> Result<()> {
        let result = sqlx::query(r"UPDATE bets SET outcome = $2 WHERE id = $1")
            .bind(id)
            .bind(outcome.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() != 1 {
            bail!("no ledger entry with id {id}");
        }
        Ok(())
    }
}

//! # Lock State Store
//!
//! SQLite persistence for block and transaction lock records. Two
//! independent database files mirror the deployment layout: one for
//! ChainLock data (blocks), one for InstantLock data (transactions).
//!
//! Write protocol:
//!
//! - First sighting inserts with `INSERT OR IGNORE` — first writer wins,
//!   so redelivered notifications never overwrite the seen timestamp.
//! - Lock transitions update the lock columns unconditionally; the
//!   dispatcher only issues them when a lock topic arrives, so the stored
//!   status is monotonic (false → true, never back).

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::error::MonitorError;
use crate::settings::Settings;

/// A persisted block sighting.
#[derive(Debug, Clone)]
pub struct BlockRecord {
    pub hash: String,
    pub chainlock: bool,
    pub block_seen_time: DateTime<Utc>,
    pub chainlock_seen_time: Option<DateTime<Utc>>,
}

/// A persisted transaction sighting.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub hash: String,
    pub instantlock: bool,
    pub block_seen_time: DateTime<Utc>,
    pub instantlock_seen_time: Option<DateTime<Utc>>,
}

pub struct LockStore {
    blocks: SqlitePool,
    transactions: SqlitePool,
}

async fn open_pool(path: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    // Single consumer; one connection per file keeps writes serialized.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

impl LockStore {
    /// Open (creating if missing) both database files and ensure the schema
    /// exists. Idempotent; safe to call on every startup.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let blocks = open_pool(&settings.storage.chainlock_db_path).await?;
        let transactions = open_pool(&settings.storage.instantlock_db_path).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS blocks(
                Hash TEXT,
                ChainLock BOOL,
                BlockSeenTime TEXT,
                ChainLockSeenTime TEXT,
                PRIMARY KEY (Hash)
            )",
        )
        .execute(&blocks)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS transactions(
                Hash TEXT,
                InstantLock BOOL,
                BlockSeenTime TEXT,
                InstantLockSeenTime TEXT,
                PRIMARY KEY (Hash)
            )",
        )
        .execute(&transactions)
        .await?;

        info!(
            "Lock store ready (chainlock: {}, instantlock: {})",
            settings.storage.chainlock_db_path, settings.storage.instantlock_db_path
        );

        Ok(Self {
            blocks,
            transactions,
        })
    }

    pub async fn block_exists(&self, hash: &str) -> Result<bool, MonitorError> {
        let row = sqlx::query("SELECT 1 FROM blocks WHERE Hash = ?1")
            .bind(hash)
            .fetch_optional(&self.blocks)
            .await
            .map_err(|e| MonitorError::storage(format!("blocks(hash={})", hash), e))?;
        Ok(row.is_some())
    }

    /// Insert a new block record; no-op if the hash already exists.
    pub async fn insert_block_seen(
        &self,
        hash: &str,
        chainlock: bool,
        seen_at: DateTime<Utc>,
        chainlock_seen_at: Option<DateTime<Utc>>,
    ) -> Result<(), MonitorError> {
        sqlx::query("INSERT OR IGNORE INTO blocks VALUES(?1, ?2, ?3, ?4)")
            .bind(hash)
            .bind(chainlock)
            .bind(seen_at)
            .bind(chainlock_seen_at)
            .execute(&self.blocks)
            .await
            .map_err(|e| {
                MonitorError::storage(
                    format!(
                        "blocks(hash={}, chainlock={}, seen={}, lock_seen={:?})",
                        hash, chainlock, seen_at, chainlock_seen_at
                    ),
                    e,
                )
            })?;
        Ok(())
    }

    /// Update the ChainLock columns on an existing block record.
    pub async fn update_block_lock(
        &self,
        chainlock: bool,
        chainlock_seen_at: DateTime<Utc>,
        hash: &str,
    ) -> Result<(), MonitorError> {
        sqlx::query("UPDATE blocks SET ChainLock = ?1, ChainLockSeenTime = ?2 WHERE Hash = ?3")
            .bind(chainlock)
            .bind(chainlock_seen_at)
            .bind(hash)
            .execute(&self.blocks)
            .await
            .map_err(|e| {
                MonitorError::storage(
                    format!(
                        "blocks(hash={}, chainlock={}, lock_seen={})",
                        hash, chainlock, chainlock_seen_at
                    ),
                    e,
                )
            })?;
        Ok(())
    }

    /// Load a block record, mainly for tooling and tests.
    pub async fn get_block(&self, hash: &str) -> Result<Option<BlockRecord>> {
        let row = sqlx::query(
            "SELECT Hash, ChainLock, BlockSeenTime, ChainLockSeenTime FROM blocks WHERE Hash = ?1",
        )
        .bind(hash)
        .fetch_optional(&self.blocks)
        .await?;

        match row {
            Some(row) => Ok(Some(BlockRecord {
                hash: row.try_get("Hash")?,
                chainlock: row.try_get("ChainLock")?,
                block_seen_time: row.try_get("BlockSeenTime")?,
                chainlock_seen_time: row.try_get("ChainLockSeenTime")?,
            })),
            None => Ok(None),
        }
    }

    /// Load a transaction record, mainly for tooling and tests.
    pub async fn get_transaction(&self, hash: &str) -> Result<Option<TransactionRecord>> {
        let row = sqlx::query(
            "SELECT Hash, InstantLock, BlockSeenTime, InstantLockSeenTime
             FROM transactions WHERE Hash = ?1",
        )
        .bind(hash)
        .fetch_optional(&self.transactions)
        .await?;

        match row {
            Some(row) => Ok(Some(TransactionRecord {
                hash: row.try_get("Hash")?,
                instantlock: row.try_get("InstantLock")?,
                block_seen_time: row.try_get("BlockSeenTime")?,
                instantlock_seen_time: row.try_get("InstantLockSeenTime")?,
            })),
            None => Ok(None),
        }
    }

    pub async fn tx_exists(&self, hash: &str) -> Result<bool, MonitorError> {
        let row = sqlx::query("SELECT 1 FROM transactions WHERE Hash = ?1")
            .bind(hash)
            .fetch_optional(&self.transactions)
            .await
            .map_err(|e| MonitorError::storage(format!("transactions(hash={})", hash), e))?;
        Ok(row.is_some())
    }

    /// Insert a new transaction record; no-op if the hash already exists.
    pub async fn insert_tx_seen(
        &self,
        hash: &str,
        instantlock: bool,
        seen_at: DateTime<Utc>,
        instantlock_seen_at: Option<DateTime<Utc>>,
    ) -> Result<(), MonitorError> {
        sqlx::query("INSERT OR IGNORE INTO transactions VALUES(?1, ?2, ?3, ?4)")
            .bind(hash)
            .bind(instantlock)
            .bind(seen_at)
            .bind(instantlock_seen_at)
            .execute(&self.transactions)
            .await
            .map_err(|e| {
                MonitorError::storage(
                    format!(
                        "transactions(hash={}, instantlock={}, seen={}, lock_seen={:?})",
                        hash, instantlock, seen_at, instantlock_seen_at
                    ),
                    e,
                )
            })?;
        Ok(())
    }

    /// Update the InstantLock columns on an existing transaction record.
    /// Only called for lock notifications; a lock-absent re-seen transaction
    /// leaves its stored record untouched.
    pub async fn update_tx_lock(
        &self,
        instantlock: bool,
        instantlock_seen_at: DateTime<Utc>,
        hash: &str,
    ) -> Result<(), MonitorError> {
        sqlx::query(
            "UPDATE transactions SET InstantLock = ?1, InstantLockSeenTime = ?2 WHERE Hash = ?3",
        )
        .bind(instantlock)
        .bind(instantlock_seen_at)
        .bind(hash)
        .execute(&self.transactions)
        .await
        .map_err(|e| {
            MonitorError::storage(
                format!(
                    "transactions(hash={}, instantlock={}, lock_seen={})",
                    hash, instantlock, instantlock_seen_at
                ),
                e,
            )
        })?;
        Ok(())
    }
}

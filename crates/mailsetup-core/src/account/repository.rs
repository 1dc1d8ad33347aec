//! Account storage repository.

use std::future::Future;
use std::sync::Arc;

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use super::model::{AccountFlags, AccountId, AccountRecord, ConnectionDescriptor, HostAuthFlags, Protocol};
use crate::{Error, Result};

/// Durable storage for provisioned accounts.
///
/// Uniqueness policy belongs to the store; the pipeline inserts every
/// request it accepts.
pub trait AccountStore: Send + Sync {
    /// Writes `record` and returns its identifier.
    ///
    /// `Ok(None)` means the store accepted the call but produced no
    /// identifier.
    fn insert(
        &self,
        record: &AccountRecord,
    ) -> impl Future<Output = Result<Option<AccountId>>> + Send;
}

impl<T: AccountStore> AccountStore for Arc<T> {
    fn insert(
        &self,
        record: &AccountRecord,
    ) -> impl Future<Output = Result<Option<AccountId>>> + Send {
        (**self).insert(record)
    }
}

/// SQLite-backed account store.
///
/// Passwords are not written to the database; the identity registrar
/// keeps them in the system keyring.
#[derive(Debug, Clone)]
pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    /// Create a new store with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                display_name TEXT NOT NULL,
                email TEXT NOT NULL,
                flags INTEGER NOT NULL,
                in_protocol TEXT NOT NULL,
                in_host TEXT NOT NULL,
                in_port INTEGER NOT NULL,
                in_flags INTEGER NOT NULL,
                in_login TEXT NOT NULL,
                out_protocol TEXT NOT NULL,
                out_host TEXT NOT NULL,
                out_port INTEGER NOT NULL,
                out_flags INTEGER NOT NULL,
                out_login TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get all accounts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<(AccountId, AccountRecord)>> {
        let rows = sqlx::query(
            r"
            SELECT id, display_name, email, flags,
                   in_protocol, in_host, in_port, in_flags, in_login,
                   out_protocol, out_host, out_port, out_flags, out_login
            FROM accounts
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok((AccountId::new(row.get("id")), row_to_record(row)?)))
            .collect()
    }

    /// Get account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: AccountId) -> Result<Option<AccountRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, display_name, email, flags,
                   in_protocol, in_host, in_port, in_flags, in_login,
                   out_protocol, out_host, out_port, out_flags, out_login
            FROM accounts
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, id: AccountId) -> Result<()> {
        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        debug!("Deleted account {id}");
        Ok(())
    }

    async fn insert_record(&self, record: &AccountRecord) -> Result<Option<AccountId>> {
        let result = sqlx::query(
            r"
            INSERT INTO accounts (
                display_name, email, flags,
                in_protocol, in_host, in_port, in_flags, in_login,
                out_protocol, out_host, out_port, out_flags, out_login
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&record.display_name)
        .bind(&record.email)
        .bind(i64::from(record.flags.bits()))
        .bind(record.incoming.protocol.as_str())
        .bind(&record.incoming.host)
        .bind(i64::from(record.incoming.port))
        .bind(i64::from(record.incoming.flags.bits()))
        .bind(&record.incoming.login)
        .bind(record.outgoing.protocol.as_str())
        .bind(&record.outgoing.host)
        .bind(i64::from(record.outgoing.port))
        .bind(i64::from(record.outgoing.flags.bits()))
        .bind(&record.outgoing.login)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        let id = AccountId::new(result.last_insert_rowid());
        debug!("Stored account {} as {id}", record.email);
        Ok(Some(id))
    }
}

impl AccountStore for SqliteAccountStore {
    fn insert(
        &self,
        record: &AccountRecord,
    ) -> impl Future<Output = Result<Option<AccountId>>> + Send {
        self.insert_record(record)
    }
}

/// Convert a database row to an account record.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<AccountRecord> {
    Ok(AccountRecord {
        display_name: row.get("display_name"),
        email: row.get("email"),
        flags: AccountFlags::from_bits(row.get::<i64, _>("flags") as u32),
        incoming: ConnectionDescriptor {
            protocol: string_to_protocol(row.get("in_protocol"))?,
            host: row.get("in_host"),
            port: row.get::<i64, _>("in_port") as u16,
            flags: HostAuthFlags::from_bits(row.get::<i64, _>("in_flags") as u32),
            login: row.get("in_login"),
            password: String::new(),
        },
        outgoing: ConnectionDescriptor {
            protocol: string_to_protocol(row.get("out_protocol"))?,
            host: row.get("out_host"),
            port: row.get::<i64, _>("out_port") as u16,
            flags: HostAuthFlags::from_bits(row.get::<i64, _>("out_flags") as u32),
            login: row.get("out_login"),
            password: String::new(),
        },
    })
}

fn string_to_protocol(s: &str) -> Result<Protocol> {
    Protocol::from_scheme(s).ok_or_else(|| Error::Config(format!("Unknown protocol in store: {s}")))
}

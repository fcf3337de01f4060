//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. `DatabasePool` pairs a
//! read-only pool sized by [`DatabaseConfig`] for concurrent lookups with a
//! single-connection writer pool for serialized inserts. Both use WAL
//! journal mode and enforce foreign keys; migrations run on the writer
//! before the reader opens, so the reader never sees a missing schema.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use tanyabot_types::config::DatabaseConfig;

/// Split read/write pool for SQLite with WAL mode.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if missing) and migrate the database at `database_url`,
    /// with pool sizing and busy timeout taken from `config`.
    pub async fn new(database_url: &str, config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let connect_opts = Self::connect_options(database_url, config)?;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_opts.clone())
            .await?;
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(config.reader_connections)
            .connect_with(connect_opts.read_only(true))
            .await?;

        Ok(Self { reader, writer })
    }

    fn connect_options(
        database_url: &str,
        config: &DatabaseConfig,
    ) -> Result<SqliteConnectOptions, sqlx::Error> {
        Ok(SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .create_if_missing(true))
    }
}

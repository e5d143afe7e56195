//! PostgreSQL store

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Pool, Postgres,
};

use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult, RejectReason},
    models::{Book, Borrowing, Member},
};

use super::{Snapshot, Store, Transaction};

/// Store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Open a pool with acquire and statement timeouts taken from configuration
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options: PgConnectOptions = config
            .url
            .parse::<PgConnectOptions>()?
            .options([(
                "statement_timeout",
                format!("{}s", config.statement_timeout_secs),
            )]);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))
    }
}

/// Open database transaction; rolled back by sqlx when dropped uncommitted
pub struct PgTransaction {
    pub(crate) tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn Transaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn snapshot(&self) -> AppResult<Snapshot> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY id")
            .fetch_all(&mut *tx)
            .await?;
        let members = sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY id")
            .fetch_all(&mut *tx)
            .await?;
        let borrowings = sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings ORDER BY id")
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Snapshot {
            books,
            members,
            borrowings,
        })
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Translate schema constraint violations into domain errors
pub(crate) fn constraint_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = err {
        match db.constraint() {
            Some("borrowings_open_loan_idx") => {
                return AppError::Rejected(RejectReason::DuplicateLoan)
            }
            Some("books_available_copies_check") => {
                return AppError::Rejected(RejectReason::BookUnavailable)
            }
            Some("books_isbn_key") => {
                return AppError::Conflict("Book with this ISBN already exists".to_string())
            }
            Some("members_email_key") => {
                return AppError::Conflict("Member with this email already exists".to_string())
            }
            _ => {}
        }
    }
    AppError::from(err)
}

/// `%term%` pattern for case-insensitive LIKE searches
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .to_uppercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

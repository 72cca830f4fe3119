//! PostgreSQL Repository Implementations
//!
//! One [`PgUnitOfWork`] wraps one database transaction; every repository
//! trait is implemented on it, split by entity family across the
//! submodules. The schema has no `ON DELETE CASCADE`, so foreign keys
//! reject any delete that would orphan a row.

mod cards;
mod categories;
mod modules;
mod results;
mod selections;
mod users;

use sqlx::postgres::{PgConnection, PgPool, PgQueryResult};
use sqlx::{Postgres, Transaction};

use crate::domain::repository::{StoreError, StoreResult, UnitOfWork, UnitOfWorkFactory};

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl UnitOfWorkFactory for PgStore {
    type Uow = PgUnitOfWork;

    async fn begin(&self) -> StoreResult<PgUnitOfWork> {
        let tx = self.pool.begin().await?;
        Ok(PgUnitOfWork { tx: Some(tx) })
    }
}

/// Transaction-scoped handle for every entity family
///
/// Dropping it unfinished rolls the transaction back.
pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> StoreResult<&mut PgConnection> {
        self.tx.as_deref_mut().ok_or(StoreError::Closed)
    }
}

impl UnitOfWork for PgUnitOfWork {
    async fn commit(&mut self) -> StoreResult<()> {
        let tx = self.tx.take().ok_or(StoreError::Closed)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let constraint = db.constraint().unwrap_or("unknown").to_string();
            if db.is_unique_violation() {
                return StoreError::UniqueViolation(constraint);
            }
            if db.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(constraint);
            }
        }
        if matches!(err, sqlx::Error::RowNotFound) {
            return StoreError::NotFound("row");
        }
        StoreError::backend(err)
    }
}

/// Update or delete that must hit exactly one row
fn one_row(result: PgQueryResult, table: &'static str) -> StoreResult<()> {
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(table));
    }
    Ok(())
}

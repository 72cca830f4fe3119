//! Unit-of-work lifecycle
//!
//! Every use case opens a unit of work, runs its steps against the
//! transaction-scoped handles and hands the outcome to [`finish`], which
//! commits exactly once on success and rolls back on any error.

use crate::domain::repository::{UnitOfWork, UnitOfWorkFactory};
use crate::error::{LearningError, LearningResult};

pub(crate) async fn begin<F>(store: &F) -> LearningResult<F::Uow>
where
    F: UnitOfWorkFactory,
{
    store.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to begin unit of work");
        LearningError::Internal(format!("begin failed: {e}"))
    })
}

pub(crate) async fn finish<U, T>(mut uow: U, outcome: LearningResult<T>) -> LearningResult<T>
where
    U: UnitOfWork,
{
    match outcome {
        Ok(value) => {
            uow.commit().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to commit unit of work");
                LearningError::Internal(format!("commit failed: {e}"))
            })?;
            Ok(value)
        }
        Err(err) => {
            if let Err(e) = uow.rollback().await {
                tracing::warn!(error = %e, "Rollback failed");
            }
            Err(err)
        }
    }
}

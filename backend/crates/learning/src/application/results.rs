//! Results Use Case
//!
//! Recording, reading and deleting practice results. Results of a single
//! module attempt hang off a module result link; a category practice
//! session gets one store-generated group id shared by one result per
//! attempted module.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{CategoryId, CategoryResultId, ModuleId, ResultId, UserId};

use crate::application::cascade::{self, ResultLink};
use crate::application::locks::{Family, FamilyLocks};
use crate::application::ownership::{ensure_owner, visible_category, visible_module};
use crate::application::unit_of_work::{begin, finish};
use crate::domain::aggregation::{fold_category_rows, fold_single_group};
use crate::domain::entities::{
    CardResult, CategoryModulesResult, ModuleResult, NewCategoryResult, NewModuleAttempt,
};
use crate::domain::repository::{
    CardResultRepository, CategoryModuleRepository, CategoryResultRepository,
    ModuleResultRepository, UnitOfWork, UnitOfWorkFactory,
};
use crate::error::{LearningError, LearningResult};

/// Insert category result output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertCategoryResultOutput {
    pub group_id: CategoryResultId,
    pub result_ids: Vec<ResultId>,
}

/// Everything recorded by one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerResults {
    pub categories: Vec<CategoryModulesResult>,
    pub modules: Vec<ModuleResult>,
}

pub struct ResultsUseCase<F>
where
    F: UnitOfWorkFactory,
{
    store: Arc<F>,
    locks: Arc<FamilyLocks>,
}

impl<F> ResultsUseCase<F>
where
    F: UnitOfWorkFactory,
{
    pub fn new(store: Arc<F>, locks: Arc<FamilyLocks>) -> Self {
        Self { store, locks }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    pub async fn insert_module_result(
        &self,
        actor: UserId,
        time: DateTime<Utc>,
        attempt: NewModuleAttempt,
    ) -> LearningResult<ResultId> {
        let _guard = self
            .locks
            .acquire(&[Family::Results, Family::CardResults, Family::ModuleResults])
            .await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            visible_module(&mut uow, actor, attempt.module_id).await?;
            let result_id = record_attempt(&mut uow, &attempt).await?;
            uow.insert_module_result(result_id, attempt.module_id, actor, time)
                .await?;
            Ok(result_id)
        }
        .await;
        let result_id = finish(uow, outcome).await?;

        tracing::info!(
            result_id = %result_id,
            module_id = %attempt.module_id,
            owner_id = %actor,
            "Module result recorded"
        );
        Ok(result_id)
    }

    /// Record one category practice session
    ///
    /// ## Arguments
    /// * `input` - Attempted modules; each must be a member of the category
    ///   and the list must not be empty
    ///
    /// ## Returns
    /// The store-generated group id and one result id per module, in input order
    pub async fn insert_category_result(
        &self,
        actor: UserId,
        input: NewCategoryResult,
    ) -> LearningResult<InsertCategoryResultOutput> {
        // Group ids are only drawn for sessions with at least one module
        if input.modules.is_empty() {
            return Err(LearningError::InvalidInput(
                "category result needs at least one module".to_string(),
            ));
        }

        let _guard = self
            .locks
            .acquire(&[Family::Results, Family::CardResults, Family::CategoryResults])
            .await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            visible_category(&mut uow, actor, input.category_id).await?;
            let members = uow.module_ids_of_category(input.category_id).await?;
            if let Some(attempt) = input.modules.iter().find(|a| !members.contains(&a.module_id)) {
                return Err(LearningError::not_found("category module", attempt.module_id));
            }

            let group_id = uow.next_category_result_id().await?;
            let mut result_ids = Vec::with_capacity(input.modules.len());
            for attempt in &input.modules {
                let result_id = record_attempt(&mut uow, attempt).await?;
                uow.insert_category_result_row(
                    group_id,
                    input.category_id,
                    attempt.module_id,
                    result_id,
                    actor,
                    input.time,
                )
                .await?;
                result_ids.push(result_id);
            }
            Ok(InsertCategoryResultOutput {
                group_id,
                result_ids,
            })
        }
        .await;
        let output = finish(uow, outcome).await?;

        tracing::info!(
            group_id = %output.group_id,
            category_id = %input.category_id,
            modules = output.result_ids.len(),
            "Category result recorded"
        );
        Ok(output)
    }

    pub async fn delete_module_result(
        &self,
        actor: UserId,
        result_id: ResultId,
    ) -> LearningResult<()> {
        let _guard = self
            .locks
            .acquire(&[Family::Results, Family::CardResults, Family::ModuleResults])
            .await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let found = uow
                .find_module_result(result_id)
                .await?
                .ok_or_else(|| LearningError::not_found("result", result_id))?;
            ensure_owner(actor, found.result.owner_id, "result", result_id)?;
            cascade::purge_results(&mut uow, &[result_id], ResultLink::Module).await
        }
        .await;
        finish(uow, outcome).await?;

        tracing::info!(result_id = %result_id, "Module result deleted");
        Ok(())
    }

    pub async fn delete_category_result(
        &self,
        actor: UserId,
        group_id: CategoryResultId,
    ) -> LearningResult<()> {
        let _guard = self
            .locks
            .acquire(&[Family::Results, Family::CardResults, Family::CategoryResults])
            .await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let rows = uow.category_result_rows_of_group(group_id).await?;
            let owner = rows
                .first()
                .map(|row| row.owner_id)
                .ok_or_else(|| LearningError::not_found("category result", group_id))?;
            ensure_owner(actor, owner, "category result", group_id)?;

            let ids: Vec<ResultId> = rows.iter().map(|row| row.result_id).collect();
            cascade::purge_results(&mut uow, &ids, ResultLink::Category).await
        }
        .await;
        finish(uow, outcome).await?;

        tracing::info!(group_id = %group_id, "Category result deleted");
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn results_of_owner(&self, actor: UserId) -> LearningResult<OwnerResults> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let rows = uow.category_result_rows_of_owner(actor).await?;
            let modules = uow.module_results_of_owner(actor).await?;
            Ok(OwnerResults {
                categories: fold_category_rows(rows),
                modules,
            })
        }
        .await;
        finish(uow, outcome).await
    }

    pub async fn module_results(
        &self,
        actor: UserId,
        module_id: ModuleId,
    ) -> LearningResult<Vec<ModuleResult>> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            visible_module(&mut uow, actor, module_id).await?;
            Ok(uow.module_results_of_module_owner(module_id, actor).await?)
        }
        .await;
        finish(uow, outcome).await
    }

    pub async fn category_results(
        &self,
        actor: UserId,
        category_id: CategoryId,
    ) -> LearningResult<Vec<CategoryModulesResult>> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            visible_category(&mut uow, actor, category_id).await?;
            let rows = uow
                .category_result_rows_of_category_owner(category_id, actor)
                .await?;
            Ok(fold_category_rows(rows))
        }
        .await;
        finish(uow, outcome).await
    }

    /// One group with per-card outcomes attached
    pub async fn category_result(
        &self,
        actor: UserId,
        group_id: CategoryResultId,
    ) -> LearningResult<CategoryModulesResult> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let rows = uow.category_result_rows_of_group(group_id).await?;
            let mut group = fold_single_group(rows)
                .ok_or_else(|| LearningError::not_found("category result", group_id))?;
            ensure_owner(actor, group.owner_id, "category result", group_id)?;

            for module in &mut group.modules {
                module.result.card_results = uow.card_results_of(module.result.id).await?;
            }
            Ok(group)
        }
        .await;
        finish(uow, outcome).await
    }

    pub async fn module_result(
        &self,
        actor: UserId,
        result_id: ResultId,
    ) -> LearningResult<ModuleResult> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let mut found = uow
                .find_module_result(result_id)
                .await?
                .ok_or_else(|| LearningError::not_found("result", result_id))?;
            ensure_owner(actor, found.result.owner_id, "result", result_id)?;
            found.result.card_results = uow.card_results_of(result_id).await?;
            Ok(found)
        }
        .await;
        finish(uow, outcome).await
    }
}

/// Result row plus its card outcomes; every card must belong to the module
async fn record_attempt<U: UnitOfWork>(
    uow: &mut U,
    attempt: &NewModuleAttempt,
) -> LearningResult<ResultId> {
    for CardResult { card_id, .. } in &attempt.card_results {
        let belongs = uow
            .find_card(*card_id)
            .await?
            .is_some_and(|card| card.module_id == attempt.module_id);
        if !belongs {
            return Err(LearningError::not_found("card", *card_id));
        }
    }

    let result_id = uow.insert_result(&attempt.kind).await?;
    for card_result in &attempt.card_results {
        uow.insert_card_result(result_id, card_result).await?;
    }
    Ok(result_id)
}

//! Cascading Deletion
//!
//! Runs a [`DeletionTarget`] plan step by step on one unit of work. The
//! first failing step aborts the plan; the caller rolls back.

use kernel::id::{CategoryId, ModuleId, ResultId, UserId};

use crate::application::ownership::{
    card_owner, category_owner, ensure_owner, load_module, module_owner,
};
use crate::application::visibility;
use crate::domain::deletion::{DeletionStep, DeletionTarget, PurgeStage, RESULT_PURGE};
use crate::domain::repository::UnitOfWork;
use crate::error::LearningResult;

/// Which link table owns the results being purged
#[derive(Debug, Clone, Copy)]
pub(crate) enum ResultLink {
    Module,
    Category,
}

pub(crate) async fn execute<U: UnitOfWork>(
    uow: &mut U,
    actor: UserId,
    target: DeletionTarget,
) -> LearningResult<()> {
    for step in target.plan() {
        tracing::trace!(step = ?step, "Deletion step");
        run_step(uow, actor, step).await?;
    }
    Ok(())
}

async fn run_step<U: UnitOfWork>(uow: &mut U, actor: UserId, step: DeletionStep) -> LearningResult<()> {
    match step {
        DeletionStep::VerifyOwnership(target) => match target {
            DeletionTarget::Card(id) => ensure_owner(actor, card_owner(uow, id).await?, "card", id),
            DeletionTarget::Module(id) => {
                ensure_owner(actor, module_owner(uow, id).await?, "module", id)
            }
            DeletionTarget::Category(id) => {
                ensure_owner(actor, category_owner(uow, id).await?, "category", id)
            }
        },

        DeletionStep::DeleteCardResultsOfCard(id) => {
            uow.delete_card_results_of_card(id).await?;
            Ok(())
        }
        DeletionStep::DeleteCard(id) => Ok(uow.delete_card(id).await?),

        DeletionStep::DeleteCardsOfModule(id) => {
            for card in uow.cards_of_module(id).await? {
                uow.delete_card_results_of_card(card.id).await?;
                uow.delete_card(card.id).await?;
            }
            Ok(())
        }
        DeletionStep::DetachModuleFromCategories(id) => {
            let module = load_module(uow, id).await?;
            for category_id in uow.category_ids_of_module(id).await? {
                uow.delete_category_module(category_id, id).await?;
                visibility::on_module_removed(uow, category_id, module.module_type).await?;
            }
            Ok(())
        }
        DeletionStep::PurgeModuleResults(id) => {
            let ids = uow.module_result_ids_of_module(id).await?;
            purge_results(uow, &ids, ResultLink::Module).await
        }
        DeletionStep::PurgeCategoryResultsOfModule(id) => {
            let ids: Vec<ResultId> = uow
                .category_result_rows_of_module(id)
                .await?
                .into_iter()
                .map(|row| row.result_id)
                .collect();
            purge_results(uow, &ids, ResultLink::Category).await
        }
        DeletionStep::DeleteModuleSelections(id) => {
            uow.delete_module_selections(id).await?;
            Ok(())
        }
        DeletionStep::DeleteModule(id) => Ok(uow.delete_module(id).await?),

        DeletionStep::DetachAllModules(id) => {
            uow.delete_category_modules(id).await?;
            Ok(())
        }
        DeletionStep::PurgeCategoryResults(id) => {
            let ids: Vec<ResultId> = uow
                .category_result_rows_of_category(id)
                .await?
                .into_iter()
                .map(|row| row.result_id)
                .collect();
            purge_results(uow, &ids, ResultLink::Category).await
        }
        DeletionStep::DeleteCategorySelections(id) => {
            uow.delete_category_selections(id).await?;
            Ok(())
        }
        DeletionStep::DeleteCategory(id) => Ok(uow.delete_category(id).await?),
    }
}

/// Remove results with their card outcomes and link rows
pub(crate) async fn purge_results<U: UnitOfWork>(
    uow: &mut U,
    ids: &[ResultId],
    link: ResultLink,
) -> LearningResult<()> {
    for stage in RESULT_PURGE {
        for &id in ids {
            match stage {
                PurgeStage::CardResults => {
                    uow.delete_card_results_of_result(id).await?;
                }
                PurgeStage::Links => match link {
                    ResultLink::Module => uow.delete_module_result(id).await?,
                    ResultLink::Category => uow.delete_category_result_row(id).await?,
                },
                PurgeStage::Results => uow.delete_result(id).await?,
            }
        }
    }
    Ok(())
}

/// Results of `module_id` within the groups of `category_id`
pub(crate) async fn purge_category_module_results<U: UnitOfWork>(
    uow: &mut U,
    category_id: CategoryId,
    module_id: ModuleId,
) -> LearningResult<usize> {
    let ids: Vec<ResultId> = uow
        .category_result_rows_of_category(category_id)
        .await?
        .into_iter()
        .filter(|row| row.module_id == module_id)
        .map(|row| row.result_id)
        .collect();
    purge_results(uow, &ids, ResultLink::Category).await?;
    Ok(ids.len())
}

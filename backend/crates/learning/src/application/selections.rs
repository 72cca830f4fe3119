//! Selections Use Case
//!
//! Bookmarks ("selected" modules and categories) and popularity counts.

use std::sync::Arc;

use kernel::id::{CategoryId, ModuleId, UserId};

use crate::application::locks::{Family, FamilyLocks};
use crate::application::ownership::{load_category, load_module, visible_category, visible_module};
use crate::application::unit_of_work::{begin, finish};
use crate::domain::entities::{Category, Module};
use crate::domain::repository::{SelectionRepository, StoreError, UnitOfWorkFactory};
use crate::error::{LearningError, LearningResult};

pub struct SelectionsUseCase<F>
where
    F: UnitOfWorkFactory,
{
    store: Arc<F>,
    locks: Arc<FamilyLocks>,
}

impl<F> SelectionsUseCase<F>
where
    F: UnitOfWorkFactory,
{
    pub fn new(store: Arc<F>, locks: Arc<FamilyLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn select_module(&self, actor: UserId, module_id: ModuleId) -> LearningResult<()> {
        let _guard = self.locks.acquire(&[Family::Selections]).await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            visible_module(&mut uow, actor, module_id).await?;
            uow.insert_selected_module(actor, module_id)
                .await
                .map_err(|e| already_selected(e, "module"))
        }
        .await;
        finish(uow, outcome).await?;

        tracing::info!(user_id = %actor, module_id = %module_id, "Module selected");
        Ok(())
    }

    pub async fn unselect_module(&self, actor: UserId, module_id: ModuleId) -> LearningResult<()> {
        let _guard = self.locks.acquire(&[Family::Selections]).await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            uow.delete_selected_module(actor, module_id)
                .await
                .map_err(|e| not_selected(e, "module", module_id.value()))
        }
        .await;
        finish(uow, outcome).await?;

        tracing::info!(user_id = %actor, module_id = %module_id, "Module unselected");
        Ok(())
    }

    pub async fn select_category(
        &self,
        actor: UserId,
        category_id: CategoryId,
    ) -> LearningResult<()> {
        let _guard = self.locks.acquire(&[Family::Selections]).await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            visible_category(&mut uow, actor, category_id).await?;
            uow.insert_selected_category(actor, category_id)
                .await
                .map_err(|e| already_selected(e, "category"))
        }
        .await;
        finish(uow, outcome).await?;

        tracing::info!(user_id = %actor, category_id = %category_id, "Category selected");
        Ok(())
    }

    pub async fn unselect_category(
        &self,
        actor: UserId,
        category_id: CategoryId,
    ) -> LearningResult<()> {
        let _guard = self.locks.acquire(&[Family::Selections]).await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            uow.delete_selected_category(actor, category_id)
                .await
                .map_err(|e| not_selected(e, "category", category_id.value()))
        }
        .await;
        finish(uow, outcome).await?;

        tracing::info!(user_id = %actor, category_id = %category_id, "Category unselected");
        Ok(())
    }

    /// Bookmarked modules the actor can still see
    pub async fn selected_modules(&self, actor: UserId) -> LearningResult<Vec<Module>> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            Ok(uow
                .selected_modules_of_user(actor)
                .await?
                .into_iter()
                .filter(|m| m.is_visible_to(actor))
                .collect::<Vec<_>>())
        }
        .await;
        finish(uow, outcome).await
    }

    pub async fn selected_categories(&self, actor: UserId) -> LearningResult<Vec<Category>> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            Ok(uow
                .selected_categories_of_user(actor)
                .await?
                .into_iter()
                .filter(|c| c.is_visible_to(actor))
                .collect::<Vec<_>>())
        }
        .await;
        finish(uow, outcome).await
    }

    /// Distinct users that bookmarked the module
    pub async fn module_selection_count(&self, module_id: ModuleId) -> LearningResult<u64> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            load_module(&mut uow, module_id).await?;
            Ok(uow.module_selection_count(module_id).await?)
        }
        .await;
        finish(uow, outcome).await
    }

    pub async fn category_selection_count(&self, category_id: CategoryId) -> LearningResult<u64> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            load_category(&mut uow, category_id).await?;
            Ok(uow.category_selection_count(category_id).await?)
        }
        .await;
        finish(uow, outcome).await
    }
}

fn already_selected(err: StoreError, entity: &str) -> LearningError {
    match err {
        StoreError::UniqueViolation(_) => {
            LearningError::AlreadyExists(format!("{entity} is already selected"))
        }
        other => other.into(),
    }
}

fn not_selected(err: StoreError, entity: &'static str, id: i64) -> LearningError {
    match err {
        StoreError::NotFound(_) => LearningError::NotFound {
            entity,
            id: Some(id),
        },
        other => other.into(),
    }
}

//! Modules Use Case

use std::sync::Arc;

use kernel::id::{CardId, ModuleId, UserId};

use crate::application::cards::insert_cards;
use crate::application::cascade;
use crate::application::locks::{Family, FamilyLocks};
use crate::application::ownership::{owned_module, visible_module};
use crate::application::unit_of_work::{begin, finish};
use crate::application::visibility;
use crate::domain::deletion::DeletionTarget;
use crate::domain::entities::{Module, NewModule};
use crate::domain::repository::{CardRepository, ModuleRepository, UnitOfWork, UnitOfWorkFactory};
use crate::domain::value_objects::ModuleType;
use crate::error::{LearningError, LearningResult};

/// Insert module output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertModuleOutput {
    pub module_id: ModuleId,
    pub card_ids: Vec<CardId>,
}

pub struct ModulesUseCase<F>
where
    F: UnitOfWorkFactory,
{
    store: Arc<F>,
    locks: Arc<FamilyLocks>,
}

impl<F> ModulesUseCase<F>
where
    F: UnitOfWorkFactory,
{
    pub fn new(store: Arc<F>, locks: Arc<FamilyLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn get(&self, actor: UserId, module_id: ModuleId) -> LearningResult<Module> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let mut module = visible_module(&mut uow, actor, module_id).await?;
            module.cards = uow.cards_of_module(module_id).await?;
            Ok(module)
        }
        .await;
        finish(uow, outcome).await
    }

    pub async fn modules_of_user(
        &self,
        actor: UserId,
        owner_id: UserId,
        with_cards: bool,
    ) -> LearningResult<Vec<Module>> {
        let mut uow = begin(&*self.store).await?;
        let outcome = modules_visible_to(&mut uow, actor, owner_id, with_cards).await;
        finish(uow, outcome).await
    }

    /// Module and all of its initial cards in one unit of work
    pub async fn insert(
        &self,
        owner_id: UserId,
        module: NewModule,
    ) -> LearningResult<InsertModuleOutput> {
        let _guard = self
            .locks
            .acquire(&[Family::Modules, Family::Cards])
            .await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let module_id = uow
                .insert_module(owner_id, &module.name, module.module_type)
                .await?;
            let card_ids = insert_cards(&mut uow, module_id, &module.cards).await?;
            Ok(InsertModuleOutput { module_id, card_ids })
        }
        .await;
        let output = finish(uow, outcome).await?;

        tracing::info!(
            module_id = %output.module_id,
            owner_id = %owner_id,
            cards = output.card_ids.len(),
            "Module created"
        );
        Ok(output)
    }

    pub async fn rename(&self, actor: UserId, module_id: ModuleId, name: &str) -> LearningResult<()> {
        let _guard = self.locks.acquire(&[Family::Modules]).await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            owned_module(&mut uow, actor, module_id).await?;
            Ok(uow.rename_module(module_id, name).await?)
        }
        .await;
        finish(uow, outcome).await?;

        tracing::info!(module_id = %module_id, "Module renamed");
        Ok(())
    }

    /// Flip privacy and propagate to every category containing the module
    ///
    /// ## Arguments
    /// * `module_type` - Target type; the current type is an invalid transition
    pub async fn change_type(
        &self,
        actor: UserId,
        module_id: ModuleId,
        module_type: ModuleType,
    ) -> LearningResult<()> {
        let _guard = self
            .locks
            .acquire(&[Family::Modules, Family::Categories, Family::CategoryModules])
            .await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let module = owned_module(&mut uow, actor, module_id).await?;
            if module.module_type == module_type {
                return Err(LearningError::InvalidTransition(
                    "module already has this type".to_string(),
                ));
            }
            uow.set_module_type(module_id, module_type).await?;
            visibility::on_module_type_changed(&mut uow, module_id, module.module_type, module_type)
                .await
        }
        .await;
        finish(uow, outcome).await?;

        tracing::info!(module_id = %module_id, module_type = ?module_type, "Module type changed");
        Ok(())
    }

    pub async fn delete(&self, actor: UserId, module_id: ModuleId) -> LearningResult<()> {
        let families: Vec<Family> = Family::ALL
            .into_iter()
            .filter(|f| *f != Family::Users)
            .collect();
        let _guard = self.locks.acquire(&families).await;
        let mut uow = begin(&*self.store).await?;
        let outcome = cascade::execute(&mut uow, actor, DeletionTarget::Module(module_id)).await;
        finish(uow, outcome).await?;

        tracing::info!(module_id = %module_id, "Module deleted");
        Ok(())
    }
}

pub(crate) async fn modules_visible_to<U: UnitOfWork>(
    uow: &mut U,
    actor: UserId,
    owner_id: UserId,
    with_cards: bool,
) -> LearningResult<Vec<Module>> {
    let mut modules: Vec<Module> = uow
        .modules_of_owner(owner_id)
        .await?
        .into_iter()
        .filter(|m| m.is_visible_to(actor))
        .collect();

    if with_cards {
        for module in &mut modules {
            module.cards = uow.cards_of_module(module.id).await?;
        }
    }
    Ok(modules)
}

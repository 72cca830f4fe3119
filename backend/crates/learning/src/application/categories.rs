//! Categories Use Case
//!
//! Category lifecycle and module membership. Membership changes run the
//! visibility triggers in the same unit of work.

use std::collections::HashSet;
use std::sync::Arc;

use kernel::id::{CategoryId, ModuleId, UserId};

use crate::application::cascade;
use crate::application::locks::{Family, FamilyLocks};
use crate::application::ownership::{load_module, owned_category, visible_category};
use crate::application::unit_of_work::{begin, finish};
use crate::application::visibility;
use crate::domain::deletion::DeletionTarget;
use crate::domain::entities::{Category, Module};
use crate::domain::repository::{
    CategoryModuleRepository, CategoryRepository, UnitOfWork, UnitOfWorkFactory,
};
use crate::domain::value_objects::{CategoryType, CategoryVisibility};
use crate::error::{LearningError, LearningResult};

pub struct CategoriesUseCase<F>
where
    F: UnitOfWorkFactory,
{
    store: Arc<F>,
    locks: Arc<FamilyLocks>,
}

impl<F> CategoriesUseCase<F>
where
    F: UnitOfWorkFactory,
{
    pub fn new(store: Arc<F>, locks: Arc<FamilyLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn get(&self, actor: UserId, category_id: CategoryId) -> LearningResult<Category> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let mut category = visible_category(&mut uow, actor, category_id).await?;
            category.modules = member_modules(&mut uow, actor, category_id, true).await?;
            Ok(category)
        }
        .await;
        finish(uow, outcome).await
    }

    pub async fn categories_of_user(
        &self,
        actor: UserId,
        owner_id: UserId,
        full: bool,
    ) -> LearningResult<Vec<Category>> {
        let mut uow = begin(&*self.store).await?;
        let outcome = categories_visible_to(&mut uow, actor, owner_id, full).await;
        finish(uow, outcome).await
    }

    pub async fn modules_of_category(
        &self,
        actor: UserId,
        category_id: CategoryId,
        with_cards: bool,
    ) -> LearningResult<Vec<Module>> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            visible_category(&mut uow, actor, category_id).await?;
            member_modules(&mut uow, actor, category_id, with_cards).await
        }
        .await;
        finish(uow, outcome).await
    }

    pub async fn insert(
        &self,
        owner_id: UserId,
        name: &str,
        module_ids: &[ModuleId],
    ) -> LearningResult<CategoryId> {
        let _guard = self
            .locks
            .acquire(&[Family::Categories, Family::CategoryModules, Family::Modules])
            .await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let category_id = uow.insert_category(owner_id, name).await?;
            attach_modules(&mut uow, owner_id, category_id, module_ids).await?;
            Ok(category_id)
        }
        .await;
        let category_id = finish(uow, outcome).await?;

        tracing::info!(
            category_id = %category_id,
            owner_id = %owner_id,
            modules = module_ids.len(),
            "Category created"
        );
        Ok(category_id)
    }

    pub async fn rename(
        &self,
        actor: UserId,
        category_id: CategoryId,
        name: &str,
    ) -> LearningResult<()> {
        let _guard = self.locks.acquire(&[Family::Categories]).await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            owned_category(&mut uow, actor, category_id).await?;
            Ok(uow.rename_category(category_id, name).await?)
        }
        .await;
        finish(uow, outcome).await?;

        tracing::info!(category_id = %category_id, "Category renamed");
        Ok(())
    }

    /// Pin or unpin the category as private
    ///
    /// A category that contains a private module cannot be made public.
    pub async fn change_type(
        &self,
        actor: UserId,
        category_id: CategoryId,
        category_type: CategoryType,
    ) -> LearningResult<()> {
        let _guard = self.locks.acquire(&[Family::Categories]).await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let category = owned_category(&mut uow, actor, category_id).await?;
            let pinned = match (category_type, category.is_private()) {
                (CategoryType::Private, true) | (CategoryType::Public, false) => {
                    return Err(LearningError::InvalidTransition(
                        "category already has this type".to_string(),
                    ));
                }
                (CategoryType::Public, true) if category.visibility.is_private() => {
                    return Err(LearningError::InvalidTransition(
                        "category contains a private module".to_string(),
                    ));
                }
                (CategoryType::Private, false) => true,
                (CategoryType::Public, true) => false,
            };
            Ok(uow.set_category_pinned(category_id, pinned).await?)
        }
        .await;
        finish(uow, outcome).await?;

        tracing::info!(
            category_id = %category_id,
            category_type = ?category_type,
            "Category type changed"
        );
        Ok(())
    }

    /// Add modules to a category owned by `actor`
    ///
    /// ## Arguments
    /// * `module_ids` - Modules to attach; a module listed twice or already a
    ///   member fails the whole request with `AlreadyExists`
    ///
    /// ## Returns
    /// The category's visibility after the private members were counted
    pub async fn add_modules(
        &self,
        actor: UserId,
        category_id: CategoryId,
        module_ids: &[ModuleId],
    ) -> LearningResult<CategoryVisibility> {
        let _guard = self
            .locks
            .acquire(&[Family::Categories, Family::CategoryModules, Family::Modules])
            .await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            owned_category(&mut uow, actor, category_id).await?;
            attach_modules(&mut uow, actor, category_id, module_ids).await
        }
        .await;
        let visibility = finish(uow, outcome).await?;

        tracing::info!(
            category_id = %category_id,
            added = module_ids.len(),
            private_modules = visibility.private_count(),
            "Modules added to category"
        );
        Ok(visibility)
    }

    /// Remove one module together with its rows in the category's
    /// result groups
    pub async fn remove_module(
        &self,
        actor: UserId,
        category_id: CategoryId,
        module_id: ModuleId,
    ) -> LearningResult<CategoryVisibility> {
        let _guard = self
            .locks
            .acquire(&[
                Family::Categories,
                Family::CategoryModules,
                Family::Results,
                Family::CardResults,
                Family::CategoryResults,
            ])
            .await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            owned_category(&mut uow, actor, category_id).await?;
            let members = uow.module_ids_of_category(category_id).await?;
            if !members.contains(&module_id) {
                return Err(LearningError::not_found("category module", module_id));
            }
            let module = load_module(&mut uow, module_id).await?;

            cascade::purge_category_module_results(&mut uow, category_id, module_id).await?;
            uow.delete_category_module(category_id, module_id).await?;
            visibility::on_module_removed(&mut uow, category_id, module.module_type).await
        }
        .await;
        let visibility = finish(uow, outcome).await?;

        tracing::info!(
            category_id = %category_id,
            module_id = %module_id,
            private_modules = visibility.private_count(),
            "Module removed from category"
        );
        Ok(visibility)
    }

    pub async fn delete(&self, actor: UserId, category_id: CategoryId) -> LearningResult<()> {
        let _guard = self
            .locks
            .acquire(&[
                Family::Categories,
                Family::CategoryModules,
                Family::Results,
                Family::CardResults,
                Family::CategoryResults,
                Family::Selections,
            ])
            .await;
        let mut uow = begin(&*self.store).await?;
        let outcome =
            cascade::execute(&mut uow, actor, DeletionTarget::Category(category_id)).await;
        finish(uow, outcome).await?;

        tracing::info!(category_id = %category_id, "Category deleted");
        Ok(())
    }
}

/// Insert memberships and bump the counter for private modules
async fn attach_modules<U: UnitOfWork>(
    uow: &mut U,
    actor: UserId,
    category_id: CategoryId,
    module_ids: &[ModuleId],
) -> LearningResult<CategoryVisibility> {
    let mut requested = HashSet::with_capacity(module_ids.len());
    if let Some(dup) = module_ids.iter().find(|id| !requested.insert(**id)) {
        return Err(LearningError::AlreadyExists(format!(
            "module {dup} is listed more than once"
        )));
    }

    let existing = uow.module_ids_of_category(category_id).await?;
    if let Some(dup) = module_ids.iter().find(|id| existing.contains(*id)) {
        return Err(LearningError::AlreadyExists(format!(
            "module {dup} is already in the category"
        )));
    }

    let mut added = Vec::with_capacity(module_ids.len());
    for &module_id in module_ids {
        let module = load_module(uow, module_id).await?;
        if !module.is_visible_to(actor) {
            return Err(LearningError::forbidden("module", module_id));
        }
        uow.insert_category_module(category_id, module_id).await?;
        added.push(module);
    }

    visibility::on_modules_added(uow, category_id, &added).await
}

async fn member_modules<U: UnitOfWork>(
    uow: &mut U,
    actor: UserId,
    category_id: CategoryId,
    with_cards: bool,
) -> LearningResult<Vec<Module>> {
    let mut modules = Vec::new();
    for module_id in uow.module_ids_of_category(category_id).await? {
        let mut module = load_module(uow, module_id).await?;
        if !module.is_visible_to(actor) {
            continue;
        }
        if with_cards {
            module.cards = uow.cards_of_module(module_id).await?;
        }
        modules.push(module);
    }
    Ok(modules)
}

pub(crate) async fn categories_visible_to<U: UnitOfWork>(
    uow: &mut U,
    actor: UserId,
    owner_id: UserId,
    full: bool,
) -> LearningResult<Vec<Category>> {
    let mut categories: Vec<Category> = uow
        .categories_of_owner(owner_id)
        .await?
        .into_iter()
        .filter(|c| c.is_visible_to(actor))
        .collect();

    if full {
        for category in &mut categories {
            category.modules = member_modules(uow, actor, category.id, true).await?;
        }
    }
    Ok(categories)
}

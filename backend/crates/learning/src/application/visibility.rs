//! Visibility Propagation
//!
//! Keeps each category's private-module counter equal to the number of
//! private modules in its membership set. Every trigger runs on the
//! unit of work that performs the membership or type change.

use kernel::id::{CategoryId, ModuleId};

use crate::application::ownership::load_category;
use crate::domain::entities::Module;
use crate::domain::repository::UnitOfWork;
use crate::domain::value_objects::{CategoryVisibility, ModuleType};
use crate::error::LearningResult;

/// Modules joined `category_id`: one increment per private module
pub(crate) async fn on_modules_added<U: UnitOfWork>(
    uow: &mut U,
    category_id: CategoryId,
    added: &[Module],
) -> LearningResult<CategoryVisibility> {
    let private = added.iter().filter(|m| m.module_type.is_private()).count();
    let category = load_category(uow, category_id).await?;
    if private == 0 {
        return Ok(category.visibility);
    }

    let visibility = (0..private).fold(category.visibility, |v, _| v.with_private_added());
    uow.set_category_visibility(category_id, visibility).await?;

    tracing::debug!(
        category_id = %category_id,
        private_modules = visibility.private_count(),
        "Category counter incremented"
    );
    Ok(visibility)
}

/// A module left `category_id`
pub(crate) async fn on_module_removed<U: UnitOfWork>(
    uow: &mut U,
    category_id: CategoryId,
    removed_type: ModuleType,
) -> LearningResult<CategoryVisibility> {
    let category = load_category(uow, category_id).await?;
    if !removed_type.is_private() {
        return Ok(category.visibility);
    }

    let visibility = category.visibility.with_private_removed().inspect_err(|e| {
        tracing::error!(category_id = %category_id, error = %e, "Category counter underflow");
    })?;
    uow.set_category_visibility(category_id, visibility).await?;

    tracing::debug!(
        category_id = %category_id,
        private_modules = visibility.private_count(),
        "Category counter decremented"
    );
    Ok(visibility)
}

/// `module_id` flipped from `from` to `to`; adjust every category that
/// contains it
pub(crate) async fn on_module_type_changed<U: UnitOfWork>(
    uow: &mut U,
    module_id: ModuleId,
    from: ModuleType,
    to: ModuleType,
) -> LearningResult<()> {
    if from == to {
        return Ok(());
    }

    for category_id in uow.category_ids_of_module(module_id).await? {
        let category = load_category(uow, category_id).await?;
        let visibility = if to.is_private() {
            category.visibility.with_private_added()
        } else {
            category.visibility.with_private_removed()?
        };
        uow.set_category_visibility(category_id, visibility).await?;
    }

    Ok(())
}

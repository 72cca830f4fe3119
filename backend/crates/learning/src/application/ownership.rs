//! Ownership Guard
//!
//! Resolves owners and visibility of cards, modules and categories on
//! the transaction-scoped handles. A missing id is `NotFound`; an
//! existing object the actor may not use is `Forbidden`. The two are
//! never merged.

use kernel::id::{CardId, CategoryId, ModuleId, UserId};

use crate::domain::entities::{Card, Category, Module};
use crate::domain::repository::UnitOfWork;
use crate::error::{LearningError, LearningResult};

pub(crate) async fn load_module<U: UnitOfWork>(uow: &mut U, id: ModuleId) -> LearningResult<Module> {
    uow.find_module(id)
        .await?
        .ok_or_else(|| LearningError::not_found("module", id))
}

pub(crate) async fn load_category<U: UnitOfWork>(
    uow: &mut U,
    id: CategoryId,
) -> LearningResult<Category> {
    uow.find_category(id)
        .await?
        .ok_or_else(|| LearningError::not_found("category", id))
}

pub(crate) async fn load_card<U: UnitOfWork>(uow: &mut U, id: CardId) -> LearningResult<Card> {
    uow.find_card(id)
        .await?
        .ok_or_else(|| LearningError::not_found("card", id))
}

/// Owner of a card is the owner of its parent module
pub(crate) async fn card_owner<U: UnitOfWork>(uow: &mut U, id: CardId) -> LearningResult<UserId> {
    let card = load_card(uow, id).await?;
    Ok(load_module(uow, card.module_id).await?.owner_id)
}

pub(crate) async fn module_owner<U: UnitOfWork>(uow: &mut U, id: ModuleId) -> LearningResult<UserId> {
    Ok(load_module(uow, id).await?.owner_id)
}

pub(crate) async fn category_owner<U: UnitOfWork>(
    uow: &mut U,
    id: CategoryId,
) -> LearningResult<UserId> {
    Ok(load_category(uow, id).await?.owner_id)
}

pub(crate) fn ensure_owner(
    actor: UserId,
    owner: UserId,
    entity: &'static str,
    id: impl Into<i64>,
) -> LearningResult<()> {
    if actor == owner {
        Ok(())
    } else {
        Err(LearningError::forbidden(entity, id))
    }
}

pub(crate) async fn owned_module<U: UnitOfWork>(
    uow: &mut U,
    actor: UserId,
    id: ModuleId,
) -> LearningResult<Module> {
    let module = load_module(uow, id).await?;
    ensure_owner(actor, module.owner_id, "module", id)?;
    Ok(module)
}

pub(crate) async fn owned_category<U: UnitOfWork>(
    uow: &mut U,
    actor: UserId,
    id: CategoryId,
) -> LearningResult<Category> {
    let category = load_category(uow, id).await?;
    ensure_owner(actor, category.owner_id, "category", id)?;
    Ok(category)
}

pub(crate) async fn owned_card<U: UnitOfWork>(
    uow: &mut U,
    actor: UserId,
    id: CardId,
) -> LearningResult<Card> {
    let card = load_card(uow, id).await?;
    let owner = module_owner(uow, card.module_id).await?;
    ensure_owner(actor, owner, "card", id)?;
    Ok(card)
}

/// Module the actor may read: public, or owned
pub(crate) async fn visible_module<U: UnitOfWork>(
    uow: &mut U,
    actor: UserId,
    id: ModuleId,
) -> LearningResult<Module> {
    let module = load_module(uow, id).await?;
    if !module.is_visible_to(actor) {
        return Err(LearningError::forbidden("module", id));
    }
    Ok(module)
}

pub(crate) async fn visible_category<U: UnitOfWork>(
    uow: &mut U,
    actor: UserId,
    id: CategoryId,
) -> LearningResult<Category> {
    let category = load_category(uow, id).await?;
    if !category.is_visible_to(actor) {
        return Err(LearningError::forbidden("category", id));
    }
    Ok(category)
}

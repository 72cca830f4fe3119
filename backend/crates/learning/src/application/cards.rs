//! Cards Use Case

use std::sync::Arc;

use kernel::id::{CardId, ModuleId, UserId};

use crate::application::cascade;
use crate::application::locks::{Family, FamilyLocks};
use crate::application::ownership::{load_card, owned_card, owned_module, visible_module};
use crate::application::unit_of_work::{begin, finish};
use crate::domain::deletion::DeletionTarget;
use crate::domain::entities::{Card, NewCard};
use crate::domain::repository::{CardRepository, UnitOfWork, UnitOfWorkFactory};
use crate::error::{LearningError, LearningResult};

pub struct CardsUseCase<F>
where
    F: UnitOfWorkFactory,
{
    store: Arc<F>,
    locks: Arc<FamilyLocks>,
}

impl<F> CardsUseCase<F>
where
    F: UnitOfWorkFactory,
{
    pub fn new(store: Arc<F>, locks: Arc<FamilyLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn get(&self, actor: UserId, card_id: CardId) -> LearningResult<Card> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let card = load_card(&mut uow, card_id).await?;
            visible_module(&mut uow, actor, card.module_id).await?;
            Ok(card)
        }
        .await;
        finish(uow, outcome).await
    }

    pub async fn cards_of_module(
        &self,
        actor: UserId,
        module_id: ModuleId,
    ) -> LearningResult<Vec<Card>> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            visible_module(&mut uow, actor, module_id).await?;
            Ok(uow.cards_of_module(module_id).await?)
        }
        .await;
        finish(uow, outcome).await
    }

    pub async fn insert(
        &self,
        actor: UserId,
        module_id: ModuleId,
        card: NewCard,
    ) -> LearningResult<CardId> {
        self.insert_many(actor, module_id, vec![card])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LearningError::Internal("card insert returned no id".to_string()))
    }

    /// Ids are returned in input order
    pub async fn insert_many(
        &self,
        actor: UserId,
        module_id: ModuleId,
        cards: Vec<NewCard>,
    ) -> LearningResult<Vec<CardId>> {
        let _guard = self.locks.acquire(&[Family::Cards]).await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            owned_module(&mut uow, actor, module_id).await?;
            insert_cards(&mut uow, module_id, &cards).await
        }
        .await;
        let ids = finish(uow, outcome).await?;

        tracing::info!(module_id = %module_id, count = ids.len(), "Cards inserted");
        Ok(ids)
    }

    /// Replace term and definition; the parent module stays the same
    pub async fn update(&self, actor: UserId, card: Card) -> LearningResult<()> {
        let _guard = self.locks.acquire(&[Family::Cards]).await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let stored = owned_card(&mut uow, actor, card.id).await?;
            let updated = Card {
                module_id: stored.module_id,
                ..card
            };
            uow.update_card(&updated).await?;
            Ok(updated.id)
        }
        .await;
        let card_id = finish(uow, outcome).await?;

        tracing::info!(card_id = %card_id, "Card updated");
        Ok(())
    }

    pub async fn delete(&self, actor: UserId, card_id: CardId) -> LearningResult<()> {
        let _guard = self
            .locks
            .acquire(&[Family::Cards, Family::CardResults])
            .await;
        let mut uow = begin(&*self.store).await?;
        let outcome = cascade::execute(&mut uow, actor, DeletionTarget::Card(card_id)).await;
        finish(uow, outcome).await?;

        tracing::info!(card_id = %card_id, "Card deleted");
        Ok(())
    }
}

pub(crate) async fn insert_cards<U: UnitOfWork>(
    uow: &mut U,
    module_id: ModuleId,
    cards: &[NewCard],
) -> LearningResult<Vec<CardId>> {
    let mut ids = Vec::with_capacity(cards.len());
    for card in cards {
        ids.push(uow.insert_card(module_id, card).await?);
    }
    Ok(ids)
}

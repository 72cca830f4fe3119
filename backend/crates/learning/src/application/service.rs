//! Learning Service
//!
//! Bundles every use case over one store, one set of family locks, one
//! token store and one configuration. Built once at start-up and held
//! for the lifetime of the process.

use std::sync::Arc;

use crate::application::cards::CardsUseCase;
use crate::application::categories::CategoriesUseCase;
use crate::application::config::LearningConfig;
use crate::application::locks::FamilyLocks;
use crate::application::modules::ModulesUseCase;
use crate::application::results::ResultsUseCase;
use crate::application::selections::SelectionsUseCase;
use crate::application::session::SessionUseCase;
use crate::application::users::UsersUseCase;
use crate::domain::repository::{TokenStore, UnitOfWorkFactory};

pub struct LearningService<F, T>
where
    F: UnitOfWorkFactory,
    T: TokenStore,
{
    pub users: UsersUseCase<F>,
    pub session: SessionUseCase<F, T>,
    pub cards: CardsUseCase<F>,
    pub modules: ModulesUseCase<F>,
    pub categories: CategoriesUseCase<F>,
    pub results: ResultsUseCase<F>,
    pub selections: SelectionsUseCase<F>,
    store: Arc<F>,
}

impl<F, T> LearningService<F, T>
where
    F: UnitOfWorkFactory,
    T: TokenStore,
{
    pub fn new(store: Arc<F>, tokens: Arc<T>, config: Arc<LearningConfig>) -> Self {
        let locks = Arc::new(FamilyLocks::new());

        Self {
            users: UsersUseCase::new(store.clone(), locks.clone(), config.clone()),
            session: SessionUseCase::new(store.clone(), tokens, config),
            cards: CardsUseCase::new(store.clone(), locks.clone()),
            modules: ModulesUseCase::new(store.clone(), locks.clone()),
            categories: CategoriesUseCase::new(store.clone(), locks.clone()),
            results: ResultsUseCase::new(store.clone(), locks.clone()),
            selections: SelectionsUseCase::new(store.clone(), locks),
            store,
        }
    }

    /// Store shared by every use case
    pub fn store(&self) -> &F {
        &self.store
    }
}

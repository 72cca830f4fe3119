//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the
//! infrastructure layer.
//!
//! Every repository method takes `&mut self` because it runs on a
//! transaction-scoped handle: all of them are implemented by a single
//! [`UnitOfWork`] so that reads observe the writes made earlier in the
//! same transaction.

use chrono::{DateTime, Utc};
use kernel::id::{CardId, CategoryId, CategoryResultId, ModuleId, ResultId, UserId};
use thiserror::Error;

use crate::domain::entities::{
    Card, CardResult, Category, CategoryResultRow, Module, ModuleResult, NewCard, NewUser, User,
};
use crate::domain::value_objects::{CategoryVisibility, ModuleType, SessionToken};
use crate::error::LearningResult;

/// Store-level failure
///
/// Never crosses the crate boundary: use cases convert it into
/// [`crate::error::LearningError`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Update or delete addressed a row that does not exist
    #[error("{0} row not found")]
    NotFound(&'static str),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The unit of work was already committed or rolled back
    #[error("unit of work is already finished")]
    Closed,
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    async fn insert_user(&mut self, user: &NewUser) -> StoreResult<UserId>;

    async fn find_user(&mut self, id: UserId) -> StoreResult<Option<User>>;

    async fn find_user_by_login(&mut self, login: &str) -> StoreResult<Option<User>>;
}

#[trait_variant::make(CardRepository: Send)]
pub trait LocalCardRepository {
    async fn insert_card(&mut self, module_id: ModuleId, card: &NewCard) -> StoreResult<CardId>;

    async fn find_card(&mut self, id: CardId) -> StoreResult<Option<Card>>;

    /// Cards of a module ordered by id
    async fn cards_of_module(&mut self, module_id: ModuleId) -> StoreResult<Vec<Card>>;

    async fn update_card(&mut self, card: &Card) -> StoreResult<()>;

    async fn delete_card(&mut self, id: CardId) -> StoreResult<()>;
}

#[trait_variant::make(ModuleRepository: Send)]
pub trait LocalModuleRepository {
    async fn insert_module(
        &mut self,
        owner_id: UserId,
        name: &str,
        module_type: ModuleType,
    ) -> StoreResult<ModuleId>;

    /// Module without its cards
    async fn find_module(&mut self, id: ModuleId) -> StoreResult<Option<Module>>;

    async fn modules_of_owner(&mut self, owner_id: UserId) -> StoreResult<Vec<Module>>;

    async fn rename_module(&mut self, id: ModuleId, name: &str) -> StoreResult<()>;

    async fn set_module_type(&mut self, id: ModuleId, module_type: ModuleType) -> StoreResult<()>;

    async fn delete_module(&mut self, id: ModuleId) -> StoreResult<()>;
}

#[trait_variant::make(CategoryRepository: Send)]
pub trait LocalCategoryRepository {
    /// New categories start public and unpinned
    async fn insert_category(&mut self, owner_id: UserId, name: &str) -> StoreResult<CategoryId>;

    /// Category without its modules
    async fn find_category(&mut self, id: CategoryId) -> StoreResult<Option<Category>>;

    async fn categories_of_owner(&mut self, owner_id: UserId) -> StoreResult<Vec<Category>>;

    async fn rename_category(&mut self, id: CategoryId, name: &str) -> StoreResult<()>;

    async fn set_category_visibility(
        &mut self,
        id: CategoryId,
        visibility: CategoryVisibility,
    ) -> StoreResult<()>;

    async fn set_category_pinned(&mut self, id: CategoryId, pinned: bool) -> StoreResult<()>;

    async fn delete_category(&mut self, id: CategoryId) -> StoreResult<()>;
}

/// Category ↔ module membership
#[trait_variant::make(CategoryModuleRepository: Send)]
pub trait LocalCategoryModuleRepository {
    async fn insert_category_module(
        &mut self,
        category_id: CategoryId,
        module_id: ModuleId,
    ) -> StoreResult<()>;

    async fn delete_category_module(
        &mut self,
        category_id: CategoryId,
        module_id: ModuleId,
    ) -> StoreResult<()>;

    async fn delete_category_modules(&mut self, category_id: CategoryId) -> StoreResult<u64>;

    async fn module_ids_of_category(&mut self, category_id: CategoryId)
    -> StoreResult<Vec<ModuleId>>;

    async fn category_ids_of_module(&mut self, module_id: ModuleId)
    -> StoreResult<Vec<CategoryId>>;
}

#[trait_variant::make(ResultRepository: Send)]
pub trait LocalResultRepository {
    async fn insert_result(&mut self, kind: &str) -> StoreResult<ResultId>;

    async fn delete_result(&mut self, id: ResultId) -> StoreResult<()>;
}

#[trait_variant::make(CardResultRepository: Send)]
pub trait LocalCardResultRepository {
    async fn insert_card_result(
        &mut self,
        result_id: ResultId,
        card_result: &CardResult,
    ) -> StoreResult<()>;

    async fn card_results_of(&mut self, result_id: ResultId) -> StoreResult<Vec<CardResult>>;

    async fn delete_card_results_of_result(&mut self, result_id: ResultId) -> StoreResult<u64>;

    async fn delete_card_results_of_card(&mut self, card_id: CardId) -> StoreResult<u64>;
}

#[trait_variant::make(ModuleResultRepository: Send)]
pub trait LocalModuleResultRepository {
    async fn insert_module_result(
        &mut self,
        result_id: ResultId,
        module_id: ModuleId,
        owner_id: UserId,
        time: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Result with its kind, without card outcomes
    async fn find_module_result(&mut self, result_id: ResultId)
    -> StoreResult<Option<ModuleResult>>;

    /// Ordered by result id
    async fn module_results_of_owner(&mut self, owner_id: UserId)
    -> StoreResult<Vec<ModuleResult>>;

    async fn module_results_of_module_owner(
        &mut self,
        module_id: ModuleId,
        owner_id: UserId,
    ) -> StoreResult<Vec<ModuleResult>>;

    async fn module_result_ids_of_module(&mut self, module_id: ModuleId)
    -> StoreResult<Vec<ResultId>>;

    async fn delete_module_result(&mut self, result_id: ResultId) -> StoreResult<()>;
}

/// Rows of category result groups
///
/// Listing methods return rows ordered by group id, then result id, which
/// is the order the aggregation fold expects.
#[trait_variant::make(CategoryResultRepository: Send)]
pub trait LocalCategoryResultRepository {
    /// Store-generated group id
    async fn next_category_result_id(&mut self) -> StoreResult<CategoryResultId>;

    async fn insert_category_result_row(
        &mut self,
        group_id: CategoryResultId,
        category_id: CategoryId,
        module_id: ModuleId,
        result_id: ResultId,
        owner_id: UserId,
        time: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn category_result_rows_of_group(
        &mut self,
        group_id: CategoryResultId,
    ) -> StoreResult<Vec<CategoryResultRow>>;

    async fn category_result_rows_of_owner(
        &mut self,
        owner_id: UserId,
    ) -> StoreResult<Vec<CategoryResultRow>>;

    async fn category_result_rows_of_category_owner(
        &mut self,
        category_id: CategoryId,
        owner_id: UserId,
    ) -> StoreResult<Vec<CategoryResultRow>>;

    async fn category_result_rows_of_category(
        &mut self,
        category_id: CategoryId,
    ) -> StoreResult<Vec<CategoryResultRow>>;

    async fn category_result_rows_of_module(
        &mut self,
        module_id: ModuleId,
    ) -> StoreResult<Vec<CategoryResultRow>>;

    /// Delete the group row that owns `result_id`
    async fn delete_category_result_row(&mut self, result_id: ResultId) -> StoreResult<()>;
}

/// Bookmarks of modules and categories
#[trait_variant::make(SelectionRepository: Send)]
pub trait LocalSelectionRepository {
    async fn insert_selected_module(&mut self, user_id: UserId, module_id: ModuleId)
    -> StoreResult<()>;

    async fn delete_selected_module(&mut self, user_id: UserId, module_id: ModuleId)
    -> StoreResult<()>;

    async fn selected_modules_of_user(&mut self, user_id: UserId) -> StoreResult<Vec<Module>>;

    async fn module_selection_count(&mut self, module_id: ModuleId) -> StoreResult<u64>;

    async fn delete_module_selections(&mut self, module_id: ModuleId) -> StoreResult<u64>;

    async fn insert_selected_category(
        &mut self,
        user_id: UserId,
        category_id: CategoryId,
    ) -> StoreResult<()>;

    async fn delete_selected_category(
        &mut self,
        user_id: UserId,
        category_id: CategoryId,
    ) -> StoreResult<()>;

    async fn selected_categories_of_user(&mut self, user_id: UserId)
    -> StoreResult<Vec<Category>>;

    async fn category_selection_count(&mut self, category_id: CategoryId) -> StoreResult<u64>;

    async fn delete_category_selections(&mut self, category_id: CategoryId) -> StoreResult<u64>;
}

/// One transaction with handles for every entity family
///
/// `commit` finishes the unit of work; `rollback` is idempotent and a
/// no-op once the unit of work has been committed. Dropping an
/// unfinished unit of work rolls it back.
#[trait_variant::make(UnitOfWork: Send)]
pub trait LocalUnitOfWork:
    UserRepository
    + CardRepository
    + ModuleRepository
    + CategoryRepository
    + CategoryModuleRepository
    + ResultRepository
    + CardResultRepository
    + ModuleResultRepository
    + CategoryResultRepository
    + SelectionRepository
{
    async fn commit(&mut self) -> StoreResult<()>;

    async fn rollback(&mut self) -> StoreResult<()>;
}

/// Opens units of work
#[trait_variant::make(UnitOfWorkFactory: Send)]
pub trait LocalUnitOfWorkFactory {
    type Uow: UnitOfWork;

    async fn begin(&self) -> StoreResult<Self::Uow>;
}

/// Process-local session token store
///
/// Not persisted: every session is lost when the process restarts.
pub trait TokenStore: Send + Sync {
    /// Issue a fresh token for `user_id`, superseding any previous one
    fn issue(&self, user_id: UserId) -> SessionToken;

    fn revoke(&self, user_id: UserId) -> LearningResult<()>;

    fn validate(&self, token: &str) -> LearningResult<UserId>;
}

//! In-memory Store
//!
//! A relational-store stand-in with the same guarantees the use cases
//! rely on from PostgreSQL: foreign keys without cascades, unique keys,
//! per-table sequences and all-or-nothing units of work.
//!
//! A unit of work holds the store mutex from `begin` until it finishes and
//! works on a private copy of the tables, so units of work are serialized
//! and a rollback (explicit or by drop) simply discards the copy.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use kernel::id::{CardId, CategoryId, CategoryResultId, ModuleId, ResultId, UserId};
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

use crate::domain::entities::{
    Card, CardResult, Category, CategoryResultRow, Module, ModuleResult, NewCard, NewUser,
    PracticeResult, User,
};
use crate::domain::repository::{
    CardRepository, CardResultRepository, CategoryModuleRepository, CategoryRepository,
    CategoryResultRepository, ModuleRepository, ModuleResultRepository, ResultRepository,
    SelectionRepository, StoreError, StoreResult, UnitOfWork, UnitOfWorkFactory, UserRepository,
};
use crate::domain::value_objects::{CategoryVisibility, ModuleType, TextWithLang};

// ============================================================================
// Tables
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct UserRow {
    login: String,
    name: String,
    password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ModuleRow {
    name: String,
    owner_id: UserId,
    module_type: ModuleType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CardRow {
    module_id: ModuleId,
    term: TextWithLang,
    definition: TextWithLang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CategoryRow {
    name: String,
    owner_id: UserId,
    visibility: CategoryVisibility,
    pinned_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ModuleResultRow {
    module_id: ModuleId,
    owner_id: UserId,
    time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CategoryResultLink {
    group_id: CategoryResultId,
    category_id: CategoryId,
    module_id: ModuleId,
    owner_id: UserId,
    time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Sequences {
    users: i64,
    modules: i64,
    cards: i64,
    categories: i64,
    results: i64,
    category_results: i64,
}

/// Full contents of the store
///
/// Compared by tests to check that a failed unit of work left nothing
/// behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    users: BTreeMap<UserId, UserRow>,
    modules: BTreeMap<ModuleId, ModuleRow>,
    cards: BTreeMap<CardId, CardRow>,
    categories: BTreeMap<CategoryId, CategoryRow>,
    category_modules: BTreeSet<(CategoryId, ModuleId)>,
    results: BTreeMap<ResultId, String>,
    card_results: BTreeMap<(ResultId, CardId), String>,
    module_results: BTreeMap<ResultId, ModuleResultRow>,
    category_results: BTreeMap<ResultId, CategoryResultLink>,
    selected_modules: BTreeSet<(UserId, ModuleId)>,
    selected_categories: BTreeSet<(UserId, CategoryId)>,
    sequences: Sequences,
}

impl Tables {
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn card_result_count(&self) -> usize {
        self.card_results.len()
    }

    /// Rows still referencing the module in any table
    pub fn module_dependents(&self, module_id: ModuleId) -> usize {
        self.cards.values().filter(|c| c.module_id == module_id).count()
            + self
                .category_modules
                .iter()
                .filter(|(_, m)| *m == module_id)
                .count()
            + self
                .module_results
                .values()
                .filter(|r| r.module_id == module_id)
                .count()
            + self
                .category_results
                .values()
                .filter(|r| r.module_id == module_id)
                .count()
            + self
                .selected_modules
                .iter()
                .filter(|(_, m)| *m == module_id)
                .count()
    }

    /// Rows still referencing the category in any table
    pub fn category_dependents(&self, category_id: CategoryId) -> usize {
        self.category_modules
            .iter()
            .filter(|(c, _)| *c == category_id)
            .count()
            + self
                .category_results
                .values()
                .filter(|r| r.category_id == category_id)
                .count()
            + self
                .selected_categories
                .iter()
                .filter(|(_, c)| *c == category_id)
                .count()
    }

    fn module(&self, id: ModuleId, row: &ModuleRow) -> Module {
        Module {
            id,
            name: row.name.clone(),
            owner_id: row.owner_id,
            module_type: row.module_type,
            cards: Vec::new(),
        }
    }

    fn category(&self, id: CategoryId, row: &CategoryRow) -> Category {
        Category {
            id,
            name: row.name.clone(),
            owner_id: row.owner_id,
            visibility: row.visibility,
            pinned_private: row.pinned_private,
            modules: Vec::new(),
        }
    }

    fn module_result(&self, result_id: ResultId, row: &ModuleResultRow) -> ModuleResult {
        ModuleResult {
            module_id: row.module_id,
            result: PracticeResult {
                id: result_id,
                owner_id: row.owner_id,
                kind: self.results.get(&result_id).cloned().unwrap_or_default(),
                time: row.time,
                card_results: Vec::new(),
            },
        }
    }

    /// Category result rows matching `filter`, by group then result id
    fn category_rows(
        &self,
        filter: impl Fn(&CategoryResultLink) -> bool,
    ) -> Vec<CategoryResultRow> {
        let mut rows: Vec<CategoryResultRow> = self
            .category_results
            .iter()
            .filter(|(_, link)| filter(link))
            .map(|(&result_id, link)| CategoryResultRow {
                group_id: link.group_id,
                category_id: link.category_id,
                module_id: link.module_id,
                result_id,
                kind: self.results.get(&result_id).cloned().unwrap_or_default(),
                owner_id: link.owner_id,
                time: link.time,
            })
            .collect();
        rows.sort_by_key(|row| (row.group_id, row.result_id));
        rows
    }
}

fn foreign_key(table: &str, column: &str) -> StoreError {
    StoreError::ForeignKeyViolation(format!("{table}.{column}"))
}

fn referenced(table: &str, by: &str) -> StoreError {
    StoreError::ForeignKeyViolation(format!("{table} is still referenced by {by}"))
}

fn unique(key: &str) -> StoreError {
    StoreError::UniqueViolation(key.to_string())
}

fn next(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

// ============================================================================
// Store
// ============================================================================

/// Failure raised by [`MemoryStore::fail_on`]
#[derive(Debug, Error)]
#[error("injected failure in {0}")]
pub struct InjectedFailure(pub String);

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<tokio::sync::Mutex<Tables>>,
    failures: Arc<Mutex<HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `operation` fail
    ///
    /// `operation` is a repository method name, or `begin` / `commit`.
    pub fn fail_on(&self, operation: &str) {
        lock_failures(&self.failures).insert(operation.to_string());
    }

    pub fn clear_failures(&self) {
        lock_failures(&self.failures).clear();
    }

    /// Committed contents
    pub async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }
}

fn lock_failures(failures: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    failures.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check(failures: &Mutex<HashSet<String>>, operation: &str) -> StoreResult<()> {
    if lock_failures(failures).contains(operation) {
        tracing::debug!(operation, "Injected store failure");
        return Err(StoreError::backend(InjectedFailure(operation.to_string())));
    }
    Ok(())
}

impl UnitOfWorkFactory for MemoryStore {
    type Uow = MemoryUnitOfWork;

    async fn begin(&self) -> StoreResult<MemoryUnitOfWork> {
        check(&self.failures, "begin")?;
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(MemoryUnitOfWork {
            guard: Some(guard),
            working,
            failures: self.failures.clone(),
        })
    }
}

/// Unit of work over a private copy of the tables
pub struct MemoryUnitOfWork {
    guard: Option<OwnedMutexGuard<Tables>>,
    working: Tables,
    failures: Arc<Mutex<HashSet<String>>>,
}

impl MemoryUnitOfWork {
    /// Tables of an open unit of work
    fn tables(&mut self, operation: &str) -> StoreResult<&mut Tables> {
        if self.guard.is_none() {
            return Err(StoreError::Closed);
        }
        check(&self.failures, operation)?;
        Ok(&mut self.working)
    }
}

impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(&mut self) -> StoreResult<()> {
        check(&self.failures, "commit")?;
        let mut guard = self.guard.take().ok_or(StoreError::Closed)?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        if self.guard.take().is_some() {
            self.working = Tables::default();
        }
        Ok(())
    }
}

// ============================================================================
// Users
// ============================================================================

impl UserRepository for MemoryUnitOfWork {
    async fn insert_user(&mut self, user: &NewUser) -> StoreResult<UserId> {
        let t = self.tables("insert_user")?;
        if t.users.values().any(|row| row.login == user.login) {
            return Err(unique("users.login"));
        }
        let id = UserId::from_raw(next(&mut t.sequences.users));
        t.users.insert(
            id,
            UserRow {
                login: user.login.clone(),
                name: user.name.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(id)
    }

    async fn find_user(&mut self, id: UserId) -> StoreResult<Option<User>> {
        let t = self.tables("find_user")?;
        Ok(t.users.get(&id).map(|row| User {
            id,
            login: row.login.clone(),
            name: row.name.clone(),
            password_hash: row.password_hash.clone(),
        }))
    }

    async fn find_user_by_login(&mut self, login: &str) -> StoreResult<Option<User>> {
        let t = self.tables("find_user_by_login")?;
        Ok(t
            .users
            .iter()
            .find(|(_, row)| row.login == login)
            .map(|(&id, row)| User {
                id,
                login: row.login.clone(),
                name: row.name.clone(),
                password_hash: row.password_hash.clone(),
            }))
    }
}

// ============================================================================
// Cards
// ============================================================================

impl CardRepository for MemoryUnitOfWork {
    async fn insert_card(&mut self, module_id: ModuleId, card: &NewCard) -> StoreResult<CardId> {
        let t = self.tables("insert_card")?;
        if !t.modules.contains_key(&module_id) {
            return Err(foreign_key("cards", "module_id"));
        }
        let id = CardId::from_raw(next(&mut t.sequences.cards));
        t.cards.insert(
            id,
            CardRow {
                module_id,
                term: card.term.clone(),
                definition: card.definition.clone(),
            },
        );
        Ok(id)
    }

    async fn find_card(&mut self, id: CardId) -> StoreResult<Option<Card>> {
        let t = self.tables("find_card")?;
        Ok(t.cards.get(&id).map(|row| Card {
            id,
            module_id: row.module_id,
            term: row.term.clone(),
            definition: row.definition.clone(),
        }))
    }

    async fn cards_of_module(&mut self, module_id: ModuleId) -> StoreResult<Vec<Card>> {
        let t = self.tables("cards_of_module")?;
        Ok(t.cards
            .iter()
            .filter(|(_, row)| row.module_id == module_id)
            .map(|(&id, row)| Card {
                id,
                module_id,
                term: row.term.clone(),
                definition: row.definition.clone(),
            })
            .collect())
    }

    async fn update_card(&mut self, card: &Card) -> StoreResult<()> {
        let t = self.tables("update_card")?;
        let row = t.cards.get_mut(&card.id).ok_or(StoreError::NotFound("cards"))?;
        row.term = card.term.clone();
        row.definition = card.definition.clone();
        Ok(())
    }

    async fn delete_card(&mut self, id: CardId) -> StoreResult<()> {
        let t = self.tables("delete_card")?;
        if !t.cards.contains_key(&id) {
            return Err(StoreError::NotFound("cards"));
        }
        if t.card_results.keys().any(|(_, card_id)| *card_id == id) {
            return Err(referenced("cards", "cards_results"));
        }
        t.cards.remove(&id);
        Ok(())
    }
}

// ============================================================================
// Modules
// ============================================================================

impl ModuleRepository for MemoryUnitOfWork {
    async fn insert_module(
        &mut self,
        owner_id: UserId,
        name: &str,
        module_type: ModuleType,
    ) -> StoreResult<ModuleId> {
        let t = self.tables("insert_module")?;
        if !t.users.contains_key(&owner_id) {
            return Err(foreign_key("modules", "owner_id"));
        }
        let id = ModuleId::from_raw(next(&mut t.sequences.modules));
        t.modules.insert(
            id,
            ModuleRow {
                name: name.to_string(),
                owner_id,
                module_type,
            },
        );
        Ok(id)
    }

    async fn find_module(&mut self, id: ModuleId) -> StoreResult<Option<Module>> {
        let t = self.tables("find_module")?;
        Ok(t.modules.get(&id).map(|row| t.module(id, row)))
    }

    async fn modules_of_owner(&mut self, owner_id: UserId) -> StoreResult<Vec<Module>> {
        let t = self.tables("modules_of_owner")?;
        Ok(t.modules
            .iter()
            .filter(|(_, row)| row.owner_id == owner_id)
            .map(|(&id, row)| t.module(id, row))
            .collect())
    }

    async fn rename_module(&mut self, id: ModuleId, name: &str) -> StoreResult<()> {
        let t = self.tables("rename_module")?;
        let row = t.modules.get_mut(&id).ok_or(StoreError::NotFound("modules"))?;
        row.name = name.to_string();
        Ok(())
    }

    async fn set_module_type(&mut self, id: ModuleId, module_type: ModuleType) -> StoreResult<()> {
        let t = self.tables("set_module_type")?;
        let row = t.modules.get_mut(&id).ok_or(StoreError::NotFound("modules"))?;
        row.module_type = module_type;
        Ok(())
    }

    async fn delete_module(&mut self, id: ModuleId) -> StoreResult<()> {
        let t = self.tables("delete_module")?;
        if !t.modules.contains_key(&id) {
            return Err(StoreError::NotFound("modules"));
        }
        if t.module_dependents(id) > 0 {
            return Err(referenced("modules", "dependent rows"));
        }
        t.modules.remove(&id);
        Ok(())
    }
}

// ============================================================================
// Categories
// ============================================================================

impl CategoryRepository for MemoryUnitOfWork {
    async fn insert_category(&mut self, owner_id: UserId, name: &str) -> StoreResult<CategoryId> {
        let t = self.tables("insert_category")?;
        if !t.users.contains_key(&owner_id) {
            return Err(foreign_key("categories", "owner_id"));
        }
        let id = CategoryId::from_raw(next(&mut t.sequences.categories));
        t.categories.insert(
            id,
            CategoryRow {
                name: name.to_string(),
                owner_id,
                visibility: CategoryVisibility::Public,
                pinned_private: false,
            },
        );
        Ok(id)
    }

    async fn find_category(&mut self, id: CategoryId) -> StoreResult<Option<Category>> {
        let t = self.tables("find_category")?;
        Ok(t.categories.get(&id).map(|row| t.category(id, row)))
    }

    async fn categories_of_owner(&mut self, owner_id: UserId) -> StoreResult<Vec<Category>> {
        let t = self.tables("categories_of_owner")?;
        Ok(t.categories
            .iter()
            .filter(|(_, row)| row.owner_id == owner_id)
            .map(|(&id, row)| t.category(id, row))
            .collect())
    }

    async fn rename_category(&mut self, id: CategoryId, name: &str) -> StoreResult<()> {
        let t = self.tables("rename_category")?;
        let row = t
            .categories
            .get_mut(&id)
            .ok_or(StoreError::NotFound("categories"))?;
        row.name = name.to_string();
        Ok(())
    }

    async fn set_category_visibility(
        &mut self,
        id: CategoryId,
        visibility: CategoryVisibility,
    ) -> StoreResult<()> {
        let t = self.tables("set_category_visibility")?;
        let row = t
            .categories
            .get_mut(&id)
            .ok_or(StoreError::NotFound("categories"))?;
        row.visibility = visibility;
        Ok(())
    }

    async fn set_category_pinned(&mut self, id: CategoryId, pinned: bool) -> StoreResult<()> {
        let t = self.tables("set_category_pinned")?;
        let row = t
            .categories
            .get_mut(&id)
            .ok_or(StoreError::NotFound("categories"))?;
        row.pinned_private = pinned;
        Ok(())
    }

    async fn delete_category(&mut self, id: CategoryId) -> StoreResult<()> {
        let t = self.tables("delete_category")?;
        if !t.categories.contains_key(&id) {
            return Err(StoreError::NotFound("categories"));
        }
        if t.category_dependents(id) > 0 {
            return Err(referenced("categories", "dependent rows"));
        }
        t.categories.remove(&id);
        Ok(())
    }
}

impl CategoryModuleRepository for MemoryUnitOfWork {
    async fn insert_category_module(
        &mut self,
        category_id: CategoryId,
        module_id: ModuleId,
    ) -> StoreResult<()> {
        let t = self.tables("insert_category_module")?;
        if !t.categories.contains_key(&category_id) {
            return Err(foreign_key("category_modules", "category_id"));
        }
        if !t.modules.contains_key(&module_id) {
            return Err(foreign_key("category_modules", "module_id"));
        }
        if !t.category_modules.insert((category_id, module_id)) {
            return Err(unique("category_modules_pkey"));
        }
        Ok(())
    }

    async fn delete_category_module(
        &mut self,
        category_id: CategoryId,
        module_id: ModuleId,
    ) -> StoreResult<()> {
        let t = self.tables("delete_category_module")?;
        if !t.category_modules.remove(&(category_id, module_id)) {
            return Err(StoreError::NotFound("category_modules"));
        }
        Ok(())
    }

    async fn delete_category_modules(&mut self, category_id: CategoryId) -> StoreResult<u64> {
        let t = self.tables("delete_category_modules")?;
        let before = t.category_modules.len();
        t.category_modules.retain(|(c, _)| *c != category_id);
        Ok((before - t.category_modules.len()) as u64)
    }

    async fn module_ids_of_category(
        &mut self,
        category_id: CategoryId,
    ) -> StoreResult<Vec<ModuleId>> {
        let t = self.tables("module_ids_of_category")?;
        Ok(t.category_modules
            .iter()
            .filter(|(c, _)| *c == category_id)
            .map(|&(_, m)| m)
            .collect())
    }

    async fn category_ids_of_module(
        &mut self,
        module_id: ModuleId,
    ) -> StoreResult<Vec<CategoryId>> {
        let t = self.tables("category_ids_of_module")?;
        Ok(t.category_modules
            .iter()
            .filter(|(_, m)| *m == module_id)
            .map(|&(c, _)| c)
            .collect())
    }
}

// ============================================================================
// Results
// ============================================================================

impl ResultRepository for MemoryUnitOfWork {
    async fn insert_result(&mut self, kind: &str) -> StoreResult<ResultId> {
        let t = self.tables("insert_result")?;
        let id = ResultId::from_raw(next(&mut t.sequences.results));
        t.results.insert(id, kind.to_string());
        Ok(id)
    }

    async fn delete_result(&mut self, id: ResultId) -> StoreResult<()> {
        let t = self.tables("delete_result")?;
        if !t.results.contains_key(&id) {
            return Err(StoreError::NotFound("results"));
        }
        if t.card_results.keys().any(|(r, _)| *r == id) {
            return Err(referenced("results", "cards_results"));
        }
        if t.module_results.contains_key(&id) {
            return Err(referenced("results", "modules_res"));
        }
        if t.category_results.contains_key(&id) {
            return Err(referenced("results", "category_res"));
        }
        t.results.remove(&id);
        Ok(())
    }
}

impl CardResultRepository for MemoryUnitOfWork {
    async fn insert_card_result(
        &mut self,
        result_id: ResultId,
        card_result: &CardResult,
    ) -> StoreResult<()> {
        let t = self.tables("insert_card_result")?;
        if !t.results.contains_key(&result_id) {
            return Err(foreign_key("cards_results", "result_id"));
        }
        if !t.cards.contains_key(&card_result.card_id) {
            return Err(foreign_key("cards_results", "card_id"));
        }
        let key = (result_id, card_result.card_id);
        if t.card_results.contains_key(&key) {
            return Err(unique("cards_results_pkey"));
        }
        t.card_results.insert(key, card_result.result.clone());
        Ok(())
    }

    async fn card_results_of(&mut self, result_id: ResultId) -> StoreResult<Vec<CardResult>> {
        let t = self.tables("card_results_of")?;
        Ok(t.card_results
            .iter()
            .filter(|((r, _), _)| *r == result_id)
            .map(|(&(_, card_id), result)| CardResult {
                card_id,
                result: result.clone(),
            })
            .collect())
    }

    async fn delete_card_results_of_result(&mut self, result_id: ResultId) -> StoreResult<u64> {
        let t = self.tables("delete_card_results_of_result")?;
        let before = t.card_results.len();
        t.card_results.retain(|(r, _), _| *r != result_id);
        Ok((before - t.card_results.len()) as u64)
    }

    async fn delete_card_results_of_card(&mut self, card_id: CardId) -> StoreResult<u64> {
        let t = self.tables("delete_card_results_of_card")?;
        let before = t.card_results.len();
        t.card_results.retain(|(_, c), _| *c != card_id);
        Ok((before - t.card_results.len()) as u64)
    }
}

impl ModuleResultRepository for MemoryUnitOfWork {
    async fn insert_module_result(
        &mut self,
        result_id: ResultId,
        module_id: ModuleId,
        owner_id: UserId,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        let t = self.tables("insert_module_result")?;
        if !t.results.contains_key(&result_id) {
            return Err(foreign_key("modules_res", "result_id"));
        }
        if !t.modules.contains_key(&module_id) {
            return Err(foreign_key("modules_res", "module_id"));
        }
        if !t.users.contains_key(&owner_id) {
            return Err(foreign_key("modules_res", "owner_id"));
        }
        if t.module_results.contains_key(&result_id) {
            return Err(unique("modules_res_pkey"));
        }
        t.module_results.insert(
            result_id,
            ModuleResultRow {
                module_id,
                owner_id,
                time,
            },
        );
        Ok(())
    }

    async fn find_module_result(
        &mut self,
        result_id: ResultId,
    ) -> StoreResult<Option<ModuleResult>> {
        let t = self.tables("find_module_result")?;
        Ok(t.module_results
            .get(&result_id)
            .map(|row| t.module_result(result_id, row)))
    }

    async fn module_results_of_owner(
        &mut self,
        owner_id: UserId,
    ) -> StoreResult<Vec<ModuleResult>> {
        let t = self.tables("module_results_of_owner")?;
        Ok(t.module_results
            .iter()
            .filter(|(_, row)| row.owner_id == owner_id)
            .map(|(&id, row)| t.module_result(id, row))
            .collect())
    }

    async fn module_results_of_module_owner(
        &mut self,
        module_id: ModuleId,
        owner_id: UserId,
    ) -> StoreResult<Vec<ModuleResult>> {
        let t = self.tables("module_results_of_module_owner")?;
        Ok(t.module_results
            .iter()
            .filter(|(_, row)| row.module_id == module_id && row.owner_id == owner_id)
            .map(|(&id, row)| t.module_result(id, row))
            .collect())
    }

    async fn module_result_ids_of_module(
        &mut self,
        module_id: ModuleId,
    ) -> StoreResult<Vec<ResultId>> {
        let t = self.tables("module_result_ids_of_module")?;
        Ok(t.module_results
            .iter()
            .filter(|(_, row)| row.module_id == module_id)
            .map(|(&id, _)| id)
            .collect())
    }

    async fn delete_module_result(&mut self, result_id: ResultId) -> StoreResult<()> {
        let t = self.tables("delete_module_result")?;
        t.module_results
            .remove(&result_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("modules_res"))
    }
}

impl CategoryResultRepository for MemoryUnitOfWork {
    async fn next_category_result_id(&mut self) -> StoreResult<CategoryResultId> {
        let t = self.tables("next_category_result_id")?;
        Ok(CategoryResultId::from_raw(next(
            &mut t.sequences.category_results,
        )))
    }

    async fn insert_category_result_row(
        &mut self,
        group_id: CategoryResultId,
        category_id: CategoryId,
        module_id: ModuleId,
        result_id: ResultId,
        owner_id: UserId,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        let t = self.tables("insert_category_result_row")?;
        if !t.categories.contains_key(&category_id) {
            return Err(foreign_key("category_res", "category_id"));
        }
        if !t.modules.contains_key(&module_id) {
            return Err(foreign_key("category_res", "module_id"));
        }
        if !t.results.contains_key(&result_id) {
            return Err(foreign_key("category_res", "result_id"));
        }
        if !t.users.contains_key(&owner_id) {
            return Err(foreign_key("category_res", "owner_id"));
        }
        if t.category_results.contains_key(&result_id) {
            return Err(unique("category_res_result_id_key"));
        }
        t.category_results.insert(
            result_id,
            CategoryResultLink {
                group_id,
                category_id,
                module_id,
                owner_id,
                time,
            },
        );
        Ok(())
    }

    async fn category_result_rows_of_group(
        &mut self,
        group_id: CategoryResultId,
    ) -> StoreResult<Vec<CategoryResultRow>> {
        let t = self.tables("category_result_rows_of_group")?;
        Ok(t.category_rows(|link| link.group_id == group_id))
    }

    async fn category_result_rows_of_owner(
        &mut self,
        owner_id: UserId,
    ) -> StoreResult<Vec<CategoryResultRow>> {
        let t = self.tables("category_result_rows_of_owner")?;
        Ok(t.category_rows(|link| link.owner_id == owner_id))
    }

    async fn category_result_rows_of_category_owner(
        &mut self,
        category_id: CategoryId,
        owner_id: UserId,
    ) -> StoreResult<Vec<CategoryResultRow>> {
        let t = self.tables("category_result_rows_of_category_owner")?;
        Ok(t.category_rows(|link| link.category_id == category_id && link.owner_id == owner_id))
    }

    async fn category_result_rows_of_category(
        &mut self,
        category_id: CategoryId,
    ) -> StoreResult<Vec<CategoryResultRow>> {
        let t = self.tables("category_result_rows_of_category")?;
        Ok(t.category_rows(|link| link.category_id == category_id))
    }

    async fn category_result_rows_of_module(
        &mut self,
        module_id: ModuleId,
    ) -> StoreResult<Vec<CategoryResultRow>> {
        let t = self.tables("category_result_rows_of_module")?;
        Ok(t.category_rows(|link| link.module_id == module_id))
    }

    async fn delete_category_result_row(&mut self, result_id: ResultId) -> StoreResult<()> {
        let t = self.tables("delete_category_result_row")?;
        t.category_results
            .remove(&result_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("category_res"))
    }
}

// ============================================================================
// Selections
// ============================================================================

impl SelectionRepository for MemoryUnitOfWork {
    async fn insert_selected_module(
        &mut self,
        user_id: UserId,
        module_id: ModuleId,
    ) -> StoreResult<()> {
        let t = self.tables("insert_selected_module")?;
        if !t.users.contains_key(&user_id) {
            return Err(foreign_key("selected_modules", "user_id"));
        }
        if !t.modules.contains_key(&module_id) {
            return Err(foreign_key("selected_modules", "module_id"));
        }
        if !t.selected_modules.insert((user_id, module_id)) {
            return Err(unique("selected_modules_pkey"));
        }
        Ok(())
    }

    async fn delete_selected_module(
        &mut self,
        user_id: UserId,
        module_id: ModuleId,
    ) -> StoreResult<()> {
        let t = self.tables("delete_selected_module")?;
        if !t.selected_modules.remove(&(user_id, module_id)) {
            return Err(StoreError::NotFound("selected_modules"));
        }
        Ok(())
    }

    async fn selected_modules_of_user(&mut self, user_id: UserId) -> StoreResult<Vec<Module>> {
        let t = self.tables("selected_modules_of_user")?;
        Ok(t.selected_modules
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, m)| t.modules.get(m).map(|row| t.module(*m, row)))
            .collect())
    }

    async fn module_selection_count(&mut self, module_id: ModuleId) -> StoreResult<u64> {
        let t = self.tables("module_selection_count")?;
        Ok(t.selected_modules
            .iter()
            .filter(|(_, m)| *m == module_id)
            .count() as u64)
    }

    async fn delete_module_selections(&mut self, module_id: ModuleId) -> StoreResult<u64> {
        let t = self.tables("delete_module_selections")?;
        let before = t.selected_modules.len();
        t.selected_modules.retain(|(_, m)| *m != module_id);
        Ok((before - t.selected_modules.len()) as u64)
    }

    async fn insert_selected_category(
        &mut self,
        user_id: UserId,
        category_id: CategoryId,
    ) -> StoreResult<()> {
        let t = self.tables("insert_selected_category")?;
        if !t.users.contains_key(&user_id) {
            return Err(foreign_key("selected_categories", "user_id"));
        }
        if !t.categories.contains_key(&category_id) {
            return Err(foreign_key("selected_categories", "category_id"));
        }
        if !t.selected_categories.insert((user_id, category_id)) {
            return Err(unique("selected_categories_pkey"));
        }
        Ok(())
    }

    async fn delete_selected_category(
        &mut self,
        user_id: UserId,
        category_id: CategoryId,
    ) -> StoreResult<()> {
        let t = self.tables("delete_selected_category")?;
        if !t.selected_categories.remove(&(user_id, category_id)) {
            return Err(StoreError::NotFound("selected_categories"));
        }
        Ok(())
    }

    async fn selected_categories_of_user(
        &mut self,
        user_id: UserId,
    ) -> StoreResult<Vec<Category>> {
        let t = self.tables("selected_categories_of_user")?;
        Ok(t.selected_categories
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, c)| t.categories.get(c).map(|row| t.category(*c, row)))
            .collect())
    }

    async fn category_selection_count(&mut self, category_id: CategoryId) -> StoreResult<u64> {
        let t = self.tables("category_selection_count")?;
        Ok(t.selected_categories
            .iter()
            .filter(|(_, c)| *c == category_id)
            .count() as u64)
    }

    async fn delete_category_selections(&mut self, category_id: CategoryId) -> StoreResult<u64> {
        let t = self.tables("delete_category_selections")?;
        let before = t.selected_categories.len();
        t.selected_categories.retain(|(_, c)| *c != category_id);
        Ok((before - t.selected_categories.len()) as u64)
    }
}
